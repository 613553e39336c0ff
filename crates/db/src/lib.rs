//! SurrealDB client factory for bookshelf.
//!
//! The connection string picks the engine: `mem://` runs an embedded
//! in-memory datastore, `ws://host:port` and `http://host:port` reach a
//! SurrealDB server shared by every instance of the service.

mod error;

use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;

pub use error::{StoreError, StoreResult};

/// Where and as whom to connect
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            url: "mem://".to_string(),
            namespace: "bookshelf".to_string(),
            database: "bookshelf".to_string(),
            username: None,
            password: None,
        }
    }
}

/// Shared handle to a SurrealDB namespace/database. Cloning is cheap.
#[derive(Clone)]
pub struct Database {
    client: Surreal<Any>,
    location: String,
}

impl Database {
    /// Open a connection and select the configured namespace and database
    pub async fn connect(options: &ConnectOptions) -> StoreResult<Self> {
        let client = any::connect(options.url.as_str()).await?;

        if let (Some(username), Some(password)) = (&options.username, &options.password) {
            client
                .signin(Root {
                    username: username.as_str(),
                    password: password.as_str(),
                })
                .await?;
        }

        client
            .use_ns(options.namespace.as_str())
            .use_db(options.database.as_str())
            .await?;

        let location = format!(
            "{} ({}/{})",
            options.url, options.namespace, options.database
        );
        tracing::info!(target: "bookshelf-db", database = %location, "database connected");

        Ok(Self { client, location })
    }

    /// Fresh embedded in-memory database
    pub async fn memory() -> StoreResult<Self> {
        Self::connect(&ConnectOptions::default()).await
    }

    pub fn client(&self) -> &Surreal<Any> {
        &self.client
    }

    /// Human readable connection target, for logs
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Declare a `UNIQUE` index on `table.field`. Safe to repeat.
    pub async fn ensure_unique_index(&self, table: &str, field: &str) -> StoreResult<()> {
        for name in [table, field] {
            if !is_identifier(name) {
                return Err(StoreError::InvalidIdentifier(name.to_string()));
            }
        }

        let index = unique_index_name(table, field);
        self.client
            .query(format!(
                "DEFINE INDEX IF NOT EXISTS {index} ON TABLE {table} FIELDS {field} UNIQUE"
            ))
            .await?
            .check()?;

        tracing::debug!(target: "bookshelf-db", %index, "unique index ensured");
        Ok(())
    }
}

/// Name given to the unique index on `table.field`
pub fn unique_index_name(table: &str, field: &str) -> String {
    format!("{table}_{field}_unique")
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Thing {
        name: String,
    }

    async fn create(db: &Database, name: &str) -> StoreResult<()> {
        db.client()
            .query("CREATE things SET name = $name")
            .bind(("name", name.to_string()))
            .await?
            .check()?;
        Ok(())
    }

    #[tokio::test]
    async fn unique_index_rejects_second_write() {
        let db = Database::memory().await.unwrap();
        db.ensure_unique_index("things", "name").await.unwrap();
        // re-declaring is harmless
        db.ensure_unique_index("things", "name").await.unwrap();

        create(&db, "a").await.unwrap();
        let err = create(&db, "a").await.unwrap_err();
        assert!(err.is_duplicate_key_on("things", "name"), "{err}");

        create(&db, "b").await.unwrap();
    }

    #[tokio::test]
    async fn clones_share_one_datastore() {
        let db = Database::memory().await.unwrap();
        db.ensure_unique_index("things", "name").await.unwrap();
        let other = db.clone();

        create(&db, "a").await.unwrap();
        let err = create(&other, "a").await.unwrap_err();
        assert!(err.is_duplicate_key_on("things", "name"));

        let mut response = other.client().query("SELECT name FROM things").await.unwrap();
        let things: Vec<Thing> = response.take(0).unwrap();
        assert_eq!(things.len(), 1);
        assert_eq!(things[0].name, "a");
    }

    #[tokio::test]
    async fn separate_memory_databases_are_isolated() {
        let a = Database::memory().await.unwrap();
        let b = Database::memory().await.unwrap();
        a.ensure_unique_index("things", "name").await.unwrap();
        b.ensure_unique_index("things", "name").await.unwrap();

        create(&a, "a").await.unwrap();
        create(&b, "a").await.unwrap();
    }

    #[tokio::test]
    async fn index_names_must_be_identifiers() {
        let db = Database::memory().await.unwrap();
        assert!(matches!(
            db.ensure_unique_index("things; REMOVE TABLE things", "name").await,
            Err(StoreError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn default_options_are_in_memory() {
        let options = ConnectOptions::default();
        assert_eq!(options.url, "mem://");
        assert_eq!(options.namespace, "bookshelf");
    }
}
