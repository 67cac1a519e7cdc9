use std::time::Duration;

use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection,
};

use crate::{config::Config, errors::AppResult};

pub const QUIZZES_COLLECTION: &str = "quizzes";
pub const MATERIALS_COLLECTION: &str = "materials";

const APP_NAME: &str = "quizforge-server";
const POOL_SIZE: (u32, u32) = (2, 10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared MongoDB handle. Cloning is cheap; the driver pools connections.
#[derive(Clone)]
pub struct Database {
    client: Client,
    name: String,
}

impl Database {
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let mut options = ClientOptions::parse(&config.mongo_conn_string).await?;
        options.app_name = Some(APP_NAME.to_string());
        options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
        options.min_pool_size = Some(POOL_SIZE.0);
        options.max_pool_size = Some(POOL_SIZE.1);
        options.connect_timeout = Some(CONNECT_TIMEOUT);
        options.server_selection_timeout = Some(CONNECT_TIMEOUT);

        let db = Self {
            client: Client::with_options(options)?,
            name: config.mongo_db_name.clone(),
        };
        db.ping().await?;

        log::info!("Connected to MongoDB database {}", db.name);
        Ok(db)
    }

    pub fn get_collection<T>(&self, collection_name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.client.database(&self.name).collection(collection_name)
    }

    /// Readiness probe used by `/health/ready`.
    pub async fn health_check(&self) -> AppResult<()> {
        self.ping().await
    }

    async fn ping(&self) -> AppResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_is_shareable() {
        fn assert_send_sync_clone<T: Send + Sync + Clone>() {}
        assert_send_sync_clone::<Database>();
    }

    #[test]
    fn test_collection_names_are_distinct() {
        assert_ne!(QUIZZES_COLLECTION, MATERIALS_COLLECTION);
    }
}
