use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{db::{Database, QUIZZES_COLLECTION}, errors::AppResult, models::domain::Quiz};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz>;
    async fn find_by_material(&self, material_id: &str) -> AppResult<Vec<Quiz>>;
    /// Removes every quiz generated for `material_id`, returning how many went.
    async fn delete_by_material(&self, material_id: &str) -> AppResult<u64>;
}

pub struct MongoQuizRepository {
    collection: Collection<Quiz>,
}

impl MongoQuizRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(QUIZZES_COLLECTION);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quizzes collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let material_index = IndexModel::builder()
            .keys(doc! { "material_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("material_id".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(material_index).await?;

        log::info!("Successfully created indexes for quizzes collection");
        Ok(())
    }
}

#[async_trait]
impl QuizRepository for MongoQuizRepository {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz> {
        self.collection.insert_one(&quiz).await?;
        Ok(quiz)
    }

    async fn find_by_material(&self, material_id: &str) -> AppResult<Vec<Quiz>> {
        let cursor = self
            .collection
            .find(doc! { "material_id": material_id })
            .await?;
        let items: Vec<Quiz> = cursor.try_collect().await?;
        Ok(items)
    }

    async fn delete_by_material(&self, material_id: &str) -> AppResult<u64> {
        let result = self
            .collection
            .delete_many(doc! { "material_id": material_id })
            .await?;
        Ok(result.deleted_count)
    }
}
