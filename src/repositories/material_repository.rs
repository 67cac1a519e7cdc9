use async_trait::async_trait;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{db::{Database, MATERIALS_COLLECTION}, errors::AppResult, models::domain::Material};

/// Read access to uploaded materials. Uploads themselves are handled by a
/// separate service that writes this collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MaterialRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Material>>;
}

pub struct MongoMaterialRepository {
    collection: Collection<Material>,
}

impl MongoMaterialRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(MATERIALS_COLLECTION);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for materials collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;

        log::info!("Successfully created indexes for materials collection");
        Ok(())
    }
}

#[async_trait]
impl MaterialRepository for MongoMaterialRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Material>> {
        let material = self.collection.find_one(doc! { "id": id }).await?;
        Ok(material)
    }
}
