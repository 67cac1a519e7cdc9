use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    errors::{AppError, AppResult},
    repositories::MaterialRepository,
};

pub struct MaterialService {
    repository: Arc<dyn MaterialRepository>,
    upload_dir: PathBuf,
}

impl MaterialService {
    pub fn new(repository: Arc<dyn MaterialRepository>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            repository,
            upload_dir: upload_dir.into(),
        }
    }

    /// Resolves a material to its file under the upload directory. Only the
    /// file name of the stored path is used.
    pub async fn resolve_path(&self, material_id: &str) -> AppResult<PathBuf> {
        log::info!("Looking up material {}", material_id);

        let material = self.repository.find_by_id(material_id).await?.ok_or_else(|| {
            AppError::NotFound(format!(
                "Material file not found for material '{}'.",
                material_id
            ))
        })?;

        let file_name = Path::new(&material.path).file_name().ok_or_else(|| {
            AppError::NotFound(format!("Material file not found at {}.", material.path))
        })?;
        let path = self.upload_dir.join(file_name);

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(AppError::NotFound(format!(
                "Material file not found at {}.",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::Material;
    use crate::repositories::material_repository::MockMaterialRepository;
    use crate::test_utils::fixtures::test_material;

    fn service_with(material: Option<Material>, upload_dir: &Path) -> MaterialService {
        let mut repository = MockMaterialRepository::new();
        repository
            .expect_find_by_id()
            .returning(move |_| Ok(material.clone()));
        MaterialService::new(Arc::new(repository), upload_dir)
    }

    #[tokio::test]
    async fn resolves_basename_under_upload_dir() {
        let dir = std::env::temp_dir().join(format!("quizforge-mat-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.expect("temp dir");
        tokio::fs::write(dir.join("lecture1.txt"), "content")
            .await
            .expect("temp file");

        let service = service_with(
            Some(Material::new("mat-1", "/var/old/uploads/lecture1.txt")),
            &dir,
        );
        let path = service.resolve_path("mat-1").await.expect("resolved");

        assert_eq!(path, dir.join("lecture1.txt"));
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn unknown_material_is_not_found() {
        let service = service_with(None, Path::new("uploads"));
        let err = service.resolve_path("missing").await.expect_err("not found");

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_file_is_not_found_with_path() {
        let service = service_with(
            Some(test_material("gone")),
            Path::new("/nonexistent-upload-dir"),
        );
        let err = service.resolve_path("mat-1").await.expect_err("not found");

        match err {
            AppError::NotFound(message) => {
                assert!(message.starts_with("Material file not found at"));
                assert!(message.contains("gone.pdf"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
