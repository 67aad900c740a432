use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, instrument};

use domain::image::ImageId;
use toon_application::error::{AppError, AppResult};
use toon_application::ports::outgoing::image_source::ImageSourcePort;

/// Extensions tried, in order, for `<source_dir>/<image_id>.<ext>`.
const SOURCE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "gif"];

#[derive(Debug, Clone)]
pub struct FsImageSourceConfig {
    pub root: PathBuf,
    pub max_bytes: usize,
}

/// Loads source images from a directory. `ImageId` cannot contain path
/// separators, so lookups never leave `root`.
pub struct FsImageSourceAdapter {
    config: FsImageSourceConfig,
}

impl FsImageSourceAdapter {
    pub fn new(config: FsImageSourceConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl ImageSourcePort for FsImageSourceAdapter {
    #[instrument(skip(self), fields(image_id = %image_id))]
    async fn load(&self, image_id: &ImageId) -> AppResult<Option<Vec<u8>>> {
        for extension in SOURCE_EXTENSIONS {
            let path = self
                .config
                .root
                .join(format!("{}.{}", image_id.as_str(), extension));

            let metadata = match fs::metadata(&path).await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(AppError::IoError(e)),
            };

            if metadata.len() > self.config.max_bytes as u64 {
                return Err(AppError::ValidationError {
                    message: format!(
                        "Source image '{}' is {} bytes, limit is {}",
                        image_id,
                        metadata.len(),
                        self.config.max_bytes
                    ),
                });
            }

            let bytes = fs::read(&path).await?;
            debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
            return Ok(Some(bytes));
        }

        Ok(None)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::env;
    use uuid::Uuid;

    async fn scratch_dir() -> PathBuf {
        let dir = env::temp_dir().join(format!("toon-source-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).await.unwrap();
        dir
    }

    fn adapter(root: PathBuf, max_bytes: usize) -> FsImageSourceAdapter {
        FsImageSourceAdapter::new(FsImageSourceConfig { root, max_bytes })
    }

    #[tokio::test]
    async fn finds_source_by_extension() {
        let dir = scratch_dir().await;
        fs::write(dir.join("page-1.webp"), b"webp bytes").await.unwrap();

        let loaded = adapter(dir.clone(), 1024)
            .load(&ImageId::new("page-1").unwrap())
            .await
            .unwrap();

        assert_eq!(loaded.as_deref(), Some(&b"webp bytes"[..]));
        fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn missing_source_is_none() {
        let dir = scratch_dir().await;

        let loaded = adapter(dir.clone(), 1024)
            .load(&ImageId::new("absent").unwrap())
            .await
            .unwrap();

        assert!(loaded.is_none());
        fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn avif_sources_are_ignored() {
        let dir = scratch_dir().await;
        fs::write(dir.join("cover.avif"), b"avif bytes").await.unwrap();

        let loaded = adapter(dir.clone(), 1024)
            .load(&ImageId::new("cover").unwrap())
            .await
            .unwrap();

        assert!(loaded.is_none());
        fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn oversized_source_is_rejected() {
        let dir = scratch_dir().await;
        fs::write(dir.join("big.png"), vec![0_u8; 64]).await.unwrap();

        let result = adapter(dir.clone(), 16)
            .load(&ImageId::new("big").unwrap())
            .await;

        assert!(matches!(result, Err(AppError::ValidationError { .. })));
        fs::remove_dir_all(dir).await.unwrap();
    }
}
