use crate::core::{PictureStore, Result};
use crate::utils::error::DirectoryError;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Keeps profile pictures as files under `base_path/folder/user_id`.
#[derive(Debug, Clone)]
pub struct LocalPictureStore {
    base_path: PathBuf,
    folder: String,
}

impl LocalPictureStore {
    pub fn new(base_path: impl Into<PathBuf>, folder: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            folder: folder.into(),
        }
    }

    /// The id must name a single file inside the picture folder.
    fn picture_path(&self, user_id: &str) -> Result<PathBuf> {
        let mut components = Path::new(user_id).components();
        let single_file = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_file || user_id.contains(['/', '\\']) {
            return Err(DirectoryError::validation(
                "user_id",
                format!("'{}' cannot be used as a picture file name", user_id),
            ));
        }
        Ok(self.base_path.join(&self.folder).join(user_id))
    }

    fn reference(path: &Path) -> Result<String> {
        let absolute = std::path::absolute(path)?;
        Url::from_file_path(&absolute).map(String::from).map_err(|_| {
            DirectoryError::picture_upload(format!("cannot reference {}", absolute.display()))
        })
    }
}

#[async_trait]
impl PictureStore for LocalPictureStore {
    async fn upload(&self, user_id: &str, bytes: &[u8]) -> Result<String> {
        let full_path = self.picture_path(user_id)?;

        let write = async {
            if let Some(parent) = full_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&full_path, bytes).await
        };
        write.await.map_err(DirectoryError::picture_upload)?;

        tracing::debug!("Stored picture for {} at {}", user_id, full_path.display());
        Self::reference(&full_path)
    }

    async fn resolve(&self, user_id: &str) -> Result<Option<String>> {
        let full_path = self.picture_path(user_id)?;
        if !tokio::fs::try_exists(&full_path).await? {
            return Ok(None);
        }
        Self::reference(&full_path).map(Some)
    }
}
