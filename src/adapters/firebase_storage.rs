//! Firebase Storage REST (v0) picture store.

use crate::config::toml_config::StorageConfig;
use crate::core::{PictureStore, Result};
use crate::utils::error::DirectoryError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use url::Url;

pub struct FirebasePictureStore {
    client: Client,
    config: StorageConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    name: String,
    download_tokens: Option<String>,
}

impl FirebasePictureStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn object_name(&self, user_id: &str) -> String {
        format!("{}/{}", self.config.folder(), user_id)
    }

    fn bucket_url(&self) -> Result<Url> {
        let raw = format!(
            "{}/v0/b/{}/o",
            self.config.base_url().trim_end_matches('/'),
            self.config.bucket
        );
        Url::parse(&raw).map_err(|e| DirectoryError::ConfigError {
            message: format!("invalid storage URL {}: {}", raw, e),
        })
    }

    /// `.../o/{name}` with the slash in the object name percent-encoded.
    fn object_url(&self, name: &str) -> Result<Url> {
        let mut url = self.bucket_url()?;
        url.path_segments_mut()
            .map_err(|_| DirectoryError::ConfigError {
                message: "storage base URL cannot have path segments".to_string(),
            })?
            .push(name);
        Ok(url)
    }

    fn download_url(&self, metadata: &ObjectMetadata) -> Result<String> {
        let mut url = self.object_url(&metadata.name)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("alt", "media");
            // Several tokens may be issued; any one grants read access.
            if let Some(token) = metadata
                .download_tokens
                .as_deref()
                .and_then(|tokens| tokens.split(',').next())
                .filter(|t| !t.is_empty())
            {
                query.append_pair("token", token);
            }
        }
        Ok(url.into())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) if !token.is_empty() => request.bearer_auth(token),
            _ => request,
        }
    }
}

fn content_type(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl PictureStore for FirebasePictureStore {
    async fn upload(&self, user_id: &str, bytes: &[u8]) -> Result<String> {
        let mut url = self.bucket_url()?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", &self.object_name(user_id));

        tracing::debug!("Uploading {} bytes to {}", bytes.len(), url);
        let request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type(bytes))
            .body(bytes.to_vec());

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(DirectoryError::picture_upload)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DirectoryError::picture_upload(format!(
                "storage returned {}: {}",
                status, body
            )));
        }

        let metadata: ObjectMetadata = response
            .json()
            .await
            .map_err(DirectoryError::picture_upload)?;
        self.download_url(&metadata)
    }

    async fn resolve(&self, user_id: &str) -> Result<Option<String>> {
        let url = self.object_url(&self.object_name(user_id))?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(DirectoryError::retrieval)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let metadata: ObjectMetadata =
                    response.json().await.map_err(DirectoryError::retrieval)?;
                self.download_url(&metadata).map(Some)
            }
            status => Err(DirectoryError::retrieval(format!(
                "storage returned {} for {}",
                status, user_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn store(server: &MockServer) -> FirebasePictureStore {
        FirebasePictureStore::new(StorageConfig {
            bucket: "herosblood.appspot.com".to_string(),
            folder: None,
            base_url: Some(server.base_url()),
            auth_token: None,
        })
    }

    #[tokio::test]
    async fn test_upload_returns_tokenized_download_url() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v0/b/herosblood.appspot.com/o")
                .query_param("uploadType", "media")
                .header("content-type", "image/jpeg");
            then.status(200).json_body(json!({
                "name": "ProfilePicture/u1",
                "bucket": "herosblood.appspot.com",
                "downloadTokens": "tok-1,tok-2"
            }));
        });

        let url = store(&server)
            .upload("u1", &[0xFF, 0xD8, 0xFF, 0xE0])
            .await
            .unwrap();

        mock.assert();
        assert!(url.starts_with(&server.base_url()));
        assert!(url.contains("/o/ProfilePicture%2Fu1?"));
        assert!(url.ends_with("alt=media&token=tok-1"));
    }

    #[tokio::test]
    async fn test_upload_rejection_is_picture_upload_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v0/b/herosblood.appspot.com/o");
            then.status(403)
                .json_body(json!({"error": {"code": 403, "message": "Permission denied."}}));
        });

        let err = store(&server).upload("u1", b"bytes").await.unwrap_err();
        assert!(matches!(err, DirectoryError::PictureUploadError { .. }));
    }

    #[tokio::test]
    async fn test_resolve_missing_object_is_none() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET);
            then.status(404);
        });

        assert_eq!(store(&server).resolve("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resolve_existing_object() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET);
            then.status(200).json_body(json!({
                "name": "ProfilePicture/u7",
                "downloadTokens": "abc"
            }));
        });

        let url = store(&server).resolve("u7").await.unwrap().unwrap();
        assert!(url.ends_with("/o/ProfilePicture%2Fu7?alt=media&token=abc"));
    }

    #[test]
    fn test_content_type_sniffing() {
        assert_eq!(content_type(&[0x89, b'P', b'N', b'G', 0x0D]), "image/png");
        assert_eq!(content_type(b"plain"), "application/octet-stream");
    }
}
