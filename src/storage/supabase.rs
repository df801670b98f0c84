//! Object storage backend speaking the Supabase Storage REST API.

use super::{ImageFile, ObjectStorage};
use crate::{
    errors::{Error, Result},
    remote::{error_message, with_api_key},
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{error, instrument};

/// One bucket on a Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    bucket: String,
    api_key: String,
    auth_key: String,
}

impl SupabaseStorage {
    /// Creates a client for `bucket`.
    ///
    /// `api_key` is the project's public key; `auth_key` authorizes writes and may
    /// be the same key or a privileged one.
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        api_key: impl Into<String>,
        auth_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            bucket: bucket.into(),
            api_key: api_key.into(),
            auth_key: auth_key.into(),
        }
    }

    fn object_endpoint(&self) -> String {
        format!("{}/storage/v1/object/{}", self.base_url, self.bucket)
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    #[instrument(skip(self, file))]
    async fn put_object(&self, path: &str, file: &ImageFile) -> Result<String> {
        let request = self
            .client
            .post(format!("{}/{path}", self.object_endpoint()))
            .header(reqwest::header::CONTENT_TYPE, &file.content_type)
            .header(reqwest::header::CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "false")
            .body(file.bytes.clone());

        let response = with_api_key(request, &self.api_key, &self.auth_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let message = error_message(response).await;
            error!("Image upload failed: {message}");
            return Err(Error::Storage {
                message: format!("Error al subir imagen: {message}"),
            });
        }

        Ok(path.to_string())
    }

    #[instrument(skip(self))]
    async fn remove_objects(&self, paths: &[String]) -> Result<()> {
        let request = self
            .client
            .delete(self.object_endpoint())
            .json(&json!({ "prefixes": paths }));

        let response = with_api_key(request, &self.api_key, &self.auth_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let message = error_message(response).await;
            return Err(Error::Storage {
                message: format!("Error al eliminar imagen: {message}"),
            });
        }

        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{path}",
            self.base_url, self.bucket
        )
    }
}
