// Image store client: unsigned preset uploads, data-URI in, public URL out.
use async_trait::async_trait;
use serde::Deserialize;

use super::GatewayError;
use crate::config;

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Upload one image (as a `data:` URI) and return its public URL.
    async fn upload(&self, data_uri: &str) -> Result<String, GatewayError>;
}

pub struct CloudinaryClient {
    http: reqwest::Client,
    api_base: String,
    cloud_name: String,
    upload_preset: String,
}

impl CloudinaryClient {
    pub fn new(
        api_base: impl Into<String>,
        cloud_name: impl Into<String>,
        upload_preset: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            cloud_name: cloud_name.into(),
            upload_preset: upload_preset.into(),
        }
    }

    pub fn from_config() -> Self {
        let cfg = &config::config().cloudinary;
        Self::new(
            cfg.api_base.clone(),
            cfg.cloud_name.clone(),
            cfg.upload_preset.clone(),
        )
    }
}

#[async_trait]
impl ImageStore for CloudinaryClient {
    async fn upload(&self, data_uri: &str) -> Result<String, GatewayError> {
        let url = format!("{}/v1_1/{}/image/upload", self.api_base, self.cloud_name);
        let form = [
            ("file", data_uri),
            ("upload_preset", self.upload_preset.as_str()),
        ];

        let response = self.http.post(&url).form(&form).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("Image upload failed")
                .to_string();
            tracing::warn!(%status, "image store rejected upload: {}", message);
            return Err(GatewayError::Api(message));
        }

        #[derive(Deserialize)]
        struct UploadResponse {
            secure_url: String,
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        Ok(uploaded.secure_url)
    }
}
