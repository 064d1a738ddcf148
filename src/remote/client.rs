// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

use crate::gallery::{BatchDeleteResult, BatchResult, ImageInfo, StagedFile};
use crate::remote::error::ApiError;
use crate::remote::traits::ImageApi;
use crate::utils::{join_segments, validate_base_url};

/// Multipart field name the backend collects uploaded files from
const UPLOAD_FIELD: &str = "images";

/// reqwest-backed client for the remote image API
///
/// All endpoints hang off one base resource URL, e.g. `http://localhost:8080/api/v1/images`.
#[derive(Debug, Clone)]
pub struct HttpImageApi {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct FilenamesRequest<'a> {
    filenames: &'a [String],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchInfoResponse {
    #[serde(default)]
    files_info: Vec<ImageInfo>,
}

impl HttpImageApi {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = validate_base_url(base_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn build_request(&self, method: Method, segments: &[&str]) -> Result<reqwest::RequestBuilder, ApiError> {
        let url = join_segments(&self.base_url, segments).map_err(|e| ApiError::Url(e.to_string()))?;
        debug!(method = %method, url = %url, "Building remote API request");

        let mut request = self.client.request(method, url);

        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        Ok(request)
    }

    /// Turn any non-2xx response into an error carrying the status and body
    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        error!(status = %status, body = %text, "Remote image API request failed");
        Err(ApiError::from_status(status, text))
    }
}

#[async_trait]
impl ImageApi for HttpImageApi {
    async fn list_images(&self) -> Result<Vec<String>, ApiError> {
        info!("Fetching image listing");

        let response = self.build_request(Method::GET, &[])?.send().await?;
        let response = Self::check_status(response).await?;

        let filenames: Option<Vec<String>> = response.json().await?;
        let filenames = filenames.unwrap_or_default();
        info!(count = filenames.len(), "Fetched image listing");

        Ok(filenames)
    }

    async fn upload_batch(&self, files: &[StagedFile]) -> Result<BatchResult, ApiError> {
        let total_bytes: u64 = files.iter().map(|f| f.size_bytes).sum();
        info!(count = files.len(), bytes = total_bytes, "Uploading image batch");

        let form = files.iter().fold(Form::new(), |form, file| {
            let part = Part::bytes(file.content.clone()).file_name(file.name.clone());
            form.part(UPLOAD_FIELD, part)
        });

        let response = self
            .build_request(Method::POST, &["batch"])?
            .multipart(form)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let result: BatchResult = response.json().await?;
        info!(
            success = result.success_count,
            total = result.total_files,
            "Image batch upload completed"
        );

        Ok(result)
    }

    async fn fetch_image(&self, filename: &str) -> Result<Vec<u8>, ApiError> {
        debug!(filename = %filename, "Fetching image");

        let response = self.build_request(Method::GET, &[filename])?.send().await?;
        let response = Self::check_status(response).await?;

        Ok(response.bytes().await?.to_vec())
    }

    async fn delete_image(&self, filename: &str) -> Result<(), ApiError> {
        info!(filename = %filename, "Deleting image");

        let response = self.build_request(Method::DELETE, &[filename])?.send().await?;
        Self::check_status(response).await?;

        Ok(())
    }

    async fn delete_batch(&self, filenames: &[String]) -> Result<BatchDeleteResult, ApiError> {
        info!(count = filenames.len(), "Deleting image batch");

        let response = self
            .build_request(Method::DELETE, &["batch"])?
            .json(&FilenamesRequest { filenames })
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let result: BatchDeleteResult = response.json().await?;
        info!(
            success = result.summary.success_count,
            total = result.summary.total_files,
            "Image batch delete completed"
        );

        Ok(result)
    }

    async fn retrieve_batch(&self, filenames: &[String]) -> Result<Vec<u8>, ApiError> {
        info!(count = filenames.len(), "Retrieving image batch as archive");

        let response = self
            .build_request(Method::POST, &["batch", "retrieve"])?
            .json(&FilenamesRequest { filenames })
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let archive = response.bytes().await?;
        info!(bytes = archive.len(), "Archive retrieved");

        Ok(archive.to_vec())
    }

    async fn batch_info(&self, filenames: &[String]) -> Result<Vec<ImageInfo>, ApiError> {
        info!(count = filenames.len(), "Fetching image batch info");

        let response = self
            .build_request(Method::POST, &["batch", "info"])?
            .json(&FilenamesRequest { filenames })
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let info: BatchInfoResponse = response.json().await?;
        Ok(info.files_info)
    }
}
