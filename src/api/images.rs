use std::path::Path;

use reqwest::Method;

use crate::auth::claims::RecordId;
use crate::error::{PixshareError, Result};
use crate::http::{ApiClient, ApiRequest, FormPart};

use super::models::{Image, ImagePage, RawImagePage};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// An image ready to upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime: Option<String>,
    pub description: String,
}

impl Upload {
    /// Read `path` and guess its content type from the extension.
    pub async fn from_path(path: impl AsRef<Path>, description: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                PixshareError::InvalidArgument(format!("{} has no file name", path.display()))
            })?;
        Ok(Self {
            bytes,
            mime: guess_mime(&file_name).map(str::to_string),
            file_name,
            description: description.into(),
        })
    }
}

fn guess_mime(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Gallery endpoints under `/images`.
#[derive(Debug, Clone)]
pub struct ImagesApi {
    client: ApiClient,
}

impl ImagesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Images uploaded by all users.
    pub async fn list(&self, page: u32, limit: u32) -> Result<ImagePage> {
        let request = paged(ApiRequest::new(Method::GET, "/images"), page, limit);
        self.fetch_page(request, limit, "Failed to fetch images").await
    }

    /// Images uploaded by the logged-in user.
    pub async fn mine(&self, page: u32, limit: u32) -> Result<ImagePage> {
        let request = paged(ApiRequest::new(Method::GET, "/images/user"), page, limit);
        self.fetch_page(request, limit, "Failed to fetch user images")
            .await
    }

    pub async fn search(&self, query: &str, page: u32, limit: u32) -> Result<ImagePage> {
        let request = paged(
            ApiRequest::new(Method::GET, "/images/search").query("q", query),
            page,
            limit,
        );
        self.fetch_page(request, limit, "Failed to search images")
            .await
    }

    pub async fn get(&self, id: &RecordId) -> Result<Image> {
        self.client
            .get(&format!("/images/{}", id.path_segment()))
            .await
            .map_err(|e| e.with_fallback("Failed to fetch image"))?
            .json()
    }

    /// Upload as multipart `file` + `description`.
    pub async fn upload(&self, upload: Upload) -> Result<Image> {
        let parts = vec![
            FormPart::file("file", upload.file_name, upload.mime, upload.bytes),
            FormPart::text("description", upload.description),
        ];
        let image: Image = self
            .client
            .post_multipart("/images", parts)
            .await
            .map_err(|e| e.with_fallback("Failed to upload image"))?
            .json()?;
        tracing::info!(image_id = %image.id, "image uploaded");
        Ok(image)
    }

    pub async fn delete(&self, id: &RecordId) -> Result<()> {
        self.client
            .delete(&format!("/images/{}", id.path_segment()))
            .await
            .map_err(|e| e.with_fallback("Failed to delete image"))?;
        tracing::info!(image_id = %id, "image deleted");
        Ok(())
    }

    async fn fetch_page(&self, request: ApiRequest, limit: u32, fallback: &str) -> Result<ImagePage> {
        let raw: RawImagePage = self
            .client
            .send(request)
            .await
            .map_err(|e| e.with_fallback(fallback))?
            .json()?;
        Ok(ImagePage::from_response(raw, limit))
    }
}

fn paged(request: ApiRequest, page: u32, limit: u32) -> ApiRequest {
    request.query("page", page.max(1)).query("limit", limit.max(1))
}
