use crate::auth::claims::RecordId;
use crate::error::Result;
use crate::http::ApiClient;

use super::models::LikeState;

#[derive(Debug, Clone)]
pub struct LikesApi {
    client: ApiClient,
}

impl LikesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Like the image, or take the like back if already given.
    pub async fn toggle(&self, image: &RecordId) -> Result<LikeState> {
        self.client
            .post(&format!("/images/{}/like", image.path_segment()), &serde_json::json!({}))
            .await
            .map_err(|e| e.with_fallback("Failed to update like"))?
            .json()
    }
}
