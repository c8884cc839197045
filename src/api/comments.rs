use serde::Deserialize;
use serde_json::json;

use crate::auth::claims::RecordId;
use crate::error::Result;
use crate::http::ApiClient;

use super::models::Comment;

/// Comment endpoints under `/images/{id}/comments`.
#[derive(Debug, Clone)]
pub struct CommentsApi {
    client: ApiClient,
}

/// Comment listings arrive either bare or wrapped.
#[derive(Deserialize)]
#[serde(untagged)]
enum CommentList {
    Bare(Vec<Comment>),
    Wrapped {
        #[serde(alias = "data")]
        comments: Vec<Comment>,
    },
}

impl CommentsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, image: &RecordId) -> Result<Vec<Comment>> {
        let list: CommentList = self
            .client
            .get(&format!("/images/{}/comments", image.path_segment()))
            .await
            .map_err(|e| e.with_fallback("Failed to load comments"))?
            .json()?;
        Ok(match list {
            CommentList::Bare(comments) | CommentList::Wrapped { comments } => comments,
        })
    }

    pub async fn create(&self, image: &RecordId, text: &str) -> Result<Comment> {
        self.client
            .post(
                &format!("/images/{}/comments", image.path_segment()),
                &json!({ "text": text }),
            )
            .await
            .map_err(|e| e.with_fallback("Failed to add comment"))?
            .json()
    }

    pub async fn update(&self, image: &RecordId, comment: &RecordId, text: &str) -> Result<Comment> {
        self.client
            .put(
                &format!(
                    "/images/{}/comments/{}",
                    image.path_segment(),
                    comment.path_segment()
                ),
                &json!({ "text": text }),
            )
            .await
            .map_err(|e| e.with_fallback("Failed to update comment"))?
            .json()
    }

    pub async fn delete(&self, image: &RecordId, comment: &RecordId) -> Result<()> {
        self.client
            .delete(&format!(
                "/images/{}/comments/{}",
                image.path_segment(),
                comment.path_segment()
            ))
            .await
            .map_err(|e| e.with_fallback("Failed to delete comment"))?;
        Ok(())
    }
}
