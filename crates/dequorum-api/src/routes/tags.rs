use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use dequorum_persist::Tag;
use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TagResponse {
    pub tag_id: String,
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListTagsResponse {
    pub tags: Vec<TagResponse>,
}

/// List the tags threads can be filtered by
#[utoipa::path(
    get,
    path = "/tags",
    responses(
        (status = 200, description = "Available tags", body = ListTagsResponse)
    ),
    tag = "tags"
)]
pub async fn list_tags(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ListTagsResponse>> {
    let tags = state.store.list_tags().await?;
    Ok(Json(ListTagsResponse {
        tags: tags.into_iter().map(tag_to_response).collect(),
    }))
}

pub fn tag_to_response(tag: Tag) -> TagResponse {
    TagResponse {
        tag_id: tag.id,
        name: tag.name,
    }
}
