use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use dequorum_persist::{Message, NewMessage, NewThread, Thread, ThreadDetail, ThreadFilter};
use crate::{
    auth::{MaybeUser, RequireUser},
    error::{ApiError, ApiResult},
    form_data::FormData,
    forms::{FieldErrors, MessageForm, MessageFormView, TagForm, TagFormView, ThreadForm, ThreadFormView},
    pagination::{Paginator, PAGE_SIZE},
    routes::tags::{tag_to_response, TagResponse},
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ThreadResponse {
    pub thread_id: String,
    pub owner_id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message_id: String,
    pub thread_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ThreadPage {
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_previous: bool,
    pub has_next: bool,
    pub threads: Vec<ThreadResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ThreadListResponse {
    /// Tags every listed thread carries
    pub path_tags: Vec<String>,
    /// Tags of which every listed thread carries at least one
    pub tag_form: TagFormView,
    pub available_tags: Vec<TagResponse>,
    pub page: ThreadPage,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateThreadPage {
    pub thread_form: ThreadFormView,
    pub message_form: MessageFormView,
    pub tag_form: TagFormView,
    pub available_tags: Vec<TagResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ThreadDetailResponse {
    pub thread: ThreadResponse,
    pub message_count: usize,
    pub messages: Vec<MessageResponse>,
    /// Reply form, only offered to signed-in requesters
    pub form: Option<MessageFormView>,
}

/// List visible threads
#[utoipa::path(
    get,
    path = "/threads",
    params(
        ("tag" = Option<Vec<String>>, Query, description = "Tag ids; threads with any of them are listed"),
        ("page" = Option<String>, Query, description = "Page number, clamped into range")
    ),
    responses(
        (status = 200, description = "One page of threads", body = ThreadListResponse)
    ),
    tag = "threads"
)]
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<ThreadListResponse>> {
    render_thread_list(&state, Vec::new(), FormData::from_query(query.as_deref())).await
}

/// List visible threads carrying every tag in the path
#[utoipa::path(
    get,
    path = "/threads/tagged/{path_tags}",
    params(
        ("path_tags" = String, Path, description = "Slash separated tag names, all required"),
        ("tag" = Option<Vec<String>>, Query, description = "Tag ids; threads with any of them are listed"),
        ("page" = Option<String>, Query, description = "Page number, clamped into range")
    ),
    responses(
        (status = 200, description = "One page of threads", body = ThreadListResponse)
    ),
    tag = "threads"
)]
pub async fn list_tagged_threads(
    State(state): State<Arc<AppState>>,
    Path(path_tags): Path<String>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<ThreadListResponse>> {
    render_thread_list(&state, parse_path_tags(&path_tags), FormData::from_query(query.as_deref())).await
}

/// Empty forms for a new thread
#[utoipa::path(
    get,
    path = "/threads/create",
    responses(
        (status = 200, description = "Empty creation forms", body = CreateThreadPage),
        (status = 303, description = "Anonymous requester sent to the login page")
    ),
    tag = "threads"
)]
pub async fn create_thread_form(
    State(state): State<Arc<AppState>>,
    RequireUser(_user): RequireUser,
) -> ApiResult<Json<CreateThreadPage>> {
    let page = create_thread_page(
        &state,
        ThreadForm::default().view(FieldErrors::default()),
        MessageForm::default().view(FieldErrors::default()),
        TagForm::default().view(FieldErrors::default()),
    )
    .await?;
    Ok(Json(page))
}

/// Create a thread with its opening message
///
/// Urlencoded fields: `title`, `body` and any number of `tag` ids.
#[utoipa::path(
    post,
    path = "/threads/create",
    responses(
        (status = 303, description = "Created; Location points at the new thread, or the login page for anonymous requesters"),
        (status = 422, description = "Validation failed; forms returned with errors", body = CreateThreadPage)
    ),
    tag = "threads"
)]
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    RequireUser(user): RequireUser,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let data = FormData::from_body(&headers, &body)?;
    let thread_form = ThreadForm::from_data(&data);
    let message_form = MessageForm::from_data(&data);
    let tag_form = TagForm::from_data(&data);

    let cleaned = (
        thread_form.clean(),
        message_form.clean(),
        tag_form.clean(state.store.as_ref()).await?,
    );

    match cleaned {
        (Ok(thread), Ok(message), Ok(tags)) => {
            let (thread, message) = state
                .store
                .create_thread(NewThread {
                    owner_id: user.clone(),
                    title: thread.title,
                    tags,
                    first_message: message.body,
                })
                .await?;

            tracing::info!(
                thread_id = %thread.id,
                message_id = %message.id,
                owner = %user,
                "Thread created"
            );
            Ok(Redirect::to(&thread_url(&thread.id)).into_response())
        }
        (thread, message, tags) => {
            tracing::debug!(owner = %user, "Thread creation rejected by validation");
            let page = create_thread_page(
                &state,
                thread_form.view(thread.err().unwrap_or_default()),
                message_form.view(message.err().unwrap_or_default()),
                tag_form.view(tags.err().unwrap_or_default()),
            )
            .await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(page)).into_response())
        }
    }
}

/// Get a visible thread with its visible messages
#[utoipa::path(
    get,
    path = "/threads/{thread_id}",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    responses(
        (status = 200, description = "Thread details", body = ThreadDetailResponse),
        (status = 404, description = "Thread not found")
    ),
    tag = "threads"
)]
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ThreadDetailResponse>> {
    let detail = load_visible_thread(&state, thread_id).await?;
    let form = user.map(|_| MessageForm::default().view(FieldErrors::default()));
    Ok(Json(detail_to_response(detail, form)))
}

/// Reply to a thread
///
/// Urlencoded field: `body`. Anonymous submissions are ignored and the thread
/// is shown without a reply form.
#[utoipa::path(
    post,
    path = "/threads/{thread_id}",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    responses(
        (status = 303, description = "Reply stored; Location points back at the thread"),
        (status = 200, description = "Anonymous requester; thread shown without a form", body = ThreadDetailResponse),
        (status = 404, description = "Thread not found"),
        (status = 422, description = "Validation failed; form returned with errors", body = ThreadDetailResponse)
    ),
    tag = "threads"
)]
pub async fn reply_to_thread(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(thread_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let detail = load_visible_thread(&state, thread_id).await?;

    let Some(user) = user else {
        return Ok(Json(detail_to_response(detail, None)).into_response());
    };

    let data = FormData::from_body(&headers, &body)?;
    let form = MessageForm::from_data(&data);

    match form.clean() {
        Ok(message) => {
            let thread_id = detail.thread.id;
            let message = state
                .store
                .create_message(NewMessage {
                    thread_id: thread_id.clone(),
                    author_id: user.clone(),
                    body: message.body,
                })
                .await?;

            tracing::info!(
                thread_id = %thread_id,
                message_id = %message.id,
                author = %user,
                "Reply posted"
            );
            Ok(Redirect::to(&thread_url(&thread_id)).into_response())
        }
        Err(errors) => {
            tracing::debug!(thread_id = %detail.thread.id, author = %user, "Reply rejected by validation");
            let response = detail_to_response(detail, Some(form.view(errors)));
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(response)).into_response())
        }
    }
}

/// Split a `a/b/c` path segment into tag names, dropping empty pieces
pub fn parse_path_tags(path_tags: &str) -> Vec<String> {
    path_tags
        .split('/')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn thread_url(thread_id: &str) -> String {
    format!("/threads/{}", thread_id)
}

async fn render_thread_list(
    state: &AppState,
    path_tags: Vec<String>,
    query: FormData,
) -> ApiResult<Json<ThreadListResponse>> {
    let mut filter = ThreadFilter::new().with_all_tags(path_tags.clone());

    // An invalid selection is reported back and filters nothing
    let tag_form = TagForm::from_data(&query);
    let tag_errors = match tag_form.clean(state.store.as_ref()).await? {
        Ok(tags) => {
            if !tags.is_empty() {
                filter = filter.with_any_tags(tags.into_iter().map(|tag| tag.name).collect());
            }
            FieldErrors::default()
        }
        Err(errors) => errors,
    };

    let count = state.store.count_visible_threads(&filter).await?;
    let window = Paginator::new(count, PAGE_SIZE).page(query.get("page"));
    let threads = state
        .store
        .list_visible_threads(&filter, window.offset(), window.limit())
        .await?;
    let available_tags = state.store.list_tags().await?;

    Ok(Json(ThreadListResponse {
        path_tags,
        tag_form: tag_form.view(tag_errors),
        available_tags: available_tags.into_iter().map(tag_to_response).collect(),
        page: ThreadPage {
            number: window.number,
            num_pages: window.num_pages,
            count: window.count,
            has_previous: window.has_previous(),
            has_next: window.has_next(),
            threads: threads.into_iter().map(thread_to_response).collect(),
        },
    }))
}

async fn create_thread_page(
    state: &AppState,
    thread_form: ThreadFormView,
    message_form: MessageFormView,
    tag_form: TagFormView,
) -> ApiResult<CreateThreadPage> {
    let available_tags = state.store.list_tags().await?;
    Ok(CreateThreadPage {
        thread_form,
        message_form,
        tag_form,
        available_tags: available_tags.into_iter().map(tag_to_response).collect(),
    })
}

async fn load_visible_thread(state: &AppState, thread_id: String) -> ApiResult<ThreadDetail> {
    state
        .store
        .get_visible_thread_with_messages(&thread_id)
        .await?
        .ok_or(ApiError::ThreadNotFound(thread_id))
}

fn detail_to_response(detail: ThreadDetail, form: Option<MessageFormView>) -> ThreadDetailResponse {
    ThreadDetailResponse {
        thread: thread_to_response(detail.thread),
        message_count: detail.message_count,
        messages: detail.messages.into_iter().map(message_to_response).collect(),
        form,
    }
}

fn thread_to_response(thread: Thread) -> ThreadResponse {
    ThreadResponse {
        thread_id: thread.id,
        owner_id: thread.owner_id,
        title: thread.title,
        tags: thread.tags,
        created_at: thread.created_at,
    }
}

fn message_to_response(message: Message) -> MessageResponse {
    MessageResponse {
        message_id: message.id,
        thread_id: message.thread_id,
        author_id: message.author_id,
        body: message.body,
        created_at: message.created_at,
    }
}
