use utoipa::OpenApi;

use crate::forms::{FieldErrors, MessageFormView, TagFormView, ThreadFormView};
use crate::routes::{health, tags, threads};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        tags::list_tags,
        threads::list_threads,
        threads::list_tagged_threads,
        threads::create_thread_form,
        threads::create_thread,
        threads::get_thread,
        threads::reply_to_thread,
    ),
    components(schemas(
        health::HealthResponse,
        tags::TagResponse,
        tags::ListTagsResponse,
        threads::ThreadResponse,
        threads::MessageResponse,
        threads::ThreadPage,
        threads::ThreadListResponse,
        threads::CreateThreadPage,
        threads::ThreadDetailResponse,
        FieldErrors,
        ThreadFormView,
        MessageFormView,
        TagFormView,
    )),
    tags(
        (name = "threads", description = "Browse, start and reply to threads"),
        (name = "tags", description = "Tags threads are filtered by"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;
