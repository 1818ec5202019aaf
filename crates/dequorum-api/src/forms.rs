//! Typed validation of submitted fields.
//!
//! Each form reads its raw values out of [`FormData`], and `clean` turns them
//! into either a validated value or a field -> messages map. Handlers only
//! write once every form involved came back `Ok`.

use std::collections::BTreeMap;

use dequorum_persist::{ForumStore, Tag};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiResult;
use crate::form_data::FormData;

pub const TITLE_MAX_CHARS: usize = 200;
pub const BODY_MAX_CHARS: usize = 10_000;

const REQUIRED: &str = "This field is required.";

/// Field name -> error messages. Serializes as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

fn clean_text(field: &str, raw: &str, max_chars: usize, errors: &mut FieldErrors) -> String {
    let value = raw.trim();
    let length = value.chars().count();
    if value.is_empty() {
        errors.add(field, REQUIRED);
    } else if length > max_chars {
        errors.add(
            field,
            format!("Ensure this value has at most {} characters (it has {}).", max_chars, length),
        );
    }
    value.to_string()
}

// ---------------------------------------------------------------------------
// Thread

#[derive(Debug, Clone, Default)]
pub struct ThreadForm {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidThread {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ThreadFormView {
    pub title: String,
    pub errors: FieldErrors,
}

impl ThreadForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            title: data.get("title").unwrap_or_default().to_string(),
        }
    }

    pub fn clean(&self) -> Result<ValidThread, FieldErrors> {
        let mut errors = FieldErrors::default();
        let title = clean_text("title", &self.title, TITLE_MAX_CHARS, &mut errors);
        errors.into_result(ValidThread { title })
    }

    pub fn view(&self, errors: FieldErrors) -> ThreadFormView {
        ThreadFormView {
            title: self.title.clone(),
            errors,
        }
    }
}

// ---------------------------------------------------------------------------
// Message

#[derive(Debug, Clone, Default)]
pub struct MessageForm {
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidMessage {
    pub body: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageFormView {
    pub body: String,
    pub errors: FieldErrors,
}

impl MessageForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            body: data.get("body").unwrap_or_default().to_string(),
        }
    }

    pub fn clean(&self) -> Result<ValidMessage, FieldErrors> {
        let mut errors = FieldErrors::default();
        let body = clean_text("body", &self.body, BODY_MAX_CHARS, &mut errors);
        errors.into_result(ValidMessage { body })
    }

    pub fn view(&self, errors: FieldErrors) -> MessageFormView {
        MessageFormView {
            body: self.body.clone(),
            errors,
        }
    }
}

// ---------------------------------------------------------------------------
// Tag selection

/// Multi-select of tag ids. Selecting nothing is valid.
#[derive(Debug, Clone, Default)]
pub struct TagForm {
    pub tag: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TagFormView {
    /// Selected tag ids
    pub tag: Vec<String>,
    pub errors: FieldErrors,
}

impl TagForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            tag: data.get_all("tag"),
        }
    }

    /// Selected ids without blanks or repeats, in submission order
    pub fn selected_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::with_capacity(self.tag.len());
        for id in self.tag.iter().map(|id| id.trim()) {
            if !id.is_empty() && !ids.iter().any(|seen| seen == id) {
                ids.push(id.to_string());
            }
        }
        ids
    }

    /// Resolve the selection against the store.
    ///
    /// The outer result carries storage failures, the inner one validation.
    pub async fn clean(&self, store: &dyn ForumStore) -> ApiResult<Result<Vec<Tag>, FieldErrors>> {
        let ids = self.selected_ids();
        if ids.is_empty() {
            return Ok(Ok(Vec::new()));
        }

        let tags = store.get_tags(&ids).await?;
        let mut errors = FieldErrors::default();
        for id in &ids {
            if !tags.iter().any(|tag| &tag.id == id) {
                errors.add(
                    "tag",
                    format!("Select a valid choice. {} is not one of the available choices.", id),
                );
            }
        }
        Ok(errors.into_result(tags))
    }

    pub fn view(&self, errors: FieldErrors) -> TagFormView {
        TagFormView {
            tag: self.tag.clone(),
            errors,
        }
    }
}
