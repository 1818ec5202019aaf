use axum::http::{header, HeaderMap};

use crate::error::{ApiError, ApiResult};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Decoded `key=value` pairs from a query string or an urlencoded body.
///
/// Keys may repeat; a multi-select sends one pair per selected option.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn parse(input: &[u8]) -> Self {
        Self {
            pairs: url::form_urlencoded::parse(input).into_owned().collect(),
        }
    }

    pub fn from_query(query: Option<&str>) -> Self {
        query.map(|q| Self::parse(q.as_bytes())).unwrap_or_default()
    }

    /// Parse a request body, refusing anything but an urlencoded form
    pub fn from_body(headers: &HeaderMap, body: &[u8]) -> ApiResult<Self> {
        if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
            let essence = content_type
                .to_str()
                .unwrap_or_default()
                .split(';')
                .next()
                .unwrap_or_default()
                .trim();
            if !essence.eq_ignore_ascii_case(FORM_CONTENT_TYPE) {
                return Err(ApiError::BadRequest(format!(
                    "Expected a {} body",
                    FORM_CONTENT_TYPE
                )));
            }
        }
        Ok(Self::parse(body))
    }

    /// Last value sent for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value sent for `key`, in order
    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }
}
