/// Tag constraints applied when listing threads.
///
/// `all_tags` must every one be present on a thread (AND). When `any_tags` is
/// non-empty the thread must also carry at least one of them (OR). Both hold
/// tag names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadFilter {
    pub all_tags: Vec<String>,
    pub any_tags: Vec<String>,
}

impl ThreadFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_all_tags(mut self, tags: Vec<String>) -> Self {
        self.all_tags = tags;
        self
    }

    pub fn with_any_tags(mut self, tags: Vec<String>) -> Self {
        self.any_tags = tags;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.all_tags.is_empty() && self.any_tags.is_empty()
    }

    /// Reference predicate for a thread carrying `tags`.
    pub fn matches(&self, tags: &[String]) -> bool {
        let has = |wanted: &String| tags.iter().any(|tag| tag == wanted);

        if !self.all_tags.iter().all(has) {
            return false;
        }
        self.any_tags.is_empty() || self.any_tags.iter().any(has)
    }
}
