use std::num::IntErrorKind;

/// Threads per listing page
pub const PAGE_SIZE: u64 = 10;

/// Splits `count` items into pages of `per_page`.
///
/// There is always at least one page, even with nothing to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: u64,
    per_page: u64,
}

/// A resolved page: always inside `1..=num_pages`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub per_page: u64,
}

impl Paginator {
    pub fn new(count: u64, per_page: u64) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    pub fn num_pages(&self) -> u64 {
        self.count.div_ceil(self.per_page).max(1)
    }

    /// Turn the raw `page` parameter into a page that exists.
    ///
    /// Missing or non-integer input gives the first page; integers outside
    /// the range (including ones too large to parse) give the last page.
    pub fn resolve(&self, raw: Option<&str>) -> u64 {
        let last = self.num_pages();
        let Some(raw) = raw.map(str::trim) else {
            return 1;
        };

        match raw.parse::<i64>() {
            Ok(number) if number >= 1 && (number as u64) <= last => number as u64,
            Ok(_) => last,
            Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => last,
            Err(_) => 1,
        }
    }

    pub fn page(&self, raw: Option<&str>) -> PageWindow {
        PageWindow {
            number: self.resolve(raw),
            num_pages: self.num_pages(),
            count: self.count,
            per_page: self.per_page,
        }
    }
}

impl PageWindow {
    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }
}
