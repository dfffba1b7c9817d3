//! Offset pagination (`skip` / `top`), where `skip` need not be a multiple of `top`

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_TOP: i64 = 100;
pub const DEFAULT_MAX_TOP: i64 = 1000;

/// Server-side paging limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageLimits {
    pub default_top: i64,
    pub max_top: i64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_top: DEFAULT_TOP,
            max_top: DEFAULT_MAX_TOP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OffsetPage {
    skip: i64,
    top: i64,
}

impl OffsetPage {
    pub fn new(skip: i64, top: i64) -> Result<Self> {
        if skip < 0 {
            return Err(Error::InvalidPagination(
                "skip (offset) must be >= 0".to_string(),
            ));
        }
        if top <= 0 {
            return Err(Error::InvalidPagination("top (limit) must be > 0".to_string()));
        }
        Ok(Self { skip, top })
    }

    /// Apply defaults and the configured maximum page size
    pub fn from_request(skip: Option<i64>, top: Option<i64>, limits: &PageLimits) -> Result<Self> {
        let page = Self::new(skip.unwrap_or(0), top.unwrap_or(limits.default_top))?;
        if page.top > limits.max_top {
            return Err(Error::InvalidPagination(format!(
                "top (limit) must be <= {}",
                limits.max_top
            )));
        }
        Ok(page)
    }

    pub fn skip(&self) -> i64 {
        self.skip
    }

    pub fn top(&self) -> i64 {
        self.top
    }

    pub fn page_number(&self) -> i64 {
        self.skip / self.top
    }

    pub fn has_previous(&self) -> bool {
        self.skip > 0
    }

    pub fn next(&self) -> Result<Self> {
        let skip = self
            .skip
            .checked_add(self.top)
            .ok_or_else(|| Error::InvalidPagination("skip (offset) is out of range".to_string()))?;
        Ok(Self { skip, top: self.top })
    }

    pub fn previous_or_first(&self) -> Self {
        Self {
            skip: (self.skip - self.top).max(0),
            top: self.top,
        }
    }

    pub fn first(&self) -> Self {
        Self { skip: 0, top: self.top }
    }

    pub fn with_page(&self, page_number: i64) -> Result<Self> {
        if page_number < 0 {
            return Err(Error::InvalidPagination("pageNumber must be >= 0".to_string()));
        }
        let skip = page_number
            .checked_mul(self.top)
            .ok_or_else(|| Error::InvalidPagination("pageNumber is out of range".to_string()))?;
        Self::new(skip, self.top)
    }

    /// Neighbouring pages of a result holding `total` rows
    pub fn links(&self, total: i64) -> PageLinks {
        PageLinks {
            page_number: self.page_number(),
            first: self.first().skip,
            previous: self.has_previous().then(|| self.previous_or_first().skip),
            next: self.next().ok().map(|next| next.skip).filter(|&skip| skip < total),
        }
    }
}

/// Skip offsets of the first, previous and next pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageLinks {
    pub page_number: i64,
    pub first: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<i64>,
}

impl Default for OffsetPage {
    fn default() -> Self {
        Self {
            skip: 0,
            top: DEFAULT_TOP,
        }
    }
}
