// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Page-number pagination for audit queries.

use serde::Deserialize;
use utoipa::IntoParams;

/// Default number of events per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on events per page.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw pagination parameters as supplied by the caller.
///
/// Both values may be absent, zero or negative; [`PageConfig::normalize`]
/// turns them into a valid [`Page`].
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
pub struct PageParams {
    /// 1-indexed page number (default 1).
    pub page: Option<i64>,
    /// Events per page (default and maximum are configured).
    pub page_size: Option<i64>,
}

impl PageParams {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }
}

/// A normalized page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub size: u64,
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPageConfig {
    #[error("default page size must be at least 1")]
    ZeroDefault,
    #[error("max page size {max} is smaller than default page size {default}")]
    MaxBelowDefault { default: u32, max: u32 },
}

/// Default and maximum page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageConfig {
    default_size: u32,
    max_size: u32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            default_size: DEFAULT_PAGE_SIZE,
            max_size: MAX_PAGE_SIZE,
        }
    }
}

impl PageConfig {
    pub fn new(default_size: u32, max_size: u32) -> Result<Self, InvalidPageConfig> {
        if default_size == 0 {
            return Err(InvalidPageConfig::ZeroDefault);
        }
        if max_size < default_size {
            return Err(InvalidPageConfig::MaxBelowDefault {
                default: default_size,
                max: max_size,
            });
        }
        Ok(Self {
            default_size,
            max_size,
        })
    }

    pub fn default_size(&self) -> u32 {
        self.default_size
    }

    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    /// Clamp the size to `[1, max]`, default it when absent or non-positive,
    /// and treat pages below 1 as page 1.
    pub fn normalize(&self, params: PageParams) -> Page {
        let number = match params.page {
            Some(page) if page >= 1 => page as u64,
            _ => 1,
        };
        let size = match params.page_size {
            Some(size) if size >= 1 => (size as u64).min(u64::from(self.max_size)),
            _ => u64::from(self.default_size),
        };
        Page {
            number,
            size,
            offset: (number - 1).saturating_mul(size),
        }
    }
}
