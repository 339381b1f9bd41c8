//! HTTP handlers, one module per resource.

pub mod entries;
pub mod health;
pub mod projects;
pub mod search;
pub mod tags;
pub mod templates;

use brainshelf_core::defaults::{PAGE_NUMBER, PAGE_SIZE};
use brainshelf_core::PageRequest;
use serde::Deserialize;

/// `pageNumber`/`pageSize` query pair. List endpoints clamp these rather
/// than rejecting them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page_number.unwrap_or(PAGE_NUMBER),
            self.page_size.unwrap_or(PAGE_SIZE),
        )
    }
}
