//! Pagination request and response shapes.

use serde::{Deserialize, Deserializer, Serialize};

use super::DiaryStatus;

/// Query sent with every list request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DiaryStatus>,
}

impl PageQuery {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            keyword: None,
            status: None,
        }
    }
}

/// One page of results.
///
/// Accepts a bare JSON array or an envelope whose items live under
/// `data`, `items` or `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total: Option<u64>,
    pub total_pages: Option<u32>,
}

impl<T> PageResult<T> {
    pub fn new(items: Vec<T>, total: Option<u64>) -> Self {
        Self {
            items,
            total,
            total_pages: None,
        }
    }
}

impl<'de, T> Deserialize<'de> for PageResult<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Envelope<T> {
            #[serde(alias = "items", alias = "list")]
            data: Vec<T>,
            #[serde(default)]
            total: Option<u64>,
            #[serde(default)]
            total_pages: Option<u32>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw<T> {
            Bare(Vec<T>),
            Envelope(Envelope<T>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Bare(items) => PageResult {
                items,
                total: None,
                total_pages: None,
            },
            Raw::Envelope(env) => PageResult {
                items: env.data,
                total: env.total,
                total_pages: env.total_pages,
            },
        })
    }
}
