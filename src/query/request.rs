//! Page requests and pagination tokens

use crate::pagination::NextToken;

/// Pagination state carried by a request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageToken {
    /// Cursor pagination, no cursor on the first request
    Cursor {
        cursor_param: String,
        limit_param: String,
        limit: u32,
        cursor: Option<String>,
    },
    /// Page number pagination, first page is 1
    PageNumber {
        page_param: String,
        per_page_param: String,
        page: u32,
        per_page: u32,
    },
    /// Offset pagination, first offset is 0
    Offset {
        offset_param: String,
        limit_param: String,
        offset: u64,
        limit: u32,
    },
    /// One-shot detail request
    Single,
}

impl PageToken {
    /// Number of records asked for, if the token carries one
    pub fn page_size(&self) -> Option<u32> {
        match self {
            PageToken::Cursor { limit, .. } | PageToken::Offset { limit, .. } => Some(*limit),
            PageToken::PageNumber { per_page, .. } => Some(*per_page),
            PageToken::Single => None,
        }
    }

    /// Whether this is the first page of a traversal
    pub fn is_first(&self) -> bool {
        match self {
            PageToken::Cursor { cursor, .. } => cursor.is_none(),
            PageToken::PageNumber { page, .. } => *page <= 1,
            PageToken::Offset { offset, .. } => *offset == 0,
            PageToken::Single => true,
        }
    }

    fn pairs(&self) -> Vec<(String, String)> {
        match self {
            PageToken::Cursor {
                cursor_param,
                limit_param,
                limit,
                cursor,
            } => {
                let mut pairs = vec![(limit_param.clone(), limit.to_string())];
                if let Some(cursor) = cursor {
                    pairs.push((cursor_param.clone(), cursor.clone()));
                }
                pairs
            }
            PageToken::PageNumber {
                page_param,
                per_page_param,
                page,
                per_page,
            } => vec![
                (page_param.clone(), page.to_string()),
                (per_page_param.clone(), per_page.to_string()),
            ],
            PageToken::Offset {
                offset_param,
                limit_param,
                offset,
                limit,
            } => vec![
                (offset_param.clone(), offset.to_string()),
                (limit_param.clone(), limit.to_string()),
            ],
            PageToken::Single => Vec::new(),
        }
    }
}

/// A fully resolved request for one page
///
/// Immutable once built; successors are derived with [`PageRequest::advance`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRequest {
    /// Registry name of the endpoint
    pub endpoint: String,
    /// Path relative to the API base URL, routing parameters substituted
    pub path: String,
    /// Filter and sort parameters
    pub params: Vec<(String, String)>,
    /// Pagination state
    pub token: PageToken,
}

impl PageRequest {
    pub fn new(
        endpoint: impl Into<String>,
        path: impl Into<String>,
        params: Vec<(String, String)>,
        token: PageToken,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            path: path.into(),
            params,
            token,
        }
    }

    /// Filter and sort parameters followed by pagination parameters
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.params.clone();
        pairs.extend(self.token.pairs());
        pairs
    }

    /// Query string with form-encoded values
    pub fn query_string(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(k, v)| {
                let value: String = url::form_urlencoded::byte_serialize(v.as_bytes()).collect();
                format!("{k}={value}")
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Derive the request for the next page
    ///
    /// Returns `None` when the token kind does not fit this request.
    pub fn advance(&self, next: &NextToken) -> Option<PageRequest> {
        let token = match (&self.token, next) {
            (
                PageToken::Cursor {
                    cursor_param,
                    limit_param,
                    limit,
                    ..
                },
                NextToken::Cursor(cursor),
            ) => PageToken::Cursor {
                cursor_param: cursor_param.clone(),
                limit_param: limit_param.clone(),
                limit: *limit,
                cursor: Some(cursor.clone()),
            },
            (
                PageToken::PageNumber {
                    page_param,
                    per_page_param,
                    page,
                    per_page,
                },
                NextToken::Advance,
            ) => PageToken::PageNumber {
                page_param: page_param.clone(),
                per_page_param: per_page_param.clone(),
                page: page.saturating_add(1),
                per_page: *per_page,
            },
            (
                PageToken::Offset {
                    offset_param,
                    limit_param,
                    offset,
                    limit,
                },
                NextToken::Advance,
            ) => PageToken::Offset {
                offset_param: offset_param.clone(),
                limit_param: limit_param.clone(),
                offset: offset.saturating_add(u64::from(*limit)),
                limit: *limit,
            },
            _ => return None,
        };

        Some(PageRequest {
            endpoint: self.endpoint.clone(),
            path: self.path.clone(),
            params: self.params.clone(),
            token,
        })
    }
}

impl std::fmt::Display for PageRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let query = self.query_string();
        if query.is_empty() {
            write!(f, "{}", self.path)
        } else {
            write!(f, "{}?{}", self.path, query)
        }
    }
}
