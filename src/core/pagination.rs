//! Page/limit normalization and the paged response envelope

use serde::Serialize;

pub const DEFAULT_LIMIT: i64 = 10;
pub const DEFAULT_PAGE: i64 = 1;

/// Normalized paging window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub limit: i64,
    pub page: i64,
    pub skip: i64,
}

impl Pagination {
    /// Absent or non-positive values fall back to the defaults
    pub fn normalize(limit: Option<i64>, page: Option<i64>) -> Self {
        Self::normalize_with(limit, page, DEFAULT_LIMIT)
    }

    /// Same as [`Pagination::normalize`] with a configured default limit
    pub fn normalize_with(limit: Option<i64>, page: Option<i64>, default_limit: i64) -> Self {
        let default_limit = if default_limit > 0 {
            default_limit
        } else {
            DEFAULT_LIMIT
        };
        let limit = limit.filter(|l| *l > 0).unwrap_or(default_limit);
        let page = page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE);
        Self {
            limit,
            page,
            skip: (page - 1).saturating_mul(limit),
        }
    }

    pub fn total_pages(&self, total_results: i64) -> i64 {
        if total_results <= 0 {
            0
        } else {
            (total_results - 1) / self.limit + 1
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::normalize(None, None)
    }
}

/// List response envelope
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    pub result: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub total_results: i64,
}

impl<T> Paged<T> {
    pub fn new(result: Vec<T>, pagination: Pagination, total_results: i64) -> Self {
        Self {
            result,
            page: pagination.page,
            limit: pagination.limit,
            total_pages: pagination.total_pages(total_results),
            total_results,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            result: self.result.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
            total_results: self.total_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_huge_limit_counts_one_page() {
        let p = Pagination::normalize(Some(i64::MAX), Some(1));
        assert_eq!(p.total_pages(2), 1);
        assert_eq!(p.total_pages(0), 0);

        let paged = Paged::new(vec![1, 2], p, 2);
        assert_eq!(paged.total_pages, 1);
        assert_eq!(paged.limit, i64::MAX);
    }

    #[test]
    fn test_huge_page_saturates_skip() {
        let p = Pagination::normalize(Some(i64::MAX), Some(i64::MAX));
        assert_eq!(p.skip, i64::MAX);
        assert_eq!(p.total_pages(i64::MAX), 1);
    }

    #[test]
    fn test_non_positive_values_use_defaults() {
        let p = Pagination::normalize(Some(0), Some(-1));
        assert_eq!(p.limit, 10);
        assert_eq!(p.page, 1);
        assert_eq!(p.skip, 0);
    }

    #[test]
    fn test_absent_values_use_defaults() {
        assert_eq!(Pagination::normalize(None, None), Pagination::default());
    }

    #[test]
    fn test_skip_is_derived_from_page() {
        let p = Pagination::normalize(Some(25), Some(3));
        assert_eq!(p.skip, 50);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let p = Pagination::normalize(Some(10), Some(1));
        assert_eq!(p.total_pages(0), 0);
        assert_eq!(p.total_pages(1), 1);
        assert_eq!(p.total_pages(10), 1);
        assert_eq!(p.total_pages(11), 2);
    }

    #[test]
    fn test_envelope_serializes_camel_case() {
        let paged = Paged::new(vec![1, 2], Pagination::normalize(Some(2), Some(1)), 5);
        let json = serde_json::to_value(&paged).unwrap();
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["totalResults"], 5);
        assert_eq!(json["result"].as_array().unwrap().len(), 2);
    }
}
