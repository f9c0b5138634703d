//! Library search: directory filter, sort and pagination.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use vscan_models::LibraryEntry;

use crate::natural::natural_cmp;

/// Page size used when the request does not give one.
pub const DEFAULT_LIMIT: usize = 50;

/// Sort key for search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Name,
    Size,
    Date,
}

/// Sort direction for search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Search request body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LibraryQuery {
    /// 1-based page number
    pub page: Option<usize>,
    /// Items per page
    pub limit: Option<usize>,
    /// Directory filters; an entry matches if it lives in any of them
    pub dirs: Vec<String>,
    pub sort: SortField,
    pub order: SortOrder,
}

impl LibraryQuery {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).max(1)
    }

    fn matches(&self, entry: &LibraryEntry) -> bool {
        self.dirs.is_empty() || self.dirs.iter().any(|dir| entry.is_within(dir))
    }

    fn compare(&self, a: &LibraryEntry, b: &LibraryEntry) -> Ordering {
        let ord = match self.sort {
            SortField::Name => natural_cmp(&a.name, &b.name),
            SortField::Size => a.size.cmp(&b.size),
            SortField::Date => a.modified_at.cmp(&b.modified_at),
        };
        match self.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }

    /// Filter, sort and slice `entries`. Returns the page and the filtered total.
    pub fn select(&self, entries: &[LibraryEntry]) -> (Vec<LibraryEntry>, usize) {
        let mut matched: Vec<&LibraryEntry> = entries.iter().filter(|e| self.matches(e)).collect();
        matched.sort_by(|a, b| self.compare(a, b));

        let total = matched.len();
        let page = matched
            .into_iter()
            .skip((self.page() - 1).saturating_mul(self.limit()))
            .take(self.limit())
            .cloned()
            .collect();
        (page, total)
    }
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchItem {
    #[serde(flatten)]
    pub entry: LibraryEntry,
    /// A non-empty detection result exists next to the file
    pub processed: bool,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub items: Vec<SearchItem>,
    /// Matches across all pages
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(path: &str, size: u64, secs: i64) -> LibraryEntry {
        LibraryEntry {
            path: path.to_string(),
            name: path.rsplit('/').next().unwrap().to_string(),
            size,
            modified_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    fn library() -> Vec<LibraryEntry> {
        vec![
            entry("cam1/clip2.mp4", 300, 30),
            entry("cam1/clip10.mp4", 100, 10),
            entry("cam10/clip1.mp4", 200, 20),
            entry("root.mkv", 50, 40),
        ]
    }

    fn paths(items: &[LibraryEntry]) -> Vec<&str> {
        items.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn test_defaults() {
        let query: LibraryQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), DEFAULT_LIMIT);
        assert_eq!(query.sort, SortField::Name);
        assert_eq!(query.order, SortOrder::Asc);
    }

    #[test]
    fn test_dir_filter_is_prefix_on_segments() {
        let query = LibraryQuery {
            dirs: vec!["cam1".to_string()],
            ..Default::default()
        };
        let (items, total) = query.select(&library());
        assert_eq!(total, 2);
        assert_eq!(paths(&items), vec!["cam1/clip2.mp4", "cam1/clip10.mp4"]);
    }

    #[test]
    fn test_sort_by_size_desc() {
        let query: LibraryQuery = serde_json::from_str(r#"{"sort":"size","order":"desc"}"#).unwrap();
        let (items, _) = query.select(&library());
        assert_eq!(
            paths(&items),
            vec!["cam1/clip2.mp4", "cam10/clip1.mp4", "cam1/clip10.mp4", "root.mkv"]
        );
    }

    #[test]
    fn test_sort_by_date() {
        let query: LibraryQuery = serde_json::from_str(r#"{"sort":"date"}"#).unwrap();
        let (items, _) = query.select(&library());
        assert_eq!(items.first().unwrap().path, "cam1/clip10.mp4");
        assert_eq!(items.last().unwrap().path, "root.mkv");
    }

    #[test]
    fn test_pagination() {
        let query = LibraryQuery {
            page: Some(2),
            limit: Some(3),
            ..Default::default()
        };
        let (items, total) = query.select(&library());
        assert_eq!(total, 4);
        assert_eq!(items.len(), 1);

        let beyond = LibraryQuery {
            page: Some(9),
            limit: Some(3),
            ..Default::default()
        };
        assert!(beyond.select(&library()).0.is_empty());
    }

    #[test]
    fn test_search_item_flattens_entry() {
        let item = SearchItem {
            entry: entry("a.mp4", 1, 0),
            processed: true,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["path"], "a.mp4");
        assert_eq!(json["processed"], true);
        assert!(json.get("modifiedAt").is_some());
    }
}
