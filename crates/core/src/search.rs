use storage::FileRecord;

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub tags: Vec<String>,
    pub extension: Option<String>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn matches(&self, record: &FileRecord) -> bool {
        let name = record.stored_name.to_lowercase();
        if let Some(q) = self.query.as_deref().filter(|q| !q.is_empty()) {
            if !name.contains(&q.to_lowercase()) {
                return false;
            }
        }
        if !self.tags.is_empty() && !record.has_any_tag(&self.tags) {
            return false;
        }
        if let Some(ext) = self.extension.as_deref().filter(|e| !e.is_empty()) {
            if !name.ends_with(&ext.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(name: &str, tags: &[&str]) -> FileRecord {
        FileRecord {
            original_name: name.to_string(),
            stored_name: name.to_string(),
            size: 1,
            created: Utc::now(),
            modified: Utc::now(),
            path: format!("/s/{name}"),
            mimetype: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(SearchQuery::new().matches(&record("x.bin", &[])));
    }

    #[test]
    fn query_is_case_insensitive_on_stored_name() {
        let q = SearchQuery::new().with_query("RePoRt");
        assert!(q.matches(&record("Quarterly_report.txt", &[])));
        assert!(!q.matches(&record("summary.txt", &["report"])));
    }

    #[test]
    fn tags_match_any_and_combine_with_other_filters() {
        let q = SearchQuery::new().with_tags(["demo", "urgent"]).with_extension(".TXT");
        assert!(q.matches(&record("a.txt", &["urgent"])));
        assert!(!q.matches(&record("a.pdf", &["urgent"])));
        assert!(!q.matches(&record("b.txt", &["Demo"])));
    }
}
