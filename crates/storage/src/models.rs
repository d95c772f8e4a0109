use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Metadata kept in the index for one stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub original_name: String,
    pub stored_name: String,
    pub size: u64,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub modified: DateTime<Utc>,
    pub path: String,
    #[serde(default)]
    pub mimetype: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl FileRecord {
    /// True when the record carries at least one of `tags`.
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|t| self.tags.contains(t))
    }

    /// Union `tags` into the record, returning how many were new.
    pub fn extend_tags<I>(&mut self, tags: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let before = self.tags.len();
        self.tags.extend(tags);
        self.tags.len() - before
    }
}

/// Accepts RFC 3339 and the naive ISO-8601 form older indexes were written with.
pub mod timestamp {
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        // Naive values were produced in local time.
        let naive = raw.parse::<NaiveDateTime>().ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|ts| ts.with_timezone(&Utc))
    }
}
