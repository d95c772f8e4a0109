use anyhow::Result;
use filestore_core::{AuditReport, FileRecord};
use std::collections::HashSet;
use std::io::Write;

/// Characters shown by the console's content preview.
pub const PREVIEW_CHARS: usize = 500;

/// Splits comma-separated user input, trimming items and dropping empties.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn format_tags<'a>(tags: impl IntoIterator<Item = &'a String>) -> String {
    let tags: Vec<&str> = tags.into_iter().map(String::as_str).collect();
    format!("[{}]", tags.join(", "))
}

pub fn write_records<W: Write>(out: &mut W, records: &[FileRecord]) -> Result<()> {
    for r in records {
        writeln!(out, "  - {} ({} bytes)", r.stored_name, r.size)?;
        writeln!(out, "    Tags: {}", format_tags(&r.tags))?;
        writeln!(out, "    Path: {}", r.path)?;
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_records_json<W: Write>(
    out: &mut W,
    records: &[FileRecord],
    fields: &[String],
) -> Result<()> {
    let values = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    let filtered = filter_fields(values, fields);
    writeln!(out, "{}", serde_json::to_string_pretty(&filtered)?)?;
    Ok(())
}

pub fn write_audit<W: Write>(out: &mut W, report: &AuditReport) -> Result<()> {
    if report.is_clean() {
        writeln!(out, "index and storage directory agree")?;
        return Ok(());
    }
    for (label, names) in [
        ("missing payload", &report.missing),
        ("not indexed", &report.orphaned),
        ("size changed", &report.size_mismatch),
    ] {
        for name in names {
            writeln!(out, "{label}: {name}")?;
        }
    }
    Ok(())
}

/// Lossy UTF-8 preview of at most `limit` characters.
pub fn preview(content: &[u8], limit: usize) -> (String, bool) {
    let text = String::from_utf8_lossy(content);
    let mut chars = text.chars();
    let shown: String = chars.by_ref().take(limit).collect();
    let truncated = chars.next().is_some();
    (shown, truncated)
}

pub fn filter_fields(mut results: Vec<serde_json::Value>, fields: &[String]) -> Vec<serde_json::Value> {
    if fields.is_empty() {
        return results;
    }
    let want: HashSet<String> = fields.iter().map(|s| s.to_lowercase()).collect();
    for r in results.iter_mut() {
        if let Some(obj) = r.as_object_mut() {
            let mut keep = serde_json::Map::new();
            for (k, v) in obj.iter() {
                if want.contains(&k.to_lowercase()) {
                    keep.insert(k.clone(), v.clone());
                }
            }
            *obj = keep;
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tags_input_is_trimmed_and_empties_dropped() {
        assert_eq!(parse_tags(" a, b ,,c , "), vec!["a", "b", "c"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        let (shown, truncated) = preview("привет".as_bytes(), 3);
        assert_eq!(shown, "при");
        assert!(truncated);
        let (shown, truncated) = preview(b"short", 500);
        assert_eq!(shown, "short");
        assert!(!truncated);
    }

    #[test]
    fn filter_fields_keeps_requested_keys_only() {
        let rows = vec![json!({"stored_name": "a.txt", "size": 1, "path": "/s/a.txt"})];
        let out = filter_fields(rows, &["Stored_Name".to_string(), "size".to_string()]);
        assert_eq!(out[0], json!({"stored_name": "a.txt", "size": 1}));
    }
}
