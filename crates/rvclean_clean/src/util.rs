//! Stateless text, date and file-name helpers shared by the pipeline.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::spec::EnumFileKind;

////////////////////////////////////////////////////////////////////////////////
// #region FileKind

/// Reader for `file_name`, by case-insensitive extension.
pub fn derive_file_kind(file_name: &str) -> Option<EnumFileKind> {
    let c_ext = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    match c_ext.as_str() {
        "csv" => Some(EnumFileKind::Csv),
        "xlsx" | "xls" => Some(EnumFileKind::Workbook),
        _ => None,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TextUtils

/// First `n_len_max` characters of `text` (char-, not byte-based).
pub fn truncate_chars(text: &str, n_len_max: usize) -> String {
    match text.char_indices().nth(n_len_max) {
        Some((n_byte_end, _)) => text[..n_byte_end].to_string(),
        None => text.to_string(),
    }
}

/// Trim, lowercase, spaces to underscores.
pub fn normalize_header_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// `(head, value)` pairs of a `head/value, head/value` tag string.
///
/// Segments without `/` or with a blank head are skipped; values may be empty.
pub fn split_tag_pairs(text: &str) -> impl Iterator<Item = (&str, &str)> {
    text.split(',').filter_map(|c_segment| {
        let (c_head, c_value) = c_segment.split_once('/')?;
        let c_head = c_head.trim();
        if c_head.is_empty() {
            return None;
        }
        Some((c_head, c_value.trim()))
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DateUtils

const TUP_DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Calendar date of a timestamp-like text, `None` when it does not parse.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let c_text = text.trim();
    if c_text.is_empty() {
        return None;
    }
    for c_fmt in TUP_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(c_text, c_fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(c_text) {
        return Some(dt.naive_local().date());
    }
    NaiveDate::parse_from_str(c_text, "%Y-%m-%d").ok()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_file_kind_is_case_insensitive() {
        assert_eq!(derive_file_kind("a.CSV"), Some(EnumFileKind::Csv));
        assert_eq!(derive_file_kind("dir/b.Xlsx"), Some(EnumFileKind::Workbook));
        assert_eq!(derive_file_kind("c.xls"), Some(EnumFileKind::Workbook));
        assert_eq!(derive_file_kind("d.txt"), None);
        assert_eq!(derive_file_kind("noext"), None);
    }

    #[test]
    fn test_truncate_chars_keeps_prefix_and_bound() {
        let c_text = "ก".repeat(800);
        let c_cut = truncate_chars(&c_text, 750);
        assert_eq!(c_cut.chars().count(), 750);
        assert!(c_text.starts_with(&c_cut));
        assert_eq!(truncate_chars("short", 750), "short");
    }

    #[test]
    fn test_normalize_header_name_is_idempotent() {
        let c_once = normalize_header_name("  Extra Source Name ");
        assert_eq!(c_once, "extra_source_name");
        assert_eq!(normalize_header_name(&c_once), c_once);
    }

    #[test]
    fn test_split_tag_pairs_skips_headless_segments() {
        let l_pairs: Vec<_> = split_tag_pairs("category/news, type/post,plain,/x, url/http://a/b")
            .collect();
        assert_eq!(
            l_pairs,
            vec![
                ("category", "news"),
                ("type", "post"),
                ("url", "http://a/b")
            ]
        );
    }

    #[test]
    fn test_parse_date_text_accepts_common_timestamp_shapes() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5);
        assert_eq!(parse_date_text("2024-01-05 10:11:12"), date);
        assert_eq!(parse_date_text("2024-01-05T10:11:12.250"), date);
        assert_eq!(parse_date_text("2024-01-05T10:11:12+07:00"), date);
        assert_eq!(parse_date_text("05/01/2024 10:11"), date);
        assert_eq!(parse_date_text("2024-01-05"), date);
        assert_eq!(parse_date_text("yesterday"), None);
    }
}
