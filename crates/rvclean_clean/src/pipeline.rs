//! Fixed, ordered cleaning pipeline over a combined table.
//!
//! Every step only runs when the column(s) it reads are present.

use std::collections::{BTreeMap, BTreeSet};

use rvclean_io_xlsx::EnumCellValue;
use tracing::{debug, info, warn};

use crate::conf::{
    C_COL_CONTENT, C_COL_PUBLISHED, C_COL_SENTIMENT, C_COL_SOURCE_TYPE, C_COL_TAGS_CUSTOMER,
    C_COL_TAGS_MARKING, C_COL_TITLE, C_COL_URL,
};
use crate::report::ReportClean;
use crate::spec::{CleanError, EnumCleanStep, SpecCleanOptions, SpecSentimentLabel};
use crate::table::Table;
use crate::util::{normalize_header_name, parse_date_text, split_tag_pairs, truncate_chars};

/// Run every step in order and return the cleaned table.
pub fn clean_table(
    mut table: Table,
    options: &SpecCleanOptions,
) -> Result<(Table, ReportClean), CleanError> {
    let mut report = ReportClean {
        n_rows_input: table.height(),
        ..Default::default()
    };

    if normalize_published(&mut table) {
        report.steps_applied.push(EnumCleanStep::NormalizePublished);
    }
    if let Some(n_dropped) = filter_marking(&mut table, &options.marking_keyword) {
        report.steps_applied.push(EnumCleanStep::FilterMarking);
        report.rows_dropped.push((EnumCleanStep::FilterMarking, n_dropped));
    }
    if let Some(n_dropped) = filter_hidden(&mut table, &options.hide_keyword) {
        report.steps_applied.push(EnumCleanStep::FilterHidden);
        report.rows_dropped.push((EnumCleanStep::FilterHidden, n_dropped));
    }
    if merge_title_into_content(&mut table, options.len_text_max)? {
        report.steps_applied.push(EnumCleanStep::MergeContent);
    }
    if truncate_url(&mut table, options.len_text_max) {
        report.steps_applied.push(EnumCleanStep::TruncateUrl);
    }
    if relabel_sentiment(&mut table, &options.sentiment_labels) {
        report.steps_applied.push(EnumCleanStep::RelabelSentiment);
    }
    if relabel_source_type(&mut table, &options.source_type_labels) {
        report.steps_applied.push(EnumCleanStep::RelabelSourceType);
    }
    if let Some(l_cols_added) = expand_customer_tags(&mut table)? {
        report.steps_applied.push(EnumCleanStep::ExpandTags);
        report.columns_added = l_cols_added;
    }
    report.warnings.extend(normalize_headers(&mut table)?);
    report.steps_applied.push(EnumCleanStep::NormalizeHeaders);

    report.n_rows_output = table.height();
    info!("{report}");
    Ok((table, report))
}

////////////////////////////////////////////////////////////////////////////////
// #region RowFilters

/// Keep rows whose `tags_marking` text contains `keyword`.
pub fn filter_marking(table: &mut Table, keyword: &str) -> Option<usize> {
    let n_dropped = table.retain_rows_by(C_COL_TAGS_MARKING, |value| {
        value.as_str().is_some_and(|c_text| c_text.contains(keyword))
    })?;
    debug!(dropped = n_dropped, "filter_marking");
    Some(n_dropped)
}

/// Drop rows whose `tags_customer` text contains `keyword`.
pub fn filter_hidden(table: &mut Table, keyword: &str) -> Option<usize> {
    let n_dropped = table.retain_rows_by(C_COL_TAGS_CUSTOMER, |value| {
        !value.as_str().is_some_and(|c_text| c_text.contains(keyword))
    })?;
    debug!(dropped = n_dropped, "filter_hidden");
    Some(n_dropped)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ValueRewrites

/// `published` timestamps (cells or parseable text) become dates.
pub fn normalize_published(table: &mut Table) -> bool {
    table.map_column(C_COL_PUBLISHED, |value| match value {
        EnumCellValue::DateTime(dt) => EnumCellValue::Date(dt.date()),
        EnumCellValue::String(c_text) => match parse_date_text(c_text) {
            Some(date) => EnumCellValue::Date(date),
            None => value.clone(),
        },
        _ => value.clone(),
    })
}

/// `content = title + " " + content`, truncated. Needs both columns.
pub fn merge_title_into_content(table: &mut Table, n_len_max: usize) -> Result<bool, CleanError> {
    let (Some(l_titles), Some(l_contents)) = (
        table.column_values(C_COL_TITLE),
        table.column_values(C_COL_CONTENT),
    ) else {
        return Ok(false);
    };
    let l_merged: Vec<EnumCellValue> = l_titles
        .iter()
        .zip(l_contents.iter())
        .map(|(title, content)| {
            let c_merged = format!("{} {}", title.to_text(), content.to_text());
            EnumCellValue::String(truncate_chars(&c_merged, n_len_max))
        })
        .collect();
    table.set_column(C_COL_CONTENT, l_merged)?;
    Ok(true)
}

/// Truncate `url` text; other cell kinds pass through.
pub fn truncate_url(table: &mut Table, n_len_max: usize) -> bool {
    table.map_column(C_COL_URL, |value| match value {
        EnumCellValue::String(c_text) => EnumCellValue::String(truncate_chars(c_text, n_len_max)),
        _ => value.clone(),
    })
}

/// Numeric sentiment codes to labels; unmatched values pass through.
pub fn relabel_sentiment(table: &mut Table, labels: &[SpecSentimentLabel]) -> bool {
    table.map_column(C_COL_SENTIMENT, |value| {
        let Some(n_code) = value.as_f64() else {
            return value.clone();
        };
        labels
            .iter()
            .find(|label| label.code as f64 == n_code)
            .map(|label| EnumCellValue::String(label.label.clone()))
            .unwrap_or_else(|| value.clone())
    })
}

/// Exact-match source-type lookup; unmatched values pass through.
pub fn relabel_source_type(table: &mut Table, labels: &BTreeMap<String, String>) -> bool {
    table.map_column(C_COL_SOURCE_TYPE, |value| {
        value
            .as_str()
            .and_then(|c_code| labels.get(c_code))
            .map(|c_label| EnumCellValue::String(c_label.clone()))
            .unwrap_or_else(|| value.clone())
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnRewrites

/// Expand `head/value` tags into one column per head.
///
/// Returns the heads in first-appearance order, or `None` without
/// `tags_customer`. A head naming an existing column overwrites it.
pub fn expand_customer_tags(table: &mut Table) -> Result<Option<Vec<String>>, CleanError> {
    if !table.map_column(C_COL_TAGS_CUSTOMER, |value| {
        EnumCellValue::String(value.to_text())
    }) {
        return Ok(None);
    }
    let l_texts: Vec<String> = table
        .column_values(C_COL_TAGS_CUSTOMER)
        .unwrap_or_default()
        .into_iter()
        .map(EnumCellValue::to_text)
        .collect();

    let mut l_heads: Vec<String> = Vec::new();
    let mut set_heads: BTreeSet<&str> = BTreeSet::new();
    for c_text in &l_texts {
        for (c_head, _) in split_tag_pairs(c_text) {
            if set_heads.insert(c_head) {
                l_heads.push(c_head.to_string());
            }
        }
    }

    for c_head in &l_heads {
        let l_values: Vec<EnumCellValue> = l_texts
            .iter()
            .map(|c_text| {
                let l_matched: Vec<&str> = split_tag_pairs(c_text)
                    .filter(|(c_tag_head, c_value)| {
                        *c_tag_head == c_head.as_str() && !c_value.is_empty()
                    })
                    .map(|(_, c_value)| c_value)
                    .collect();
                EnumCellValue::String(l_matched.join(", "))
            })
            .collect();
        table.set_column(c_head, l_values)?;
    }
    debug!(heads = ?l_heads, "expand_customer_tags");
    Ok(Some(l_heads))
}

/// Normalize every header; collisions get `_2`, `_3`, ... and a warning.
pub fn normalize_headers(table: &mut Table) -> Result<Vec<String>, CleanError> {
    let mut l_warnings = Vec::new();
    let mut set_used: BTreeSet<String> = BTreeSet::new();
    let mut l_names = Vec::with_capacity(table.width());

    for c_name in table.columns() {
        let c_base = normalize_header_name(c_name);
        let mut c_candidate = c_base.clone();
        let mut n_suffix = 2;
        while set_used.contains(&c_candidate) {
            c_candidate = format!("{c_base}_{n_suffix}");
            n_suffix += 1;
        }
        if c_candidate != c_base {
            let c_msg = format!(
                "Column {c_name:?} normalizes to existing name {c_base:?}; renamed to {c_candidate:?}."
            );
            warn!("{c_msg}");
            l_warnings.push(c_msg);
        }
        set_used.insert(c_candidate.clone());
        l_names.push(c_candidate);
    }

    table.set_column_names(l_names)?;
    Ok(l_warnings)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::conf::derive_default_clean_options;

    fn s(v: &str) -> EnumCellValue {
        EnumCellValue::String(v.to_string())
    }

    fn table(columns: &[&str], rows: Vec<Vec<EnumCellValue>>) -> Table {
        Table::new(columns.iter().map(|c| c.to_string()).collect(), rows).expect("table")
    }

    #[test]
    fn test_filter_marking_keeps_only_checked_text() {
        let mut t = table(
            &["tags_marking"],
            vec![
                vec![s("pending")],
                vec![s("checked,verified")],
                vec![EnumCellValue::None],
                vec![EnumCellValue::Number(1.0)],
            ],
        );
        assert_eq!(filter_marking(&mut t, "checked"), Some(3));
        assert_eq!(t.rows(), &[vec![s("checked,verified")]][..]);
    }

    #[test]
    fn test_filter_hidden_keeps_nulls_and_other_tags() {
        let mut t = table(
            &["tags_customer"],
            vec![
                vec![s("Hide/hide")],
                vec![s("Category/news")],
                vec![EnumCellValue::None],
            ],
        );
        assert_eq!(filter_hidden(&mut t, "Hide/hide"), Some(1));
        assert_eq!(t.height(), 2);
        assert_eq!(t.cell(0, "tags_customer"), Some(&s("Category/news")));
    }

    #[test]
    fn test_filters_are_skipped_without_their_column() {
        let mut t = table(&["url"], vec![vec![s("x")]]);
        assert_eq!(filter_marking(&mut t, "checked"), None);
        assert_eq!(filter_hidden(&mut t, "Hide/hide"), None);
        assert_eq!(t.height(), 1);
    }

    #[test]
    fn test_normalize_published_drops_time_of_day() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(23, 59, 1))
            .expect("dt");
        let mut t = table(
            &["published"],
            vec![
                vec![EnumCellValue::DateTime(dt)],
                vec![s("2024-03-09 08:00:00")],
                vec![s("n/a")],
            ],
        );
        assert!(normalize_published(&mut t));
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).expect("date");
        assert_eq!(t.cell(0, "published"), Some(&EnumCellValue::Date(date)));
        assert_eq!(t.cell(1, "published"), Some(&EnumCellValue::Date(date)));
        assert_eq!(t.cell(2, "published"), Some(&s("n/a")));
    }

    #[test]
    fn test_merge_title_into_content_truncates() {
        let mut t = table(
            &["title", "content"],
            vec![
                vec![s("Head"), s(&"x".repeat(800))],
                vec![EnumCellValue::None, s("body")],
            ],
        );
        assert_eq!(merge_title_into_content(&mut t, 750), Ok(true));
        let c_first = t.cell(0, "content").and_then(EnumCellValue::as_str).expect("text");
        assert_eq!(c_first.chars().count(), 750);
        assert!(c_first.starts_with("Head xxx"));
        assert_eq!(t.cell(1, "content"), Some(&s(" body")));

        let mut t_only_content = table(&["content"], vec![vec![s("body")]]);
        assert_eq!(merge_title_into_content(&mut t_only_content, 750), Ok(false));
        assert_eq!(t_only_content.cell(0, "content"), Some(&s("body")));
    }

    #[test]
    fn test_truncate_url_leaves_non_text() {
        let mut t = table(
            &["url"],
            vec![vec![s(&"u".repeat(760))], vec![EnumCellValue::Number(3.0)]],
        );
        assert!(truncate_url(&mut t, 750));
        assert_eq!(t.cell(0, "url").map(|v| v.to_text().len()), Some(750));
        assert_eq!(t.cell(1, "url"), Some(&EnumCellValue::Number(3.0)));
    }

    #[test]
    fn test_relabel_sentiment_maps_known_codes_only() {
        let options = derive_default_clean_options();
        let mut t = table(
            &["sentiment"],
            vec![
                vec![EnumCellValue::Number(5.0)],
                vec![EnumCellValue::Number(0.0)],
                vec![EnumCellValue::Number(-5.0)],
                vec![EnumCellValue::Number(3.0)],
                vec![s("5")],
            ],
        );
        assert!(relabel_sentiment(&mut t, &options.sentiment_labels));
        let l_values: Vec<_> = t.rows().iter().map(|row| row[0].clone()).collect();
        assert_eq!(
            l_values,
            vec![
                s("Positive"),
                s("Neutral"),
                s("Negative"),
                EnumCellValue::Number(3.0),
                s("5")
            ]
        );
    }

    #[test]
    fn test_relabel_source_type_exact_match() {
        let options = derive_default_clean_options();
        let mut t = table(
            &["source_type"],
            vec![
                vec![s("SOCIALMEDIA,SOCIALMEDIA_TWITTER")],
                vec![s("MESSAGEBOARD,MESSAGEBOARD_REDDIT")],
                vec![s("socialmedia,socialmedia_twitter")],
            ],
        );
        assert!(relabel_source_type(&mut t, &options.source_type_labels));
        assert_eq!(t.cell(0, "source_type"), Some(&s("X")));
        assert_eq!(t.cell(1, "source_type"), Some(&s("Webboard")));
        assert_eq!(t.cell(2, "source_type"), Some(&s("socialmedia,socialmedia_twitter")));
    }

    #[test]
    fn test_expand_customer_tags_two_pass() {
        let mut t = table(
            &["tags_customer"],
            vec![
                vec![s("category/news, type/post")],
                vec![s("category/a,category/b")],
                vec![EnumCellValue::None],
            ],
        );
        let l_heads = expand_customer_tags(&mut t).expect("expand").expect("applied");
        assert_eq!(l_heads, vec!["category".to_string(), "type".to_string()]);
        assert_eq!(t.cell(0, "category"), Some(&s("news")));
        assert_eq!(t.cell(0, "type"), Some(&s("post")));
        assert_eq!(t.cell(1, "category"), Some(&s("a, b")));
        assert_eq!(t.cell(1, "type"), Some(&s("")));
        assert_eq!(t.cell(2, "tags_customer"), Some(&s("")));
        assert_eq!(t.cell(2, "category"), Some(&s("")));
    }

    #[test]
    fn test_expand_customer_tags_overwrites_existing_column() {
        let mut t = table(
            &["tags_customer", "category"],
            vec![vec![s("category/news"), s("old")]],
        );
        expand_customer_tags(&mut t).expect("expand");
        assert_eq!(t.width(), 2);
        assert_eq!(t.cell(0, "category"), Some(&s("news")));
    }

    #[test]
    fn test_normalize_headers_resolves_collisions_and_is_idempotent() {
        let mut t = table(&[" Extra Name", "Category", "category"], vec![]);
        let l_warnings = normalize_headers(&mut t).expect("normalize");
        assert_eq!(l_warnings.len(), 1);
        let l_once = t.columns().to_vec();
        assert_eq!(l_once, vec!["extra_name", "category", "category_2"]);

        let l_warnings = normalize_headers(&mut t).expect("normalize");
        assert!(l_warnings.is_empty());
        assert_eq!(t.columns(), &l_once[..]);
    }

    #[test]
    fn test_clean_table_reports_applied_steps() {
        let options = derive_default_clean_options();
        let t = table(
            &["Tags Marking", "tags_marking", "url"],
            vec![
                vec![s("x"), s("checked"), s("u1")],
                vec![s("y"), s("pending"), s("u2")],
            ],
        );
        let (t, report) = clean_table(t, &options).expect("clean");
        assert_eq!(t.height(), 1);
        assert_eq!(t.columns(), &["tags_marking", "tags_marking_2", "url"][..]);
        assert_eq!(
            report.steps_applied,
            vec![
                EnumCleanStep::FilterMarking,
                EnumCleanStep::TruncateUrl,
                EnumCleanStep::NormalizeHeaders
            ]
        );
        assert_eq!(report.n_rows_input, 2);
        assert_eq!(report.n_rows_output, 1);
        assert_eq!(report.warnings.len(), 1);
    }
}
