//! Cleaning constants and default option factories.

use crate::spec::{SpecCleanOptions, SpecSentimentLabel};

/// Max characters kept in `content` and `url`.
pub const N_LEN_TEXT_MAX: usize = 750;
/// Rows shown in the preview.
pub const N_ROWS_PREVIEW_MAX: usize = 20;
/// Substring required in `tags_marking`.
pub const C_MARKING_KEYWORD: &str = "checked";
/// Substring in `tags_customer` that hides a row.
pub const C_HIDE_KEYWORD: &str = "Hide/hide";
/// Export worksheet name.
pub const C_EXPORT_SHEET_NAME: &str = "cleaned";
/// Export download name.
pub const C_EXPORT_FILE_NAME: &str = "filtered_cleaned_files.xlsx";

pub const C_COL_PUBLISHED: &str = "published";
pub const C_COL_TAGS_MARKING: &str = "tags_marking";
pub const C_COL_TAGS_CUSTOMER: &str = "tags_customer";
pub const C_COL_CONTENT: &str = "content";
pub const C_COL_TITLE: &str = "title";
pub const C_COL_URL: &str = "url";
pub const C_COL_SENTIMENT: &str = "sentiment";
pub const C_COL_SOURCE_TYPE: &str = "source_type";

/// Sentiment code labels.
pub const TUP_SENTIMENT_LABELS: [(i64, &str); 3] =
    [(5, "Positive"), (0, "Neutral"), (-5, "Negative")];

/// Source-type code labels.
pub const TUP_SOURCE_TYPE_LABELS: [(&str, &str); 16] = [
    ("SOCIALMEDIA,SOCIALMEDIA_TWITTER", "X"),
    ("SOCIALMEDIA,SOCIALMEDIA_FACEBOOK", "Facebook"),
    ("SOCIALMEDIA,SOCIALMEDIA_YOUTUBE", "Youtube"),
    ("SOCIALMEDIA,SOCIALMEDIA_INSTAGRAM", "Instagram"),
    ("ONLINENEWS,ONLINENEWS_OTHER", "Website"),
    ("ONLINENEWS,ONLINENEWS_NEWSPAPER", "Website"),
    ("BLOG,BLOG_OTHER", "Website"),
    ("ONLINENEWS,ONLINENEWS_PRESSRELEASES", "Website"),
    ("ONLINENEWS,ONLINENEWS_BLOG", "Website"),
    ("ONLINENEWS,ONLINENEWS_TVRADIO", "Website"),
    ("ONLINENEWS,ONLINENEWS_MAGAZINE", "Website"),
    ("SOCIALMEDIA,SOCIALMEDIA_LINEOA", "Website"),
    ("PODCAST,PODCAST_OTHER", "Website"),
    ("MESSAGEBOARD,MESSAGEBOARD_OTHER", "Webboard"),
    ("MESSAGEBOARD,MESSAGEBOARD_REDDIT", "Webboard"),
    ("ONLINENEWS,ONLINENEWS_AGENCY", "Website"),
];

/// Columns checked by default in the selector.
pub const TUP_COLUMNS_DEFAULT_CHECKED: [&str; 8] = [
    "url",
    "published",
    "content",
    "sentiment",
    "source_type",
    "category",
    "extra_source_attributes.name",
    "engagement",
];

/// Default display names.
pub const TUP_COLUMN_NAMES_DEFAULT: [(&str, &str); 4] = [
    ("published", "date"),
    ("source_type", "channel"),
    ("extra_source_attributes.name", "username"),
    ("engagement", "total_engagement"),
];

/// Build the canonical cleaning options.
pub fn derive_default_clean_options() -> SpecCleanOptions {
    SpecCleanOptions {
        len_text_max: N_LEN_TEXT_MAX,
        marking_keyword: C_MARKING_KEYWORD.to_string(),
        hide_keyword: C_HIDE_KEYWORD.to_string(),
        sentiment_labels: TUP_SENTIMENT_LABELS
            .iter()
            .map(|(code, label)| SpecSentimentLabel {
                code: *code,
                label: label.to_string(),
            })
            .collect(),
        source_type_labels: TUP_SOURCE_TYPE_LABELS
            .iter()
            .map(|(code, label)| (code.to_string(), label.to_string()))
            .collect(),
        columns_default_checked: TUP_COLUMNS_DEFAULT_CHECKED
            .iter()
            .map(|c| c.to_string())
            .collect(),
        column_names_default: TUP_COLUMN_NAMES_DEFAULT
            .iter()
            .map(|(col, name)| (col.to_string(), name.to_string()))
            .collect(),
        n_rows_preview_max: N_ROWS_PREVIEW_MAX,
        sheet_name: C_EXPORT_SHEET_NAME.to_string(),
        export_file_name: C_EXPORT_FILE_NAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_carry_every_constant() {
        let options = derive_default_clean_options();
        assert_eq!(options.len_text_max, 750);
        assert_eq!(options.source_type_labels.len(), 16);
        assert_eq!(
            options.source_type_labels["SOCIALMEDIA,SOCIALMEDIA_TWITTER"],
            "X"
        );
        assert_eq!(options.column_names_default["published"], "date");
        assert_eq!(options.sentiment_labels.len(), 3);
        assert_eq!(options, SpecCleanOptions::default());
    }
}
