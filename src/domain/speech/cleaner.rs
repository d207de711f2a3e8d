use serde::{Deserialize, Serialize};

/// Per-request text cleaning switches. All fields are optional in the
/// request body and default to the behavior below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningOptions {
    /// Merge single line breaks (soft wrapping) into spaces. Blank lines are
    /// always kept as paragraph breaks.
    pub merge_soft_breaks: bool,
    /// Remove http/https URLs before synthesis.
    pub strip_urls: bool,
    /// Collapse runs of spaces and tabs into one space.
    pub collapse_whitespace: bool,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            merge_soft_breaks: true,
            strip_urls: false,
            collapse_whitespace: true,
        }
    }
}

/// Normalize raw request text ahead of segmentation.
///
/// Paragraphs (separated by one or more blank lines) survive as exactly one
/// blank line; everything else is normalized according to `options`.
pub fn clean_text(text: &str, options: &CleaningOptions) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");

    let stripped = if options.strip_urls {
        let url_pattern = regex::Regex::new(r"https?://[^\s]+").unwrap();
        url_pattern.replace_all(&unified, "").into_owned()
    } else {
        unified
    };

    let paragraph_pattern = regex::Regex::new(r"\n[ \t]*\n+").unwrap();
    let paragraphs: Vec<String> = paragraph_pattern
        .split(&stripped)
        .map(|paragraph| {
            let merged = if options.merge_soft_breaks {
                paragraph.replace('\n', " ")
            } else {
                paragraph.to_string()
            };
            let collapsed = if options.collapse_whitespace {
                let whitespace_pattern = regex::Regex::new(r"[ \t]+").unwrap();
                whitespace_pattern.replace_all(&merged, " ").into_owned()
            } else {
                merged
            };
            collapsed.trim().to_string()
        })
        .filter(|paragraph| !paragraph.is_empty())
        .collect();

    paragraphs.join("\n\n")
}
