//! Utility functions for text normalization, truncation and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Whitespace collapsing and excerpt truncation for scraped article text
//! - String truncation for log previews
//! - Capitalization for keyboard labels
//! - File system validation for the dialog log directory

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Maximum length, in characters, of a scraped article excerpt.
pub const EXCERPT_MAX_CHARS: usize = 500;

/// Marker appended to excerpts cut at [`EXCERPT_MAX_CHARS`].
pub const TRUNCATION_MARKER: &str = "...";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Collapse every run of whitespace into a single space and trim both ends.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(collapse_whitespace("  a \n\n b\t"), "a b");
/// ```
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// Cap an excerpt at [`EXCERPT_MAX_CHARS`] characters.
///
/// Text longer than the cap keeps exactly the first 500 characters followed
/// by [`TRUNCATION_MARKER`]; shorter text is returned unchanged. Lengths are
/// counted in `char`s, so multi-byte (e.g. Cyrillic) text is never split
/// inside a code point.
pub fn truncate_excerpt(s: &str) -> String {
    match s.char_indices().nth(EXCERPT_MAX_CHARS) {
        Some((cut, _)) => format!("{}{}", &s[..cut], TRUNCATION_MARKER),
        None => s.to_string(),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
        None => s.to_string(),
    }
}

/// Capitalize the first character of a string.
///
/// Used for category button labels (e.g. "science" -> "Science").
pub fn upcase(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Log directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
