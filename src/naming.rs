//! Turning remote titles and URLs into local names.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CmsError, Result};

const RESERVED: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

static COURSE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/content/(\d+)").expect("COURSE_ID is a valid regex"));

/// Make a title safe to use as a single path segment.
pub fn sanitize(title: &str) -> String {
    title
        .chars()
        .map(|c| if RESERVED.contains(&c) { '_' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Percent-decoded last path segment of a resource URL, query stripped.
///
/// Returns `None` when the URL is empty or ends in `/`, `.` or `..`.
/// Invalid UTF-8 escapes decode to U+FFFD.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let bytes = urlencoding::decode_binary(path.as_bytes());
    let decoded = String::from_utf8_lossy(&bytes);
    match decoded.rsplit('/').next().unwrap_or_default() {
        "" | "." | ".." => None,
        segment => Some(segment.to_string()),
    }
}

/// Numeric course id from a course content URL such as
/// `https://lms.example/d2l/le/content/12345/Home`.
pub fn course_id_from_url(course_url: &str) -> Result<String> {
    COURSE_ID
        .captures(course_url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| CmsError::Input(format!("could not find course id in {course_url}")))
}
