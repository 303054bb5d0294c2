//! Shared remote path generation.
//!
//! Path format: `{base}/{YYYY-MM-DD}/{owner_id}/{submission_id}/{sanitized_file_name}`,
//! where the date is the UTC calendar day the path was generated on.

use chrono::{NaiveDate, Utc};

/// Generate the remote path for an uploaded file, dated today (UTC).
///
/// Deterministic for identical inputs within one calendar day. Unique only as
/// far as `submission_id` is unique per owner per day.
pub fn generate_remote_path(
    base: &str,
    owner_id: &str,
    submission_id: &str,
    original_file_name: &str,
) -> String {
    generate_remote_path_for_date(
        base,
        Utc::now().date_naive(),
        owner_id,
        submission_id,
        original_file_name,
    )
}

/// Same as [`generate_remote_path`] with an explicit calendar day.
pub fn generate_remote_path_for_date(
    base: &str,
    date: NaiveDate,
    owner_id: &str,
    submission_id: &str,
    original_file_name: &str,
) -> String {
    format!(
        "{}/{}/{}/{}/{}",
        base.trim_end_matches('/'),
        date.format("%Y-%m-%d"),
        owner_id,
        submission_id,
        sanitize_file_name(original_file_name)
    )
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
///
/// One `_` per UTF-16 code unit, so a character outside the Basic
/// Multilingual Plane (most emoji) becomes `__`.
pub fn sanitize_file_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            sanitized.push(c);
        } else {
            sanitized.extend(std::iter::repeat('_').take(c.len_utf16()));
        }
    }
    sanitized
}

/// Directory part of a remote path, with `\` normalised to `/`.
///
/// Returns `/` for top-level paths and `.` for a bare file name.
pub fn remote_parent_dir(remote_path: &str) -> String {
    let normalized = remote_path.replace('\\', "/");
    let trimmed = normalized.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => trimmed[..idx].to_string(),
        None if normalized.starts_with('/') => "/".to_string(),
        None => ".".to_string(),
    }
}

/// Date directory (`{base}/{YYYY-MM-DD}`) that holds all uploads of one day.
pub fn day_directory(base: &str, date: NaiveDate) -> String {
    format!("{}/{}", base.trim_end_matches('/'), date.format("%Y-%m-%d"))
}
