//! Text formatting shared by the CLI output and the browse screen.

use chrono::{DateTime, Local, Utc};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::domain::entities::ImageRecord;

const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

/// Formats a byte count with a binary unit.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Formats an upload date in local time, or a dash when absent.
#[must_use]
pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map_or_else(
        || "-".to_string(),
        |d| d.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    )
}

/// Cuts `text` to at most `max_width` terminal columns, ending in `…` when cut.
#[must_use]
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut width = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > max_width - 1 {
            break;
        }
        out.push(c);
        width += w;
    }
    out.push('…');
    out
}

/// Joins tags as `#a #b`.
#[must_use]
pub fn format_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| format!("#{t}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One-line summary of a record for plain output.
#[must_use]
pub fn record_line(record: &ImageRecord) -> String {
    let mut line = format!(
        "{:<26} {:<32} {:>10}  {}",
        record.id,
        truncate_to_width(&record.title, 32),
        format_size(record.size),
        format_date(record.upload_date),
    );
    if !record.tags.is_empty() {
        line.push_str("  ");
        line.push_str(&format_tags(&record.tags));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, "0 B" ; "zero")]
    #[test_case(1023, "1023 B" ; "below_kib")]
    #[test_case(1536, "1.5 KiB" ; "kib")]
    #[test_case(2 * 1024 * 1024, "2.0 MiB" ; "mib")]
    fn test_format_size(bytes: u64, expected: &str) {
        assert_eq!(format_size(bytes), expected);
    }

    #[test]
    fn test_truncate_respects_wide_characters() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefgh", 5), "abcd…");
        let cut = truncate_to_width("日本語のタイトル", 7);
        assert!(cut.width() <= 7);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_format_tags() {
        assert_eq!(format_tags(&["a".to_string(), "b".to_string()]), "#a #b");
        assert_eq!(format_date(None), "-");
    }
}
