use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Create a simple ASCII progress bar
pub fn progress_bar(filled: u32, total: u32, width: usize) -> String {
    if total == 0 {
        return "░".repeat(width);
    }
    let ratio = (filled as f64 / total as f64).min(1.0);
    let filled_count = (ratio * width as f64).round() as usize;
    let empty_count = width.saturating_sub(filled_count);
    format!("{}{}", "█".repeat(filled_count), "░".repeat(empty_count))
}

/// Percent with one decimal, trimming ".0"
pub fn format_percent(pct: f64) -> String {
    if pct == pct.floor() {
        format!("{}%", pct as i64)
    } else {
        format!("{:.1}%", pct)
    }
}

/// "3" for a single part, "4-6" for a run.
pub fn format_part_range(first: u32, last: u32) -> String {
    if first == last {
        first.to_string()
    } else {
        format!("{}-{}", first, last)
    }
}

/// Cut `s` to at most `max` terminal columns, ending with "…" when cut.
pub fn truncate_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Right-pad to `width` columns.
pub fn pad_width(s: &str, width: usize) -> String {
    let w = s.width();
    if w >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - w))
    }
}

/// Date part of a stored timestamp.
pub fn short_date(ts: &str) -> &str {
    ts.get(..10).unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(15, 30, 10), "█████░░░░░");
        assert_eq!(progress_bar(0, 0, 4), "░░░░");
    }

    #[test]
    fn truncate_respects_wide_chars() {
        assert_eq!(truncate_width("Ramadan", 10), "Ramadan");
        assert_eq!(truncate_width("Ramadan khatma", 8), "Ramadan…");
        let cut = truncate_width("漢字漢字漢字", 5);
        assert!(cut.width() <= 5);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn part_ranges() {
        assert_eq!(format_part_range(4, 4), "4");
        assert_eq!(format_part_range(1, 8), "1-8");
        assert_eq!(format_percent(50.0), "50%");
        assert_eq!(format_percent(33.333), "33.3%");
    }
}
