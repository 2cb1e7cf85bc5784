//! Utility functions.
//!
//! Collection of helper functions used across the bot.

/// Escape text for Telegram HTML parse mode.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Length in characters, which is what the per-request limit counts.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Cut `s` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if char_len(s) <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Format a duration as hours and minutes in Chinese.
pub fn format_duration_zh(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    match (hours, mins) {
        (0, 0) => "不到 1 分钟".to_string(),
        (0, m) => format!("{} 分钟", m),
        (h, 0) => format!("{} 小时", h),
        (h, m) => format!("{} 小时 {} 分钟", h, m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<b>&</b>"), "&lt;b&gt;&amp;&lt;/b&gt;");
    }

    #[test]
    fn test_char_len_counts_chinese_as_one() {
        assert_eq!(char_len("你好世界"), 4);
        assert_eq!(char_len("ສະບາຍດີ"), 7);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("你好", 5), "你好");
        assert_eq!(truncate_chars("一二三四五六", 4), "一二三…");
    }

    #[test]
    fn test_format_duration_zh() {
        assert_eq!(format_duration_zh(30), "不到 1 分钟");
        assert_eq!(format_duration_zh(3600), "1 小时");
        assert_eq!(format_duration_zh(3660), "1 小时 1 分钟");
        assert_eq!(format_duration_zh(600), "10 分钟");
    }
}
