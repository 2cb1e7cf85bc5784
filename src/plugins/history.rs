//! /history plugin.

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::error;

use crate::bot::{AppState, ThrottledBot};
use crate::database::HistoryRecord;
use crate::quota::QuotaClock;
use crate::texts;
use crate::utils::{html_escape, truncate_chars};

const HISTORY_LIMIT: usize = 5;
const PREVIEW_CHARS: usize = 40;

/// Show the caller's most recent translations.
pub async fn history_handler(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let text = match state.store.recent_history(user.id.0, HISTORY_LIMIT).await {
        Ok(entries) if entries.is_empty() => texts::HISTORY_EMPTY.to_string(),
        Ok(entries) => history_text(&entries, &state.clock),
        Err(e) => {
            error!("Failed to load history for {}: {}", user.id, e);
            texts::GENERIC_FAILURE.to_string()
        }
    };

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}

pub fn history_text(entries: &[HistoryRecord], clock: &QuotaClock) -> String {
    let mut out = String::from("📜 <b>最近的翻译</b>\n");
    for entry in entries {
        out.push_str(&format!(
            "\n🕒 {}\n🇨🇳 {}\n🇱🇦 {}\n",
            clock.local(entry.timestamp).format("%m-%d %H:%M"),
            html_escape(&truncate_chars(&entry.source_text, PREVIEW_CHARS)),
            html_escape(&truncate_chars(&entry.translated_text, PREVIEW_CHARS)),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, TimeZone, Utc};

    use super::*;

    #[test]
    fn test_history_text_uses_local_time() {
        let clock = QuotaClock::new(7, NaiveTime::MIN);
        let mut entry = HistoryRecord::new(1, "你好", "ສະບາຍດີ");
        entry.timestamp = Utc.with_ymd_and_hms(2026, 10, 18, 20, 5, 0).unwrap();

        let text = history_text(&[entry], &clock);
        assert!(text.contains("10-19 03:05"));
        assert!(text.contains("🇨🇳 你好"));
        assert!(text.contains("🇱🇦 ສະບາຍດີ"));
    }

    #[test]
    fn test_history_text_truncates_long_entries() {
        let clock = QuotaClock::new(0, NaiveTime::MIN);
        let entry = HistoryRecord::new(1, "字".repeat(60), "<b>");

        let text = history_text(&[entry], &clock);
        assert!(text.contains('…'));
        assert!(!text.contains(&"字".repeat(41)));
        assert!(text.contains("&lt;b&gt;"));
    }
}
