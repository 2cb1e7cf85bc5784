//! Translation plugin.
//!
//! Plain Chinese text from a user with translation switched on.

use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters};

use crate::ai::prompt::Translation;
use crate::bot::{AppState, ThrottledBot};
use crate::texts;
use crate::translation::TranslateOutcome;
use crate::utils::html_escape;

pub async fn translate_handler(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let (Some(text), Some(user)) = (msg.text(), msg.from.as_ref()) else {
        return Ok(());
    };

    let outcome = state
        .translator
        .translate(user.id.0, &user.full_name(), text)
        .await;

    let reply = match outcome {
        TranslateOutcome::Empty => return Ok(()),
        TranslateOutcome::TooLong { max_chars } => texts::too_long(max_chars),
        TranslateOutcome::QuotaExhausted => texts::QUOTA_EXHAUSTED.to_string(),
        TranslateOutcome::Unavailable => texts::AI_UNAVAILABLE.to_string(),
        TranslateOutcome::Failed => texts::GENERIC_FAILURE.to_string(),
        TranslateOutcome::Translated {
            translation,
            remaining,
        } => format_translation(&translation, remaining),
    };

    bot.send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;

    Ok(())
}

/// Render a translation as HTML.
pub fn format_translation(translation: &Translation, remaining: u32) -> String {
    let mut out = format!("🇱🇦 <b>{}</b>", html_escape(&translation.lao));

    if !translation.romanization.trim().is_empty() {
        out.push_str(&format!("\n🔤 <i>{}</i>", html_escape(&translation.romanization)));
    }
    if let Some(note) = translation.note.as_deref().filter(|n| !n.trim().is_empty()) {
        out.push_str(&format!("\n📝 {}", html_escape(note)));
    }

    out.push_str(&format!("\n\n今日剩余次数：{}", remaining));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_translation_escapes_and_skips_empty_parts() {
        let t = Translation {
            lao: "ສະບາຍດີ <3".to_string(),
            romanization: String::new(),
            note: Some("  ".to_string()),
        };
        let out = format_translation(&t, 2);

        assert!(out.contains("<b>ສະບາຍດີ &lt;3</b>"));
        assert!(!out.contains("🔤"));
        assert!(!out.contains("📝"));
        assert!(out.ends_with("今日剩余次数：2"));
    }

    #[test]
    fn test_format_translation_full() {
        let t = Translation {
            lao: "ຂອບໃຈ".to_string(),
            romanization: "khob jai".to_string(),
            note: Some("礼貌用语".to_string()),
        };
        let out = format_translation(&t, 0);

        assert!(out.contains("<i>khob jai</i>"));
        assert!(out.contains("📝 礼貌用语"));
        assert!(out.contains("今日剩余次数：0"));
    }
}
