//! Feedback plugin.
//!
//! /feedback with text submits it directly; without text (or via the menu
//! button) the next message is taken as feedback.

use teloxide::prelude::*;
use teloxide::types::{ParseMode, User};
use tracing::{info, warn};

use crate::bot::{AppState, ThrottledBot};
use crate::session::PendingInput;
use crate::texts;
use crate::utils::html_escape;

/// Handle /feedback [text].
pub async fn feedback_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    text: String,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    if text.trim().is_empty() {
        state.sessions.expect_input(user.id.0, PendingInput::Feedback);
        bot.send_message(msg.chat.id, texts::FEEDBACK_PROMPT).await?;
        return Ok(());
    }

    submit(&bot, &msg, &state, &text).await
}

/// Forward feedback to every admin and thank the sender.
pub async fn submit(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
    text: &str,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let text = text.trim();
    if text.is_empty() {
        bot.send_message(msg.chat.id, texts::FEEDBACK_EMPTY).await?;
        return Ok(());
    }

    info!("Feedback from {}: {} chars", user.id, text.chars().count());

    let report = feedback_report(user, text);
    for admin_id in state.admins.ids() {
        if let Err(e) = bot
            .send_message(ChatId(admin_id as i64), report.clone())
            .parse_mode(ParseMode::Html)
            .await
        {
            warn!("Failed to forward feedback to admin {}: {}", admin_id, e);
        }
    }

    bot.send_message(msg.chat.id, texts::FEEDBACK_THANKS).await?;
    Ok(())
}

fn feedback_report(user: &User, text: &str) -> String {
    let username = user
        .username
        .as_deref()
        .map(|u| format!(" @{}", u))
        .unwrap_or_default();

    format!(
        "💬 <b>新反馈</b>\n来自：{}{} (<code>{}</code>)\n\n{}",
        html_escape(&user.full_name()),
        html_escape(&username),
        user.id,
        html_escape(text)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_report() {
        let user = User {
            id: UserId(7),
            is_bot: false,
            first_name: "Ana".to_string(),
            last_name: None,
            username: Some("ana".to_string()),
            language_code: None,
            is_premium: false,
            added_to_attachment_menu: false,
        };

        let report = feedback_report(&user, "太慢了 <_<");
        assert!(report.contains("Ana @ana (<code>7</code>)"));
        assert!(report.ends_with("太慢了 &lt;_&lt;"));
    }
}
