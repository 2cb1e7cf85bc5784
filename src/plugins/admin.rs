//! Admin commands.
//!
//! Stats, manual quota override and broadcast. Every entry point checks the
//! static allow-list first; non-admins get the denial text and nothing else
//! happens.

use teloxide::prelude::*;
use teloxide::types::ReplyParameters;
use tracing::{error, info};

use crate::bot::{AppState, ThrottledBot};
use crate::jobs::broadcast;
use crate::session::PendingInput;
use crate::texts;
use crate::utils::html_escape;

/// Parse "<user_id> <quota>".
pub fn parse_set_limit(args: &str) -> Option<(u64, u32)> {
    let mut parts = args.split_whitespace();
    let user_id = parts.next()?.parse().ok()?;
    let quota = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((user_id, quota))
}

/// Apply a quota override and describe the result.
pub async fn set_limit(state: &AppState, caller: u64, args: &str) -> String {
    if !state.is_admin(caller) {
        return texts::ADMIN_DENIED.to_string();
    }

    let Some((user_id, quota)) = parse_set_limit(args) else {
        return texts::ADMIN_LIMIT_USAGE.to_string();
    };

    match state.translator.set_quota(user_id, quota).await {
        Ok(true) => {
            info!("Admin {} set quota of {} to {}", caller, user_id, quota);
            format!("✅ 已将用户 {} 今日剩余次数设为 {}。", user_id, quota)
        }
        Ok(false) => format!("❓ 找不到用户 {}。", user_id),
        Err(e) => {
            error!("Failed to set quota for {}: {}", user_id, e);
            texts::GENERIC_FAILURE.to_string()
        }
    }
}

/// Usage statistics for admins.
pub async fn stats_text(state: &AppState, caller: u64) -> String {
    if !state.is_admin(caller) {
        return texts::ADMIN_DENIED.to_string();
    }

    let users = match state.store.list_users().await {
        Ok(users) => users.len().to_string(),
        Err(e) => {
            error!("Failed to count users: {}", e);
            "?".to_string()
        }
    };
    let usage = state.tracker.summary();
    let pair = state
        .generator
        .active_pair()
        .map(|p| format!("密钥 #{} / {}", p.key_index + 1, p.model))
        .unwrap_or_else(|| "未配置".to_string());

    format!(
        "📊 使用统计\n\n\
         存储：{}\n\
         用户总数：{}\n\
         今日活跃用户：{}\n\
         今日翻译次数：{}\n\
         当前模型：{}",
        state.store.name(),
        users,
        usage.active_users,
        usage.translations,
        pair
    )
}

/// Handle /admin_stats.
pub async fn stats_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let text = stats_text(&state, user.id.0).await;
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Handle /admin_set_limit [<user_id> <quota>].
///
/// Without arguments the next message is taken as the arguments.
pub async fn set_limit_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let caller = user.id.0;

    if args.trim().is_empty() && state.is_admin(caller) {
        state.sessions.expect_input(caller, PendingInput::AdminLimit);
        bot.send_message(msg.chat.id, texts::ADMIN_LIMIT_PROMPT).await?;
        return Ok(());
    }

    set_limit_reply(&bot, &msg, &state, &args).await
}

/// Apply a quota override from command arguments or pending input.
pub async fn set_limit_reply(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
    args: &str,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let text = set_limit(state, user.id.0, args).await;
    bot.send_message(msg.chat.id, text)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

/// Handle /admin_broadcast [text].
pub async fn broadcast_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    text: String,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let caller = user.id.0;

    if text.trim().is_empty() && state.is_admin(caller) {
        state
            .sessions
            .expect_input(caller, PendingInput::AdminBroadcast);
        bot.send_message(msg.chat.id, texts::ADMIN_BROADCAST_PROMPT)
            .await?;
        return Ok(());
    }

    broadcast_reply(&bot, &msg, &state, &text).await
}

/// Check the caller and turn broadcast input into the HTML message body.
///
/// `Err` carries the reply for the caller; nothing is sent in that case.
pub fn broadcast_body(state: &AppState, caller: u64, text: &str) -> Result<String, &'static str> {
    if !state.is_admin(caller) {
        return Err(texts::ADMIN_DENIED);
    }

    let text = text.trim();
    if text.is_empty() {
        return Err(texts::ADMIN_BROADCAST_USAGE);
    }
    Ok(html_escape(text))
}

/// Broadcast from command arguments or pending input.
pub async fn broadcast_reply(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
    text: &str,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let caller = user.id.0;

    let body = match broadcast_body(state, caller, text) {
        Ok(body) => body,
        Err(reply) => {
            bot.send_message(msg.chat.id, reply).await?;
            return Ok(());
        }
    };

    info!("Admin {} started a broadcast", caller);
    let reply = match broadcast::send_to_all(bot, state, &body).await {
        Ok(report) => format!(
            "📢 群发完成：成功 {}，失败 {}。",
            report.sent, report.failed
        ),
        Err(e) => {
            error!("Broadcast failed: {}", e);
            texts::GENERIC_FAILURE.to_string()
        }
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}
