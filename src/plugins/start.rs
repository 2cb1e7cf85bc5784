//! /start and /help command plugin.
//!
//! /start registers the user and shows the main menu keyboard.

use teloxide::prelude::*;
use tracing::{error, info};

use crate::bot::{AppState, ThrottledBot};
use crate::texts;

use super::menu;

/// Handle the /start command.
pub async fn start_handler(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0;

    match state.translator.load_user(user_id, &user.full_name()).await {
        Ok(record) => info!(
            "User {} started the bot ({} quota left)",
            user_id, record.daily_quota_remaining
        ),
        Err(e) => error!("Failed to register user {}: {}", user_id, e),
    }

    bot.send_message(msg.chat.id, texts::WELCOME)
        .reply_markup(menu::keyboard(state.is_admin(user_id)))
        .await?;

    Ok(())
}

/// Handle the /help command and unknown commands.
pub async fn help_handler(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let is_admin = msg
        .from
        .as_ref()
        .map(|u| state.is_admin(u.id.0))
        .unwrap_or(false);

    bot.send_message(msg.chat.id, texts::HELP)
        .reply_markup(menu::keyboard(is_admin))
        .await?;

    Ok(())
}
