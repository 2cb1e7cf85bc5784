//! Plugin system for command and text handlers.
//!
//! Add new plugins by:
//! 1. Creating a new file in this directory
//! 2. Adding `pub mod your_plugin;` below
//! 3. Adding the handler to `command_handler()` or a menu action

pub mod admin;
pub mod feedback;
pub mod history;
pub mod menu;
pub mod profile;
pub mod start;
pub mod translate;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::bot::{AppState, ThrottledBot};
use crate::session::{PendingInput, SessionStore};
use crate::texts;

use menu::MenuAction;

/// All bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "snake_case", description = "可用命令：")]
pub enum Command {
    #[command(description = "开始使用")]
    Start(String),

    #[command(description = "使用说明")]
    Help,

    #[command(description = "查看翻译历史")]
    History,

    #[command(description = "查看我的资料")]
    Profile,

    #[command(description = "意见反馈")]
    Feedback(String),

    #[command(description = "取消等待中的输入")]
    Cancel,

    #[command(description = "管理员：使用统计")]
    AdminStats,

    #[command(description = "管理员：设置额度 <用户ID> <次数>")]
    AdminSetLimit(String),

    #[command(description = "管理员：群发消息 <内容>")]
    AdminBroadcast(String),
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    teloxide::filter_command::<Command, _>()
        .map(|cmd: Command, msg: Message, state: AppState| {
            if let Some(user) = msg.from.as_ref() {
                forget_pending_input(&state.sessions, user.id.0, &cmd);
            }
            cmd
        })
        .branch(case![Command::Start(args)].endpoint(handle_start))
        .branch(case![Command::Help].endpoint(start::help_handler))
        .branch(case![Command::History].endpoint(history::history_handler))
        .branch(case![Command::Profile].endpoint(profile::profile_handler))
        .branch(case![Command::Feedback(text)].endpoint(feedback::feedback_command))
        .branch(case![Command::Cancel].endpoint(handle_cancel))
        .branch(case![Command::AdminStats].endpoint(admin::stats_command))
        .branch(case![Command::AdminSetLimit(args)].endpoint(admin::set_limit_command))
        .branch(case![Command::AdminBroadcast(text)].endpoint(admin::broadcast_command))
}

/// Build the handler for plain text (menu buttons, pending input, translation).
pub fn text_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(|msg: Message| msg.text().is_some() && msg.from.is_some())
        .endpoint(route_text)
}

/// Handle /start, ignoring any deep-link payload.
async fn handle_start(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    _args: String,
) -> anyhow::Result<()> {
    start::start_handler(bot, msg, state).await
}

/// Handle /cancel - drop any pending one-shot input.
async fn handle_cancel(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let text = if state.sessions.clear_pending(user.id.0) {
        texts::CANCELLED
    } else {
        texts::NOTHING_TO_CANCEL
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// A command abandons any one-shot input the bot was waiting for.
///
/// /cancel is excluded so it can report whether anything was pending.
/// Commands that arm an input do so after this runs.
fn forget_pending_input(sessions: &SessionStore, user_id: u64, cmd: &Command) {
    if !matches!(cmd, Command::Cancel) {
        sessions.clear_pending(user_id);
    }
}

/// Where a non-command text message goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Menu(MenuAction),
    Pending(PendingInput),
    Help,
    Translate,
    Guidance,
}

/// Decide the route for `text`, updating the pending input.
///
/// Order: menu buttons (which drop any pending input), then pending one-shot
/// input (consumed), then unknown commands, then translation (if enabled) or
/// guidance.
pub fn route(sessions: &SessionStore, user_id: u64, text: &str) -> Route {
    if let Some(action) = MenuAction::from_label(text) {
        sessions.clear_pending(user_id);
        return Route::Menu(action);
    }

    if let Some(pending) = sessions.take_pending(user_id) {
        return Route::Pending(pending);
    }

    if text.starts_with('/') {
        Route::Help
    } else if sessions.is_translation_enabled(user_id) {
        Route::Translate
    } else {
        Route::Guidance
    }
}

async fn route_text(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let (Some(text), Some(user)) = (msg.text(), msg.from.as_ref()) else {
        return Ok(());
    };
    let user_id = user.id.0;
    let text = text.to_string();

    match route(&state.sessions, user_id, &text) {
        Route::Menu(action) => menu::handle_action(bot, msg, state, action).await,
        Route::Pending(PendingInput::Feedback) => {
            feedback::submit(&bot, &msg, &state, &text).await
        }
        Route::Pending(PendingInput::AdminLimit) => {
            admin::set_limit_reply(&bot, &msg, &state, &text).await
        }
        Route::Pending(PendingInput::AdminBroadcast) => {
            admin::broadcast_reply(&bot, &msg, &state, &text).await
        }
        Route::Help => start::help_handler(bot, msg, state).await,
        Route::Translate => translate::translate_handler(bot, msg, state).await,
        Route::Guidance => {
            bot.send_message(msg.chat.id, texts::GUIDANCE)
                .reply_markup(menu::keyboard(state.is_admin(user_id)))
                .await?;
            Ok(())
        }
    }
}
