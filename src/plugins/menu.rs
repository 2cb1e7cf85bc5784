//! Reply-keyboard menu.
//!
//! Buttons arrive as plain text messages carrying the button label. The
//! label table below is the single place mapping labels to actions.

use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup};

use crate::bot::{AppState, ThrottledBot};
use crate::session::PendingInput;
use crate::texts;

use super::{admin, history, profile, start};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ToggleTranslation,
    Profile,
    History,
    Feedback,
    Help,
    AdminStats,
    AdminSetLimit,
    AdminBroadcast,
}

const LABELS: &[(MenuAction, &str)] = &[
    (MenuAction::ToggleTranslation, "🔄 开启/关闭翻译"),
    (MenuAction::Profile, "👤 我的资料"),
    (MenuAction::History, "📜 翻译历史"),
    (MenuAction::Feedback, "💬 意见反馈"),
    (MenuAction::Help, "❓ 使用说明"),
    (MenuAction::AdminStats, "📊 使用统计"),
    (MenuAction::AdminSetLimit, "✏️ 设置额度"),
    (MenuAction::AdminBroadcast, "📢 群发消息"),
];

impl MenuAction {
    pub fn label(self) -> &'static str {
        LABELS
            .iter()
            .find(|(action, _)| *action == self)
            .map(|(_, label)| *label)
            .unwrap_or_default()
    }

    pub fn from_label(text: &str) -> Option<Self> {
        let text = text.trim();
        LABELS
            .iter()
            .find(|(_, label)| *label == text)
            .map(|(action, _)| *action)
    }

    pub fn is_admin_only(self) -> bool {
        matches!(
            self,
            MenuAction::AdminStats | MenuAction::AdminSetLimit | MenuAction::AdminBroadcast
        )
    }
}

/// What pressing a button should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEffect {
    ToggleTranslation,
    ShowProfile,
    ShowHistory,
    ShowHelp,
    ShowStats,
    AwaitInput(PendingInput),
    Denied,
}

/// Decide the effect of a button press.
pub fn transition(action: MenuAction, is_admin: bool) -> MenuEffect {
    if action.is_admin_only() && !is_admin {
        return MenuEffect::Denied;
    }

    match action {
        MenuAction::ToggleTranslation => MenuEffect::ToggleTranslation,
        MenuAction::Profile => MenuEffect::ShowProfile,
        MenuAction::History => MenuEffect::ShowHistory,
        MenuAction::Feedback => MenuEffect::AwaitInput(PendingInput::Feedback),
        MenuAction::Help => MenuEffect::ShowHelp,
        MenuAction::AdminStats => MenuEffect::ShowStats,
        MenuAction::AdminSetLimit => MenuEffect::AwaitInput(PendingInput::AdminLimit),
        MenuAction::AdminBroadcast => MenuEffect::AwaitInput(PendingInput::AdminBroadcast),
    }
}

/// Main menu keyboard. Admins get an extra row.
pub fn keyboard(is_admin: bool) -> KeyboardMarkup {
    let button = |action: MenuAction| KeyboardButton::new(action.label());

    let mut rows = vec![
        vec![button(MenuAction::ToggleTranslation)],
        vec![button(MenuAction::Profile), button(MenuAction::History)],
        vec![button(MenuAction::Feedback), button(MenuAction::Help)],
    ];
    if is_admin {
        rows.push(vec![
            button(MenuAction::AdminStats),
            button(MenuAction::AdminSetLimit),
            button(MenuAction::AdminBroadcast),
        ]);
    }

    KeyboardMarkup::new(rows).resize_keyboard()
}

fn prompt_for(pending: PendingInput) -> &'static str {
    match pending {
        PendingInput::Feedback => texts::FEEDBACK_PROMPT,
        PendingInput::AdminLimit => texts::ADMIN_LIMIT_PROMPT,
        PendingInput::AdminBroadcast => texts::ADMIN_BROADCAST_PROMPT,
    }
}

/// Handle a menu button press.
pub async fn handle_action(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    action: MenuAction,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0;
    let chat_id = msg.chat.id;

    match transition(action, state.is_admin(user_id)) {
        MenuEffect::ToggleTranslation => {
            let text = if state.sessions.toggle_translation(user_id) {
                texts::TRANSLATION_ON
            } else {
                texts::TRANSLATION_OFF
            };
            bot.send_message(chat_id, text).await?;
        }
        MenuEffect::ShowProfile => profile::profile_handler(bot, msg, state).await?,
        MenuEffect::ShowHistory => history::history_handler(bot, msg, state).await?,
        MenuEffect::ShowHelp => start::help_handler(bot, msg, state).await?,
        MenuEffect::ShowStats => {
            let text = admin::stats_text(&state, user_id).await;
            bot.send_message(chat_id, text).await?;
        }
        MenuEffect::AwaitInput(pending) => {
            state.sessions.expect_input(user_id, pending);
            bot.send_message(chat_id, prompt_for(pending)).await?;
        }
        MenuEffect::Denied => {
            bot.send_message(chat_id, texts::ADMIN_DENIED).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for (action, label) in LABELS {
            assert_eq!(MenuAction::from_label(label), Some(*action));
            assert_eq!(action.label(), *label);
        }
        assert_eq!(MenuAction::from_label("你好"), None);
        assert_eq!(
            MenuAction::from_label(" 👤 我的资料 "),
            Some(MenuAction::Profile)
        );
    }

    #[test]
    fn test_admin_buttons_denied_for_users() {
        assert_eq!(
            transition(MenuAction::AdminStats, false),
            MenuEffect::Denied
        );
        assert_eq!(
            transition(MenuAction::AdminBroadcast, false),
            MenuEffect::Denied
        );
        assert_eq!(
            transition(MenuAction::AdminSetLimit, true),
            MenuEffect::AwaitInput(PendingInput::AdminLimit)
        );
    }

    #[test]
    fn test_user_buttons() {
        assert_eq!(
            transition(MenuAction::ToggleTranslation, false),
            MenuEffect::ToggleTranslation
        );
        assert_eq!(
            transition(MenuAction::Feedback, false),
            MenuEffect::AwaitInput(PendingInput::Feedback)
        );
    }

    #[test]
    fn test_keyboard_rows() {
        assert_eq!(keyboard(false).keyboard.len(), 3);

        let admin = keyboard(true);
        assert_eq!(admin.keyboard.len(), 4);
        assert_eq!(admin.keyboard[3][0].text, MenuAction::AdminStats.label());
        assert!(admin.resize_keyboard);
    }
}
