//! /profile plugin.

use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::error;

use crate::bot::{AppState, ThrottledBot};
use crate::database::UserRecord;
use crate::texts;
use crate::utils::{format_duration_zh, html_escape};

/// Show the caller's quota and trial status.
pub async fn profile_handler(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let text = match state.translator.load_user(user.id.0, &user.full_name()).await {
        Ok(record) => {
            let until_reset = state.clock.until_next_reset(Utc::now()).as_secs();
            profile_text(&record, state.daily_quota, until_reset)
        }
        Err(e) => {
            error!("Failed to load profile for {}: {}", user.id, e);
            texts::GENERIC_FAILURE.to_string()
        }
    };

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}

pub fn profile_text(record: &UserRecord, daily_quota: u32, until_reset_secs: u64) -> String {
    format!(
        "👤 <b>{}</b>\n\
         🆔 <code>{}</code>\n\
         📅 加入日期：{}\n\
         🎯 今日剩余次数：{}/{}\n\
         🎁 剩余试用天数：{}\n\
         ⏳ 距离次数重置：{}",
        html_escape(&record.display_name),
        record.user_id,
        record.join_date.format("%Y-%m-%d"),
        record.daily_quota_remaining,
        daily_quota,
        record.remaining_trial_days,
        format_duration_zh(until_reset_secs),
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_profile_text() {
        let joined = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let record = UserRecord::new(42, "A&B", 2, 1, joined);

        let text = profile_text(&record, 3, 5400);
        assert!(text.contains("<b>A&amp;B</b>"));
        assert!(text.contains("<code>42</code>"));
        assert!(text.contains("2026-10-01"));
        assert!(text.contains("2/3"));
        assert!(text.contains("剩余试用天数：1"));
        assert!(text.contains("1 小时 30 分钟"));
    }
}
