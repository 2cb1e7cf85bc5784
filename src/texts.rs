//! User-facing message texts.
//!
//! Users are Chinese speakers, so replies are in Chinese. All texts here are
//! plain; HTML replies are built by the handlers that send them.

pub const WELCOME: &str = "👋 你好！我是中文→老挝语翻译助手。\n\n\
点击「🔄 开启/关闭翻译」后，直接发送中文即可获得老挝语翻译。\n\
每天有免费翻译次数，每次最多翻译一小段文字。\n\n\
使用 /help 查看全部功能。";

pub const HELP: &str = "📖 使用说明\n\n\
• 🔄 开启/关闭翻译：打开后直接发送中文即可翻译\n\
• 👤 我的资料 或 /profile：查看剩余次数\n\
• 📜 翻译历史 或 /history：查看最近的翻译\n\
• 💬 意见反馈 或 /feedback：给我们留言\n\
• /cancel：取消正在等待的输入";

pub const GUIDANCE: &str = "ℹ️ 翻译功能当前未开启。请点击下方「🔄 开启/关闭翻译」按钮后再发送中文。";

pub const TRANSLATION_ON: &str = "✅ 翻译已开启，请直接发送中文。";
pub const TRANSLATION_OFF: &str = "⏸ 翻译已关闭。";

pub const QUOTA_EXHAUSTED: &str = "⛔ 今天的免费翻译次数已用完，请明天再来。";
pub const GENERIC_FAILURE: &str = "⚠️ 抱歉，服务暂时出现问题，请稍后再试。";
pub const AI_UNAVAILABLE: &str = "⚠️ 翻译服务尚未配置，请联系管理员。";

pub const ADMIN_DENIED: &str = "⛔ 你没有权限使用此命令。";
pub const ADMIN_LIMIT_PROMPT: &str = "✏️ 请输入：用户ID 次数（例如：123456789 5）";
pub const ADMIN_LIMIT_USAGE: &str = "用法：/admin_set_limit 用户ID 次数";
pub const ADMIN_BROADCAST_PROMPT: &str = "📢 请输入要群发的内容：";
pub const ADMIN_BROADCAST_USAGE: &str = "用法：/admin_broadcast 内容";

pub const FEEDBACK_PROMPT: &str = "💬 请直接输入你的意见或建议：";
pub const FEEDBACK_THANKS: &str = "🙏 谢谢你的反馈！";
pub const FEEDBACK_EMPTY: &str = "反馈内容不能为空。";

pub const HISTORY_EMPTY: &str = "📜 还没有翻译记录。";

pub const CANCELLED: &str = "已取消。";
pub const NOTHING_TO_CANCEL: &str = "当前没有需要取消的操作。";

pub fn too_long(max_chars: usize) -> String {
    format!("✂️ 每次最多翻译 {} 个字，请缩短后再发送。", max_chars)
}
