//! Periodic vocabulary digest.
//!
//! Recently sent words are kept in memory and listed in the prompt so the
//! model avoids repeating them. The list is lost on restart.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::ai::prompt::{self, VocabularyItem};
use crate::bot::{AppState, ThrottledBot};
use crate::utils::html_escape;

use super::broadcast::{self, BroadcastReport};

/// Words remembered for deduplication.
const MEMORY_CAPACITY: usize = 200;

/// Words listed in the prompt as already sent.
const PROMPT_AVOID: usize = 50;

/// Ordered record of previously broadcast words, oldest first.
#[derive(Clone, Default)]
pub struct VocabularyMemory {
    words: Arc<Mutex<VecDeque<String>>>,
}

impl VocabularyMemory {
    /// Up to `limit` most recent words, newest first.
    pub fn recent(&self, limit: usize) -> Vec<String> {
        self.words.lock().iter().rev().take(limit).cloned().collect()
    }

    /// Drop items already sent, and duplicates within the batch.
    pub fn filter_new(&self, items: Vec<VocabularyItem>) -> Vec<VocabularyItem> {
        let words = self.words.lock();
        let mut seen: Vec<String> = Vec::new();
        items
            .into_iter()
            .filter(|item| {
                let key = item.chinese.trim().to_string();
                if words.contains(&key) || seen.contains(&key) {
                    return false;
                }
                seen.push(key);
                true
            })
            .collect()
    }

    pub fn remember(&self, items: &[VocabularyItem]) {
        let mut words = self.words.lock();
        for item in items {
            words.push_back(item.chinese.trim().to_string());
        }
        while words.len() > MEMORY_CAPACITY {
            words.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.words.lock().len()
    }
}

pub fn format_digest(items: &[VocabularyItem]) -> String {
    let mut out = String::from("📚 <b>每日老挝语词汇</b>\n");
    for (i, item) in items.iter().enumerate() {
        out.push_str(&format!(
            "\n{}. <b>{}</b>",
            i + 1,
            html_escape(&item.chinese)
        ));
        if !item.pinyin.is_empty() {
            out.push_str(&format!(" ({})", html_escape(&item.pinyin)));
        }
        out.push_str(&format!("\n   🇱🇦 {}", html_escape(&item.lao)));
        if !item.romanization.is_empty() {
            out.push_str(&format!(" <i>{}</i>", html_escape(&item.romanization)));
        }
        if let Some(example) = item.example.as_deref().filter(|e| !e.trim().is_empty()) {
            out.push_str(&format!("\n   💡 {}", html_escape(example)));
        }
        out.push('\n');
    }
    out
}

/// Ask the model for a fresh batch of words not sent before.
pub async fn generate_batch(state: &AppState, count: usize) -> Vec<VocabularyItem> {
    let avoid = state.vocabulary.recent(PROMPT_AVOID);
    let raw = match state
        .generator
        .generate(&prompt::vocabulary_prompt(count, &avoid))
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Vocabulary generation failed: {}", e);
            return Vec::new();
        }
    };

    let mut items = state.vocabulary.filter_new(prompt::parse_vocabulary(&raw));
    items.truncate(count);
    items
}

/// Generate one digest and send it to everyone.
pub async fn run_once(
    bot: &ThrottledBot,
    state: &AppState,
    count: usize,
) -> Option<BroadcastReport> {
    let items = generate_batch(state, count).await;
    if items.is_empty() {
        warn!("No new vocabulary generated, skipping broadcast");
        return None;
    }

    match broadcast::send_to_all(bot, state, &format_digest(&items)).await {
        Ok(report) => {
            state.vocabulary.remember(&items);
            info!(
                "Vocabulary digest of {} words sent ({} remembered)",
                items.len(),
                state.vocabulary.len()
            );
            Some(report)
        }
        Err(e) => {
            warn!("Failed to list users for vocabulary broadcast: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::bot::dispatcher::tests::test_state;
    use crate::database::MemoryStore;
    use crate::translation::tests::StubGenerator;

    fn item(chinese: &str, lao: &str) -> VocabularyItem {
        VocabularyItem {
            chinese: chinese.to_string(),
            pinyin: String::new(),
            lao: lao.to_string(),
            romanization: String::new(),
            example: None,
        }
    }

    #[test]
    fn test_memory_filters_repeats() {
        let memory = VocabularyMemory::default();
        memory.remember(&[item("水", "ນ້ຳ")]);

        let fresh = memory.filter_new(vec![
            item("水", "ນ້ຳ"),
            item("饭", "ເຂົ້າ"),
            item("饭", "ເຂົ້າ"),
        ]);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].chinese, "饭");
    }

    #[test]
    fn test_memory_is_bounded_and_recent_is_newest_first() {
        let memory = VocabularyMemory::default();
        let items: Vec<_> = (0..MEMORY_CAPACITY + 10)
            .map(|i| item(&i.to_string(), "x"))
            .collect();
        memory.remember(&items);

        assert_eq!(memory.len(), MEMORY_CAPACITY);
        let recent = memory.recent(2);
        assert_eq!(recent, vec!["209".to_string(), "208".to_string()]);
    }

    #[test]
    fn test_format_digest() {
        let mut water = item("水", "ນ້ຳ");
        water.pinyin = "shuǐ".to_string();
        water.example = Some("喝水 ດື່ມນ້ຳ".to_string());

        let text = format_digest(&[water, item("饭", "ເຂົ້າ")]);
        assert!(text.contains("1. <b>水</b> (shuǐ)"));
        assert!(text.contains("💡 喝水 ດື່ມນ້ຳ"));
        assert!(text.contains("2. <b>饭</b>"));
    }

    #[tokio::test]
    async fn test_generate_batch_skips_known_words() {
        let reply = r#"[{"chinese":"水","lao":"ນ້ຳ"},{"chinese":"饭","lao":"ເຂົ້າ"},{"chinese":"茶","lao":"ຊາ"}]"#;
        let state = test_state(
            Arc::new(MemoryStore::new()),
            Arc::new(StubGenerator::replying(reply)),
            "",
            None,
        );
        state.vocabulary.remember(&[item("水", "ນ້ຳ")]);

        let batch = generate_batch(&state, 1).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].chinese, "饭");
    }

    #[tokio::test]
    async fn test_generate_batch_on_model_failure() {
        let state = test_state(
            Arc::new(MemoryStore::new()),
            Arc::new(StubGenerator::failing()),
            "",
            None,
        );
        assert!(generate_batch(&state, 5).await.is_empty());
    }
}
