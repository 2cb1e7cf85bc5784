//! Prompt templates and model response parsing.
//!
//! Models are asked for JSON. They frequently wrap it in a fenced block or
//! add a sentence around it, so parsing looks for the outermost JSON value
//! and falls back to plain text when none parses.

use serde::Deserialize;

/// Structured translation returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Translation {
    /// Lao translation.
    pub lao: String,
    /// Romanized pronunciation of the Lao text.
    #[serde(default)]
    pub romanization: String,
    /// Optional usage note.
    #[serde(default)]
    pub note: Option<String>,
}

/// One vocabulary entry for the periodic digest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VocabularyItem {
    pub chinese: String,
    #[serde(default)]
    pub pinyin: String,
    pub lao: String,
    #[serde(default)]
    pub romanization: String,
    #[serde(default)]
    pub example: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VocabularyPayload {
    List(Vec<VocabularyItem>),
    Wrapped { words: Vec<VocabularyItem> },
}

pub fn translation_prompt(text: &str) -> String {
    format!(
        "你是专业的中文-老挝语翻译。请把下面的中文翻译成自然、地道的老挝语。\n\
         只返回一个 JSON 对象，不要任何其他文字，格式为：\n\
         {{\"lao\": \"老挝语译文\", \"romanization\": \"老挝语拉丁字母注音\", \"note\": \"简短用法说明，可为空\"}}\n\n\
         中文：{text}"
    )
}

pub fn vocabulary_prompt(count: usize, avoid: &[String]) -> String {
    let avoid = if avoid.is_empty() {
        String::new()
    } else {
        format!("\n不要使用以下已经发过的词：{}。", avoid.join("、"))
    };

    format!(
        "请为学习老挝语的中文使用者挑选 {count} 个常用日常词汇。{avoid}\n\
         只返回一个 JSON 数组，不要任何其他文字，每个元素格式为：\n\
         {{\"chinese\": \"中文\", \"pinyin\": \"拼音\", \"lao\": \"老挝语\", \
         \"romanization\": \"老挝语注音\", \"example\": \"简短中文例句及老挝语翻译\"}}"
    )
}

/// Parse a translation response, degrading to the raw text.
pub fn parse_translation(raw: &str) -> Translation {
    extract_json(raw, '{', '}')
        .and_then(|json| serde_json::from_str::<Translation>(json).ok())
        .filter(|t| !t.lao.trim().is_empty())
        .unwrap_or_else(|| Translation {
            lao: strip_fences(raw).to_string(),
            romanization: String::new(),
            note: None,
        })
}

/// Parse a vocabulary response. Unparsable output yields no items.
pub fn parse_vocabulary(raw: &str) -> Vec<VocabularyItem> {
    let payload = extract_json(raw, '[', ']')
        .and_then(|json| serde_json::from_str::<VocabularyPayload>(json).ok())
        .or_else(|| {
            extract_json(raw, '{', '}')
                .and_then(|json| serde_json::from_str::<VocabularyPayload>(json).ok())
        });

    let items = match payload {
        Some(VocabularyPayload::List(items)) => items,
        Some(VocabularyPayload::Wrapped { words }) => words,
        None => return Vec::new(),
    };

    items
        .into_iter()
        .filter(|item| !item.chinese.trim().is_empty() && !item.lao.trim().is_empty())
        .collect()
}

fn extract_json(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    (end > start).then(|| &raw[start..=end])
}

fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_translation() {
        let raw = "```json\n{\"lao\": \"ສະບາຍດີ\", \"romanization\": \"sabaidee\", \"note\": null}\n```";
        let t = parse_translation(raw);

        assert_eq!(t.lao, "ສະບາຍດີ");
        assert_eq!(t.romanization, "sabaidee");
        assert_eq!(t.note, None);
    }

    #[test]
    fn test_parse_translation_falls_back_to_text() {
        let t = parse_translation("```\nຂອບໃຈ\n```");
        assert_eq!(t.lao, "ຂອບໃຈ");
        assert!(t.romanization.is_empty());
    }

    #[test]
    fn test_parse_translation_with_empty_lao_falls_back() {
        let t = parse_translation("{\"lao\": \"\"}");
        assert_eq!(t.lao, "{\"lao\": \"\"}");
    }

    #[test]
    fn test_parse_vocabulary_list_and_wrapped() {
        let list = r#"Here you go: [{"chinese":"水","pinyin":"shuǐ","lao":"ນ້ຳ"},{"chinese":"","lao":"x"}]"#;
        let items = parse_vocabulary(list);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].lao, "ນ້ຳ");

        let wrapped = r#"{"words":[{"chinese":"饭","lao":"ເຂົ້າ"}]}"#;
        assert_eq!(parse_vocabulary(wrapped).len(), 1);

        assert!(parse_vocabulary("sorry, no").is_empty());
    }

    #[test]
    fn test_vocabulary_prompt_lists_previous_terms() {
        let prompt = vocabulary_prompt(5, &["水".to_string(), "饭".to_string()]);
        assert!(prompt.contains("水、饭"));
        assert!(prompt.contains('5'));

        assert!(!vocabulary_prompt(5, &[]).contains("不要使用"));
    }
}
