use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const SYSTEM_PROMPT_KO: &str = "당신은 논문 초록을 분석해 주제 적합성을 평가하는 AI입니다.";
pub const SYSTEM_PROMPT_EN: &str =
    "You are an AI that reads paper abstracts and judges whether they fit a research topic.";

/// Working language of the prompt and of the labels the model must answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    Korean,
    English,
}

impl std::str::FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "ko" | "kr" | "korean" => Ok(Language::Korean),
            "en" | "english" => Ok(Language::English),
            other => Err(Error::Config(format!("unsupported language '{}'", other))),
        }
    }
}

/// The three literal answers the classifier accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    pub related: &'static str,
    pub mentioned_only: &'static str,
    pub unrelated: &'static str,
}

impl Language {
    pub fn labels(&self) -> Labels {
        match self {
            Language::Korean => Labels {
                related: "관련 있음",
                mentioned_only: "단순 언급",
                unrelated: "관련 없음",
            },
            Language::English => Labels {
                related: "related",
                mentioned_only: "mentioned_only",
                unrelated: "unrelated",
            },
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            Language::Korean => SYSTEM_PROMPT_KO,
            Language::English => SYSTEM_PROMPT_EN,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelevancePrompt<'a> {
    pub language: Language,
    pub topic_terms: &'a [String],
    pub abstract_text: &'a str,
}

impl<'a> RelevancePrompt<'a> {
    pub fn new(language: Language, topic_terms: &'a [String], abstract_text: &'a str) -> Self {
        Self {
            language,
            topic_terms,
            abstract_text,
        }
    }

    pub fn to_prompt(&self) -> String {
        let labels = self.language.labels();
        let quoted_terms = self
            .topic_terms
            .iter()
            .map(|t| format!("'{}'", t))
            .collect::<Vec<_>>()
            .join(", ");
        let topic = self
            .topic_terms
            .first()
            .map(String::as_str)
            .unwrap_or_default();

        match self.language {
            Language::Korean => format!(
                "다음 초록을 읽고, 이 논문이 {terms}을 연구의 핵심 주제로 다루는지 판단해주세요.\n\n\
                 ✅ '{related}':\n\
                 - 연구의 핵심 주제가 {topic}\n\
                 - {topic} 관련 정책, 제도, 프로그램, 실험 중심\n\n\
                 ❌ '{mentioned}' 또는 '{unrelated}':\n\
                 - 배경 설명 수준\n\
                 - 결론, 서론, 제안에서만 등장\n\
                 - 주요 연구 내용과 무관\n\n\
                 반드시 다음 중 하나로만 답해주세요:\n\
                 - {related}\n\
                 - {mentioned}\n\
                 - {unrelated}\n\n\
                 초록:\n\"\"\"{abstract_text}\"\"\"\n",
                terms = quoted_terms,
                topic = topic,
                related = labels.related,
                mentioned = labels.mentioned_only,
                unrelated = labels.unrelated,
                abstract_text = self.abstract_text,
            ),
            Language::English => format!(
                "Read the abstract below and decide whether this paper treats {terms} as the core topic of the research.\n\n\
                 ✅ '{related}':\n\
                 - The core topic of the research is {topic}\n\
                 - The work centres on a {topic} policy, institution, programme or experiment\n\n\
                 ❌ '{mentioned}' or '{unrelated}':\n\
                 - It appears only as background\n\
                 - It appears only in the conclusion, introduction or suggestions\n\
                 - It is unrelated to the main research content\n\n\
                 Answer with exactly one of the following and nothing else:\n\
                 - {related}\n\
                 - {mentioned}\n\
                 - {unrelated}\n\n\
                 Abstract:\n\"\"\"{abstract_text}\"\"\"\n",
                terms = quoted_terms,
                topic = topic,
                related = labels.related,
                mentioned = labels.mentioned_only,
                unrelated = labels.unrelated,
                abstract_text = self.abstract_text,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_abstract_and_labels() {
        let terms = vec!["챗봇".to_string(), "Chatbot".to_string()];
        let prompt = RelevancePrompt::new(Language::Korean, &terms, "챗봇 기반 상담 실험").to_prompt();

        assert!(prompt.contains("'챗봇', 'Chatbot'"));
        assert!(prompt.contains("\"\"\"챗봇 기반 상담 실험\"\"\""));
        for label in ["관련 있음", "단순 언급", "관련 없음"] {
            assert!(prompt.contains(&format!("- {}\n", label)));
        }
    }

    #[test]
    fn test_english_prompt_uses_english_labels() {
        let terms = vec!["chatbot".to_string()];
        let prompt = RelevancePrompt::new(Language::English, &terms, "text").to_prompt();

        assert!(prompt.contains("- mentioned_only\n"));
        assert!(prompt.contains("core topic of the research is chatbot"));
        assert!(!prompt.contains("관련"));
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::English);
        assert_eq!("ko".parse::<Language>().unwrap(), Language::Korean);
        assert!("fr".parse::<Language>().is_err());
    }
}
