use std::sync::Arc;

use crate::llm::{parse_verdict, CompletionProvider, CompletionRequest, Language, RelevancePrompt};
use crate::models::{RecordId, Verdict};

const MAX_ANSWER_TOKENS: u32 = 16;

/// Asks the LLM whether an abstract treats the topic as its core subject.
pub struct RelevanceClassifier {
    provider: Arc<dyn CompletionProvider>,
    language: Language,
    topic_terms: Vec<String>,
}

impl RelevanceClassifier {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        language: Language,
        topic_terms: Vec<String>,
    ) -> Self {
        Self {
            provider,
            language,
            topic_terms,
        }
    }

    pub fn request_for(&self, abstract_text: &str) -> CompletionRequest {
        CompletionRequest {
            system: self.language.system_prompt().to_string(),
            prompt: RelevancePrompt::new(self.language, &self.topic_terms, abstract_text).to_prompt(),
            temperature: 0.0,
            max_tokens: MAX_ANSWER_TOKENS,
        }
    }

    /// Never fails: provider errors become `Verdict::Error`, stray replies
    /// become `Verdict::Unparseable`. Both are logged against `id`.
    pub async fn classify(&self, id: RecordId, abstract_text: &str) -> Verdict {
        let request = self.request_for(abstract_text);

        let verdict = match self.provider.complete(&request).await {
            Ok(text) => parse_verdict(&text, &self.language.labels()),
            Err(e) => {
                tracing::warn!(id = %id, "{} classification failed: {}", self.provider.name(), e);
                return Verdict::Error {
                    reason: e.to_string(),
                };
            }
        };

        if let Verdict::Unparseable { raw } = &verdict {
            tracing::warn!(id = %id, "Unrecognized classifier answer: {:?}", raw);
        } else {
            tracing::debug!(id = %id, "Verdict: {}", verdict);
        }

        verdict
    }
}
