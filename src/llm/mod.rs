pub mod provider;
pub mod openai;
pub mod claude;
pub mod prompts;
pub mod parser;

pub use provider::{CompletionProvider, CompletionRequest};
pub use openai::OpenAiProvider;
pub use claude::ClaudeProvider;
pub use prompts::{Labels, Language, RelevancePrompt};
pub use parser::parse_verdict;
