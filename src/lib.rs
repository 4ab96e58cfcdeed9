pub mod config;
pub mod error;
pub mod models;
pub mod llm;
pub mod screen;
pub mod table;

pub use config::{Config, PipelineConfig, ProviderKind};
pub use error::{Error, Result};
pub use llm::{ClaudeProvider, CompletionProvider, OpenAiProvider};
pub use screen::ScreeningPipeline;
pub use table::{check_output_path, load_table, output_path_for, write_table, ColumnMapping};
