use serde::{Deserialize, Serialize};

/// Outcome of classifying one abstract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Related,
    MentionedOnly,
    Unrelated,
    /// The model replied with something other than one of the three labels.
    Unparseable { raw: String },
    /// The completion call itself failed.
    Error { reason: String },
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Related => write!(f, "related"),
            Verdict::MentionedOnly => write!(f, "mentioned_only"),
            Verdict::Unrelated => write!(f, "unrelated"),
            Verdict::Unparseable { raw } => write!(f, "unparseable ({:?})", raw),
            Verdict::Error { reason } => write!(f, "error ({})", reason),
        }
    }
}

/// What to do with records whose verdict is `Unparseable` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    #[default]
    Keep,
    Exclude,
}
