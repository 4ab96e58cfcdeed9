pub mod dedup;
pub mod completeness;
pub mod keyword;
pub mod relevance;
pub mod exclusion;
pub mod pipeline;

pub use dedup::deduplicate;
pub use completeness::missing_abstracts;
pub use keyword::KeywordGate;
pub use relevance::RelevanceClassifier;
pub use exclusion::{retain_survivors, ExclusionSet};
pub use pipeline::{Prefilter, ScreeningOutcome, ScreeningPipeline};
