pub mod record;
pub mod verdict;
pub mod report;

pub use record::*;
pub use verdict::*;
pub use report::*;
