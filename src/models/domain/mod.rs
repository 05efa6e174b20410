pub mod extraction;
pub mod study;
pub use extraction::{ExtractedScale, HypothesisExtraction};
pub use study::StudySpec;
