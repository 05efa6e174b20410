//! Survey-definition (QSF) generation.
//!
//! [`Assembler`] turns a [`StudySpec`](crate::models::domain::study::StudySpec) into a
//! [`SurveyDocument`]; [`format`] encodes it for the hosted survey platform.

pub mod assembler;
pub mod blocks;
pub mod error;
pub mod flow;
pub mod format;
pub mod ids;
pub mod model;
pub mod questions;
pub mod templates;

pub use assembler::{assemble, Assembler, Assembly, OmittedSection};
pub use error::{SurveyError, SurveyResult};
pub use format::to_qsf_json;
pub use ids::IdGenerator;
pub use model::{SectionKind, SurveyDocument};
