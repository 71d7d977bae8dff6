pub mod builder;
pub mod document;
pub mod step;

pub use builder::{CwlBuilder, CwlDocuments};
pub use document::{DataDocument, Workflow, WorkflowStep};
pub use step::{make_step, StepDescription};
