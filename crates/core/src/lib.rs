// Core types and translation of quantum graphs into CWL workflows

pub mod config;
pub mod cwl;
pub mod dag;
pub mod error;
pub mod payload;
pub mod types;

pub use config::TranslatorConfig;
pub use cwl::{CwlBuilder, CwlDocuments};
pub use dag::{GraphSpec, QuantumGraph};
pub use error::{CwlError, Result};
pub use payload::PayloadCodec;
pub use types::*;
