//! Error types for graph translation.

/// Result type for translation operations.
pub type Result<T> = std::result::Result<T, CwlError>;

/// Errors that can occur while building, translating or decoding a graph.
///
/// Any error aborts the whole translation: a partially wired workflow is
/// never returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum CwlError {
    /// Translator settings would produce an ambiguous document.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The graph is not a valid DAG (cycle, undefined key, duplicate key).
    #[error("Structural error: {0}")]
    Structural(String),

    /// A node, the pipeline or the context handle could not be serialized.
    #[error("Failed to serialize {what}: {source}")]
    Serialization {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// Compressing or decompressing a payload failed.
    #[error("Compression failed for {what}: {source}")]
    Compression {
        what: String,
        #[source]
        source: std::io::Error,
    },

    /// A stored payload is not valid text-safe encoded data.
    #[error("Failed to decode {what}: {reason}")]
    Decode { what: String, reason: String },

    /// Two distinct nodes produced the same derived identifier.
    #[error("Identifier collision on {id}: quanta '{first}' and '{second}'")]
    IdentifierCollision {
        id: String,
        first: String,
        second: String,
    },

    /// A finished document could not be emitted as YAML.
    #[error("Failed to emit {document} document: {source}")]
    Emit {
        document: &'static str,
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// Requested data document entry does not exist.
    #[error("No entry named '{0}' in data document")]
    UnknownEntry(String),
}

impl CwlError {
    pub(crate) fn structural(message: impl Into<String>) -> Self {
        Self::Structural(message.into())
    }

    pub(crate) fn serialization(what: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            what: what.into(),
            source,
        }
    }
}
