//! Typed model of the generated documents.
//!
//! Field declaration order is the emitted order and every map is an
//! `IndexMap`, so the YAML output follows insertion order rather than being
//! alphabetized.

use crate::error::{CwlError, Result};
use crate::payload::PayloadCodec;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Suffix of data entries that carry a compressed node payload
pub const QUANTUM_SUFFIX: &str = "_quantum";

/// Document `class` marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentClass {
    Workflow,
    CommandLineTool,
}

/// Parameter types used by the generated workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CwlType {
    #[serde(rename = "string")]
    String,
    File,
    #[serde(rename = "File[]")]
    FileArray,
    #[serde(rename = "stdout")]
    Stdout,
}

/// Top-level workflow description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(rename = "cwlVersion")]
    pub cwl_version: String,
    pub class: DocumentClass,
    pub inputs: IndexMap<String, CwlType>,
    pub outputs: IndexMap<String, WorkflowOutput>,
    pub steps: IndexMap<String, WorkflowStep>,
}

impl Workflow {
    pub fn new(cwl_version: impl Into<String>) -> Self {
        Self {
            cwl_version: cwl_version.into(),
            class: DocumentClass::Workflow,
            inputs: IndexMap::new(),
            outputs: IndexMap::new(),
            steps: IndexMap::new(),
        }
    }
}

/// Workflow-level output collected from a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowOutput {
    #[serde(rename = "type")]
    pub output_type: CwlType,
    #[serde(rename = "outputSource")]
    pub output_source: String,
}

/// One step of the workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    #[serde(rename = "in")]
    pub inputs: IndexMap<String, StepInput>,
    #[serde(rename = "out")]
    pub outputs: Vec<String>,
    pub run: CommandLineTool,
}

/// Binding of a step parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepInput {
    /// Name of a workflow input
    Source(String),
    /// One or more upstream step outputs
    Linked(LinkedSource),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedSource {
    pub source: Vec<String>,
    #[serde(
        rename = "linkMerge",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub link_merge: Option<LinkMerge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMerge {
    MergeNested,
    MergeFlattened,
}

/// Tool invoked by a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandLineTool {
    pub class: DocumentClass,
    #[serde(rename = "baseCommand")]
    pub base_command: String,
    pub stdout: String,
    pub inputs: IndexMap<String, ToolInput>,
    pub outputs: IndexMap<String, ToolOutput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInput {
    #[serde(rename = "type")]
    pub input_type: CwlType,
    #[serde(rename = "inputBinding")]
    pub input_binding: InputBinding,
}

impl ToolInput {
    /// A string argument at a fixed command-line position
    pub fn positional(position: u32) -> Self {
        Self {
            input_type: CwlType::String,
            input_binding: InputBinding {
                position: Some(position),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputBinding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(
        rename = "itemSeparator",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub item_separator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separate: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    #[serde(rename = "type")]
    pub output_type: CwlType,
}

/// Side-channel document: entry key -> text-safe encoded payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataDocument {
    entries: IndexMap<String, String>,
}

impl DataDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an entry, returning the previous value under the same key
    pub fn insert(&mut self, key: impl Into<String>, value: String) -> Option<String> {
        self.entries.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode an entry back to its serialized bytes.
    ///
    /// Node entries are compressed, the pipeline and context entries are not.
    pub fn decode_entry(&self, key: &str, codec: &PayloadCodec) -> Result<Vec<u8>> {
        let text = self
            .get(key)
            .ok_or_else(|| CwlError::UnknownEntry(key.to_string()))?;

        if key.ends_with(QUANTUM_SUFFIX) {
            codec.decode_compressed(key, text)
        } else {
            codec.decode_plain(key, text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linked_source_serialization() {
        let single = StepInput::Linked(LinkedSource {
            source: vec!["init_job/init_job_output".to_string()],
            link_merge: Some(LinkMerge::MergeNested),
        });
        let yaml = serde_yaml_ng::to_string(&single).unwrap();
        assert_eq!(
            yaml,
            "source:\n- init_job/init_job_output\nlinkMerge: merge_nested\n"
        );

        let multi = StepInput::Linked(LinkedSource {
            source: vec!["a_job/a_output".to_string(), "b_job/b_output".to_string()],
            link_merge: None,
        });
        let yaml = serde_yaml_ng::to_string(&multi).unwrap();
        assert!(!yaml.contains("linkMerge"));
    }

    #[test]
    fn test_type_names() {
        let types = vec![CwlType::String, CwlType::File, CwlType::FileArray, CwlType::Stdout];
        let json = serde_json::to_value(&types).unwrap();
        assert_eq!(json, serde_json::json!(["string", "File", "File[]", "stdout"]));
    }

    #[test]
    fn test_header_field_order() {
        let workflow = Workflow::new("v1.0");
        let yaml = serde_yaml_ng::to_string(&workflow).unwrap();
        assert_eq!(
            yaml,
            "cwlVersion: v1.0\nclass: Workflow\ninputs: {}\noutputs: {}\nsteps: {}\n"
        );
    }

    #[test]
    fn test_data_document_preserves_insertion_order() {
        let mut data = DataDocument::new();
        data.insert("pipeline", "cA==".to_string());
        data.insert("abc_quantum", "cQ==".to_string());
        data.insert("butler", "Yg==".to_string());

        let keys: Vec<&str> = data.keys().collect();
        assert_eq!(keys, vec!["pipeline", "abc_quantum", "butler"]);

        let err = data
            .decode_entry("missing", &PayloadCodec::default())
            .unwrap_err();
        assert!(matches!(err, CwlError::UnknownEntry(_)));
    }
}
