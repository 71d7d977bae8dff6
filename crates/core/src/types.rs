use crate::error::{CwlError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Data coordinates of a dataset or quantum (e.g. `{"visit": 42, "detector": 7}`)
pub type DataId = BTreeMap<String, Value>;

/// Definition of one kind of task in a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDef {
    pub label: String,
    pub task_class: String,
    #[serde(default)]
    pub config: Value,
}

impl TaskDef {
    pub fn new(label: impl Into<String>, task_class: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            task_class: task_class.into(),
            config: Value::Null,
        }
    }
}

/// Reference to a dataset consumed or produced by a quantum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRef {
    pub dataset_type: String,
    #[serde(default)]
    pub data_id: DataId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
}

/// One unit of work in the execution graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantumNode {
    pub node_id: Uuid,
    pub task_label: String,
    #[serde(default)]
    pub data_id: DataId,
    #[serde(default)]
    pub inputs: BTreeMap<String, Vec<DatasetRef>>,
    #[serde(default)]
    pub outputs: BTreeMap<String, Vec<DatasetRef>>,
}

impl QuantumNode {
    pub fn new(task_label: impl Into<String>) -> Self {
        Self {
            node_id: Uuid::new_v4(),
            task_label: task_label.into(),
            data_id: DataId::new(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Derive the identifier used to name this node's step, inputs and outputs
    pub fn derive_id(&self) -> Result<NodeId> {
        let canonical = serde_json::to_vec(self).map_err(|e| {
            CwlError::serialization(format!("quantum {} ({})", self.node_id, self.task_label), e)
        })?;
        Ok(NodeId::from_bytes(&canonical))
    }
}

/// Content-derived identifier of a quantum (truncated SHA-256, hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    /// Number of digest bytes kept in the identifier
    pub const DIGEST_BYTES: usize = 16;

    pub fn from_bytes(data: &[u8]) -> Self {
        use sha2::{Digest, Sha256};
        let hash = Sha256::digest(data);
        Self(hex::encode(&hash[..Self::DIGEST_BYTES]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of the step running this node (`<id>_job`)
    pub fn job(&self) -> String {
        format!("{}_job", self.0)
    }

    /// Name of the node's stdout output (`<id>_output`)
    pub fn output(&self) -> String {
        format!("{}_output", self.0)
    }

    /// Workflow input and data entry carrying the node payload (`<id>_quantum`)
    pub fn quantum(&self) -> String {
        format!("{}_quantum", self.0)
    }

    /// Reference to this node's output from another step
    pub fn output_ref(&self) -> String {
        format!("{}/{}", self.job(), self.output())
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_node() -> QuantumNode {
        let mut node = QuantumNode::new("isr");
        node.data_id.insert("visit".to_string(), json!(42));
        node.data_id.insert("detector".to_string(), json!(7));
        node
    }

    #[test]
    fn test_node_id_is_stable() {
        let node = create_test_node();
        let first = node.derive_id().unwrap();
        let second = node.clone().derive_id().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.as_str().len(), NodeId::DIGEST_BYTES * 2);
        assert!(first.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_node_id_depends_on_content() {
        let node = create_test_node();
        let mut other = node.clone();
        other.data_id.insert("detector".to_string(), json!(8));

        assert_ne!(node.derive_id().unwrap(), other.derive_id().unwrap());
    }

    #[test]
    fn test_node_id_names() {
        let id = NodeId("abc".to_string());
        assert_eq!(id.job(), "abc_job");
        assert_eq!(id.output(), "abc_output");
        assert_eq!(id.quantum(), "abc_quantum");
        assert_eq!(id.output_ref(), "abc_job/abc_output");
    }
}
