use crate::error::{CwlError, Result};
use crate::types::{QuantumNode, TaskDef};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Topo;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Serialized description of a quantum graph, as produced by the planner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSpec {
    pub tasks: Vec<TaskDef>,
    /// Task label -> labels of the tasks it depends on
    #[serde(default)]
    pub task_dependencies: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub quanta: Vec<QuantumSpec>,
    /// Quantum key -> keys of its predecessors
    #[serde(default)]
    pub dependencies: BTreeMap<String, Vec<String>>,
}

/// A quantum together with the key used to wire it inside a `GraphSpec`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantumSpec {
    pub key: String,
    #[serde(flatten)]
    pub node: QuantumNode,
}

/// Execution DAG: tasks at the coarse level, quanta at the fine level.
///
/// Both levels are verified acyclic on construction, so `task_order` and
/// `quanta` always yield a valid topological order.
pub struct QuantumGraph {
    tasks: DiGraph<TaskDef, ()>,
    graph: DiGraph<QuantumNode, ()>,
    keys: Vec<String>,
}

impl QuantumGraph {
    /// Build the graph from its serialized description
    pub fn from_spec(spec: &GraphSpec) -> Result<Self> {
        let mut tasks = DiGraph::new();
        let mut task_indices = HashMap::new();

        for task in &spec.tasks {
            if task_indices.contains_key(&task.label) {
                return Err(CwlError::structural(format!(
                    "Task {} is defined more than once",
                    task.label
                )));
            }
            let node = tasks.add_node(task.clone());
            task_indices.insert(task.label.clone(), node);
        }

        for (label, prerequisites) in &spec.task_dependencies {
            let task_idx = task_indices.get(label).ok_or_else(|| {
                CwlError::structural(format!(
                    "Task {} referenced in dependencies but not defined",
                    label
                ))
            })?;

            for prerequisite in prerequisites {
                let dep_idx = task_indices.get(prerequisite).ok_or_else(|| {
                    CwlError::structural(format!(
                        "Dependency {} not found for task {}",
                        prerequisite, label
                    ))
                })?;
                tasks.update_edge(*dep_idx, *task_idx, ());
            }
        }

        if petgraph::algo::is_cyclic_directed(&tasks) {
            return Err(CwlError::structural("Task graph contains circular dependencies"));
        }

        let mut graph = DiGraph::new();
        let mut keys = Vec::with_capacity(spec.quanta.len());
        let mut quantum_indices = HashMap::new();

        for quantum in &spec.quanta {
            if !task_indices.contains_key(&quantum.node.task_label) {
                return Err(CwlError::structural(format!(
                    "Quantum {} belongs to undefined task {}",
                    quantum.key, quantum.node.task_label
                )));
            }
            if quantum_indices.contains_key(&quantum.key) {
                return Err(CwlError::structural(format!(
                    "Quantum key {} is used more than once",
                    quantum.key
                )));
            }
            let node = graph.add_node(quantum.node.clone());
            keys.push(quantum.key.clone());
            quantum_indices.insert(quantum.key.clone(), node);
        }

        for (key, predecessors) in &spec.dependencies {
            let node_idx = quantum_indices.get(key).ok_or_else(|| {
                CwlError::structural(format!(
                    "Quantum {} referenced in dependencies but not defined",
                    key
                ))
            })?;

            for predecessor in predecessors {
                let dep_idx = quantum_indices.get(predecessor).ok_or_else(|| {
                    CwlError::structural(format!(
                        "Dependency {} not found for quantum {}",
                        predecessor, key
                    ))
                })?;

                // Edge from producer to consumer (dep -> node), at most one per pair
                graph.update_edge(*dep_idx, *node_idx, ());
            }
        }

        if petgraph::algo::is_cyclic_directed(&graph) {
            return Err(CwlError::structural("Quantum graph contains circular dependencies"));
        }

        Ok(Self { tasks, graph, keys })
    }

    /// Task definitions in topological order (prerequisites first)
    pub fn task_order(&self) -> Vec<&TaskDef> {
        let mut topo = Topo::new(&self.tasks);
        let mut order = Vec::with_capacity(self.tasks.node_count());

        while let Some(node) = topo.next(&self.tasks) {
            order.push(&self.tasks[node]);
        }

        order
    }

    /// Every quantum, in topological order
    pub fn quanta(&self) -> Vec<NodeIndex> {
        let mut topo = Topo::new(&self.graph);
        let mut order = Vec::with_capacity(self.graph.node_count());

        while let Some(node) = topo.next(&self.graph) {
            order.push(node);
        }

        order
    }

    pub fn node(&self, index: NodeIndex) -> &QuantumNode {
        &self.graph[index]
    }

    /// Key the quantum was registered under
    pub fn key(&self, index: NodeIndex) -> &str {
        &self.keys[index.index()]
    }

    /// Quanta whose outputs must exist before `index` may start
    pub fn predecessors(&self, index: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .neighbors_directed(index, Direction::Incoming)
            .collect()
    }

    /// Every quantum, in the order it was declared
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_quantum(key: &str, task: &str) -> QuantumSpec {
        let mut node = QuantumNode::new(task);
        node.data_id.insert("key".to_string(), json!(key));
        QuantumSpec {
            key: key.to_string(),
            node,
        }
    }

    fn deps(pairs: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    fn create_test_spec() -> GraphSpec {
        GraphSpec {
            tasks: vec![TaskDef::new("isr", "IsrTask"), TaskDef::new("calib", "CalibTask")],
            task_dependencies: deps(&[("calib", &["isr"])]),
            quanta: vec![
                create_test_quantum("c", "calib"),
                create_test_quantum("a", "isr"),
                create_test_quantum("b", "isr"),
            ],
            dependencies: deps(&[("c", &["a", "b"])]),
        }
    }

    #[test]
    fn test_task_order() {
        let spec = GraphSpec {
            tasks: vec![
                TaskDef::new("coadd", "CoaddTask"),
                TaskDef::new("calib", "CalibTask"),
                TaskDef::new("isr", "IsrTask"),
            ],
            task_dependencies: deps(&[("coadd", &["calib"]), ("calib", &["isr"])]),
            ..Default::default()
        };

        let graph = QuantumGraph::from_spec(&spec).unwrap();
        let order = graph.task_order();
        let labels: Vec<&str> = order.iter().map(|t| t.label.as_str()).collect();

        assert_eq!(labels, vec!["isr", "calib", "coadd"]);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_quanta_in_dependency_order() {
        let graph = QuantumGraph::from_spec(&create_test_spec()).unwrap();
        let order: Vec<&str> = graph.quanta().into_iter().map(|n| graph.key(n)).collect();

        assert_eq!(order.len(), 3);
        assert_eq!(order[2], "c");
    }

    #[test]
    fn test_predecessors() {
        let graph = QuantumGraph::from_spec(&create_test_spec()).unwrap();
        let c = graph
            .quanta()
            .into_iter()
            .find(|&n| graph.key(n) == "c")
            .unwrap();

        let mut preds: Vec<&str> = graph.predecessors(c).into_iter().map(|n| graph.key(n)).collect();
        preds.sort();
        assert_eq!(preds, vec!["a", "b"]);

        let a = graph.node_indices().find(|&n| graph.key(n) == "a").unwrap();
        assert!(graph.predecessors(a).is_empty());
    }

    #[test]
    fn test_repeated_predecessor_wired_once() {
        let mut spec = create_test_spec();
        spec.dependencies = deps(&[("c", &["a", "a"])]);
        spec.task_dependencies = deps(&[("calib", &["isr", "isr"])]);

        let graph = QuantumGraph::from_spec(&spec).unwrap();
        let c = graph.node_indices().find(|&n| graph.key(n) == "c").unwrap();
        let preds: Vec<&str> = graph.predecessors(c).into_iter().map(|n| graph.key(n)).collect();

        assert_eq!(preds, vec!["a"]);
        assert_eq!(graph.task_order().len(), 2);
    }

    #[test]
    fn test_node_indices_in_declaration_order() {
        let graph = QuantumGraph::from_spec(&create_test_spec()).unwrap();
        let keys: Vec<&str> = graph.node_indices().map(|n| graph.key(n)).collect();

        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_cyclic_graph_rejected() {
        let mut spec = create_test_spec();
        spec.dependencies = deps(&[("a", &["b"]), ("b", &["a"])]);

        let result = QuantumGraph::from_spec(&spec);
        assert!(result.is_err());
        assert!(result
            .err()
            .unwrap()
            .to_string()
            .contains("circular dependencies"));
    }

    #[test]
    fn test_unknown_predecessor_rejected() {
        let mut spec = create_test_spec();
        spec.dependencies = deps(&[("c", &["missing"])]);

        let err = QuantumGraph::from_spec(&spec).err().unwrap();
        assert!(matches!(err, CwlError::Structural(_)));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_undefined_task_rejected() {
        let mut spec = create_test_spec();
        spec.quanta.push(create_test_quantum("d", "measure"));

        let err = QuantumGraph::from_spec(&spec).err().unwrap();
        assert!(err.to_string().contains("undefined task measure"));
    }

    #[test]
    fn test_spec_from_json() {
        let spec: GraphSpec = serde_json::from_value(json!({
            "tasks": [{"label": "isr", "task_class": "IsrTask"}],
            "quanta": [{
                "key": "q1",
                "node_id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
                "task_label": "isr",
                "data_id": {"visit": 1}
            }]
        }))
        .unwrap();

        let graph = QuantumGraph::from_spec(&spec).unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.quanta().len(), 1);
    }
}
