use super::document::{
    CwlType, DataDocument, InputBinding, LinkMerge, LinkedSource, StepInput, ToolInput, Workflow,
    WorkflowOutput,
};
use super::step::{make_step, StepDescription};
use crate::config::TranslatorConfig;
use crate::dag::QuantumGraph;
use crate::error::{CwlError, Result};
use crate::payload::PayloadCodec;
use crate::types::{NodeId, TaskDef};
use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::collections::HashMap;

/// Workflow input and data entry carrying the serialized pipeline
pub const PIPELINE_INPUT: &str = "pipeline";
/// Key of the synthetic initialization step
pub const INIT_STEP: &str = "init_job";
/// Output of the initialization step every entry quantum waits on
pub const INIT_OUTPUT: &str = "init_job_output";
pub const INIT_STDOUT: &str = "init_output.txt";
/// Step parameter receiving upstream outputs
pub const DEPENDENCIES_INPUT: &str = "dependencies";

/// The two translation products
#[derive(Debug, Clone, PartialEq)]
pub struct CwlDocuments {
    pub workflow: Workflow,
    pub data: DataDocument,
}

impl CwlDocuments {
    /// Emit the workflow and data documents as YAML, in insertion order
    pub fn to_yaml_strings(&self) -> Result<(String, String)> {
        let workflow = serde_yaml_ng::to_string(&self.workflow).map_err(|source| {
            CwlError::Emit {
                document: "workflow",
                source,
            }
        })?;
        let data = serde_yaml_ng::to_string(&self.data).map_err(|source| CwlError::Emit {
            document: "data",
            source,
        })?;
        Ok((workflow, data))
    }
}

/// Translates a `QuantumGraph` into a workflow document plus the data
/// document holding every payload it references.
///
/// A builder covers exactly one graph: `translate` runs the header, init,
/// per-quantum and finalization phases once each.
pub struct CwlBuilder<'a> {
    config: &'a TranslatorConfig,
    codec: PayloadCodec,
    workflow: Workflow,
    data: DataDocument,
}

impl<'a> CwlBuilder<'a> {
    /// Translate `graph`, embedding `context` as the execution context handle
    pub fn translate<C>(
        config: &'a TranslatorConfig,
        graph: &QuantumGraph,
        context: &C,
    ) -> Result<CwlDocuments>
    where
        C: Serialize + ?Sized,
    {
        config.validate()?;

        tracing::info!("Translating quantum graph with {} quanta", graph.len());

        let ids = derive_ids(graph)?;

        let mut builder = Self::new(config);
        builder.add_init(&graph.task_order())?;

        for index in graph.quanta() {
            builder.add_quantum(graph, index, &ids)?;
        }

        let documents = builder.finish(context)?;

        tracing::info!(
            "Generated workflow with {} steps and {} data entries",
            documents.workflow.steps.len(),
            documents.data.len()
        );

        Ok(documents)
    }

    /// Header phase
    fn new(config: &'a TranslatorConfig) -> Self {
        let mut workflow = Workflow::new(config.cwl_version.clone());
        workflow
            .inputs
            .insert(config.context_input.clone(), CwlType::String);
        workflow
            .inputs
            .insert(PIPELINE_INPUT.to_string(), CwlType::String);

        Self {
            config,
            codec: PayloadCodec::new(config.compression_level),
            workflow,
            data: DataDocument::new(),
        }
    }

    /// Initialization phase. `pipeline` must already be in dependency order.
    fn add_init(&mut self, pipeline: &[&TaskDef]) -> Result<()> {
        let context_input = &self.config.context_input;

        let mut ins = IndexMap::new();
        ins.insert(
            context_input.clone(),
            StepInput::Source(context_input.clone()),
        );
        ins.insert(
            PIPELINE_INPUT.to_string(),
            StepInput::Source(PIPELINE_INPUT.to_string()),
        );

        let mut inputs = IndexMap::new();
        inputs.insert(PIPELINE_INPUT.to_string(), ToolInput::positional(1));
        inputs.insert(context_input.clone(), ToolInput::positional(2));

        let step = make_step(StepDescription {
            ins,
            outs: vec![INIT_OUTPUT.to_string()],
            command: self.config.init_command.clone(),
            stdout: INIT_STDOUT.to_string(),
            inputs,
            output_key: INIT_OUTPUT.to_string(),
        });
        self.workflow.steps.insert(INIT_STEP.to_string(), step);

        let payload = self.codec.encode_plain(PIPELINE_INPUT, pipeline)?;
        self.data.insert(PIPELINE_INPUT, payload);

        tracing::debug!("Added init step for {} tasks", pipeline.len());
        Ok(())
    }

    /// Per-quantum phase: emit the step for one node and store its payload
    fn add_quantum(&mut self, graph: &QuantumGraph, index: NodeIndex, ids: &[NodeId]) -> Result<()> {
        let id = &ids[index.index()];
        let node = graph.node(index);

        let mut sources: Vec<String> = graph
            .predecessors(index)
            .into_iter()
            .map(|pred| ids[pred.index()].output_ref())
            .collect();
        if sources.is_empty() {
            sources.push(format!("{}/{}", INIT_STEP, INIT_OUTPUT));
        }

        // A lone source must still reach the tool as a list
        let link_merge = (sources.len() == 1).then_some(LinkMerge::MergeNested);
        let dependencies = StepInput::Linked(LinkedSource {
            source: sources,
            link_merge,
        });

        let context_input = &self.config.context_input;
        let node_context = format!("{}_{}", id, context_input);
        let node_quantum = id.quantum();

        let mut ins = IndexMap::new();
        ins.insert(DEPENDENCIES_INPUT.to_string(), dependencies);
        ins.insert(node_context.clone(), StepInput::Source(context_input.clone()));
        ins.insert(node_quantum.clone(), StepInput::Source(node_quantum.clone()));

        let mut inputs = IndexMap::new();
        inputs.insert(node_quantum.clone(), ToolInput::positional(1));
        inputs.insert(node_context, ToolInput::positional(2));
        inputs.insert(
            DEPENDENCIES_INPUT.to_string(),
            ToolInput {
                input_type: CwlType::FileArray,
                input_binding: InputBinding {
                    prefix: Some("--deps=".to_string()),
                    item_separator: Some(",".to_string()),
                    separate: Some(false),
                    ..Default::default()
                },
            },
        );

        let step = make_step(StepDescription {
            ins,
            outs: vec![id.output()],
            command: self.config.executor_command.clone(),
            stdout: format!("{}.txt", id.output()),
            inputs,
            output_key: id.output(),
        });

        self.workflow.steps.insert(id.job(), step);
        self.workflow
            .inputs
            .insert(node_quantum.clone(), CwlType::String);
        self.workflow.outputs.insert(
            id.output(),
            WorkflowOutput {
                output_type: CwlType::File,
                output_source: id.output_ref(),
            },
        );

        let what = format!("quantum {} ({})", graph.key(index), node.task_label);
        let payload = self.codec.encode_compressed(&what, node)?;
        self.data.insert(node_quantum, payload);

        tracing::debug!("Added step {} for quantum {}", id.job(), graph.key(index));
        Ok(())
    }

    /// Finalization phase: store the context handle and hand back both documents
    fn finish<C>(mut self, context: &C) -> Result<CwlDocuments>
    where
        C: Serialize + ?Sized,
    {
        let payload = self.codec.encode_plain("context handle", context)?;
        self.data.insert(self.config.context_input.clone(), payload);

        Ok(CwlDocuments {
            workflow: self.workflow,
            data: self.data,
        })
    }
}

/// Derive every node's identifier, indexed by `NodeIndex::index()`.
///
/// Fails if two distinct quanta map to the same identifier, since their
/// steps would overwrite each other. `first` in the error is the quantum
/// declared earlier.
fn derive_ids(graph: &QuantumGraph) -> Result<Vec<NodeId>> {
    let mut ids = vec![NodeId(String::new()); graph.len()];
    let mut seen: HashMap<NodeId, NodeIndex> = HashMap::new();

    for index in graph.node_indices() {
        let id = graph.node(index).derive_id()?;
        if let Some(&first) = seen.get(&id) {
            return Err(CwlError::IdentifierCollision {
                id: id.0,
                first: graph.key(first).to_string(),
                second: graph.key(index).to_string(),
            });
        }
        seen.insert(id.clone(), index);
        ids[index.index()] = id;
    }

    Ok(ids)
}
