use super::document::{
    CommandLineTool, CwlType, DocumentClass, StepInput, ToolInput, ToolOutput, WorkflowStep,
};
use indexmap::IndexMap;

/// Declarative description of a command-line step
#[derive(Debug, Clone)]
pub struct StepDescription {
    /// Step parameter bindings (`in`)
    pub ins: IndexMap<String, StepInput>,
    /// Output names (`out`)
    pub outs: Vec<String>,
    pub command: String,
    /// File name capturing the tool's stdout
    pub stdout: String,
    /// Declared tool inputs
    pub inputs: IndexMap<String, ToolInput>,
    /// Name of the single stdout-typed tool output
    pub output_key: String,
}

/// Assemble a workflow step running a `CommandLineTool`
pub fn make_step(description: StepDescription) -> WorkflowStep {
    let StepDescription {
        ins,
        outs,
        command,
        stdout,
        inputs,
        output_key,
    } = description;

    let mut outputs = IndexMap::new();
    outputs.insert(
        output_key,
        ToolOutput {
            output_type: CwlType::Stdout,
        },
    );

    WorkflowStep {
        inputs: ins,
        outputs: outs,
        run: CommandLineTool {
            class: DocumentClass::CommandLineTool,
            base_command: command,
            stdout,
            inputs,
            outputs,
        },
    }
}
