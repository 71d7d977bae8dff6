use crate::config::CliConfig;
use anyhow::{Context, Result};
use clap::Args;
use quanta_cwl_core::cwl::DataDocument;
use quanta_cwl_core::{CwlBuilder, GraphSpec, PayloadCodec, QuantumGraph};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Quantum graph description (JSON)
    #[arg(short, long)]
    pub graph: PathBuf,

    /// Execution context handle to embed (JSON)
    #[arg(long)]
    pub context: PathBuf,

    /// Directory the documents are written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Base name of the generated files
    #[arg(short, long, default_value = "workflow")]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Data document produced by `build`
    #[arg(short, long)]
    pub data: PathBuf,

    /// Entry to decode (e.g. `pipeline` or `<id>_quantum`)
    #[arg(short, long)]
    pub key: String,
}

/// Translate a graph file and write `<name>.cwl` and `<name>_data.yaml`
pub fn build(config: &CliConfig, args: &BuildArgs) -> Result<(PathBuf, PathBuf)> {
    let spec: GraphSpec = read_json(&args.graph).context("Failed to load quantum graph")?;
    let context: serde_json::Value =
        read_json(&args.context).context("Failed to load execution context")?;

    let graph = QuantumGraph::from_spec(&spec).context("Invalid quantum graph")?;
    let documents = CwlBuilder::translate(&config.translator, &graph, &context)
        .context("Failed to translate quantum graph")?;
    let (workflow, data) = documents.to_yaml_strings()?;

    std::fs::create_dir_all(&args.output_dir).context("Failed to create output directory")?;
    let workflow_path = args.output_dir.join(format!("{}.cwl", args.name));
    let data_path = args.output_dir.join(format!("{}_data.yaml", args.name));

    std::fs::write(&workflow_path, workflow).context("Failed to write workflow document")?;
    std::fs::write(&data_path, data).context("Failed to write data document")?;

    Ok((workflow_path, data_path))
}

/// Decode one data document entry and render it as pretty JSON
pub fn decode(config: &CliConfig, args: &DecodeArgs) -> Result<String> {
    let content = std::fs::read_to_string(&args.data).context("Failed to read data document")?;
    let data: DataDocument =
        serde_yaml_ng::from_str(&content).context("Failed to parse data document")?;

    let codec = PayloadCodec::new(config.translator.compression_level);
    let bytes = data.decode_entry(&args.key, &codec)?;
    let value: serde_json::Value =
        serde_json::from_slice(&bytes).context("Entry does not hold a JSON payload")?;

    Ok(serde_json::to_string_pretty(&value)?)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
