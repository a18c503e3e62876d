use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use workflow_canvas::error::ModelError;
use workflow_canvas::model::{ConnectionDefinition, IntoWorkflow};
use workflow_canvas::prelude::*;

// --- Compact input format ---
// Ports are plain id lists and coordinates use `x`/`y` keys on the node itself.

#[derive(Deserialize)]
struct CompactWorkflow {
    #[serde(default)]
    steps: Vec<CompactStep>,
    #[serde(default)]
    inputs: Vec<CompactParameter>,
    #[serde(default)]
    outputs: Vec<CompactParameter>,
    #[serde(default)]
    links: Vec<CompactLink>,
}

#[derive(Deserialize)]
struct CompactStep {
    id: String,
    label: Option<String>,
    #[serde(default, rename = "in")]
    inputs: Vec<String>,
    #[serde(default, rename = "out")]
    outputs: Vec<String>,
    run: Option<String>,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
}

#[derive(Deserialize)]
struct CompactParameter {
    id: String,
    label: Option<String>,
    #[serde(rename = "type")]
    type_name: Option<String>,
    items: Option<String>,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
}

#[derive(Deserialize)]
struct CompactLink {
    from: String,
    to: String,
}

impl CompactParameter {
    fn param_type(&self) -> Option<ParameterType> {
        self.type_name.as_deref().map(|type_name| ParameterType {
            type_name: type_name.to_string(),
            items: self.items.clone(),
        })
    }
}

impl IntoWorkflow for CompactWorkflow {
    fn into_workflow(self) -> std::result::Result<WorkflowDocument, ModelError> {
        let steps = self
            .steps
            .into_iter()
            .map(|raw| {
                let mut step = StepModel::new(&raw.id).at(raw.x, raw.y);
                step.label = raw.label;
                for port in &raw.inputs {
                    step = step.with_input(port);
                }
                for port in &raw.outputs {
                    step = step.with_output(port);
                }
                match &raw.run {
                    Some(class) => step.with_run_class(class),
                    None => step,
                }
            })
            .collect();

        let inputs = self
            .inputs
            .iter()
            .map(|raw| {
                let mut input = InputModel::new(&raw.id).at(raw.x, raw.y);
                input.0.label = raw.label.clone();
                input.0.param_type = raw.param_type();
                input
            })
            .collect();

        let outputs = self
            .outputs
            .iter()
            .map(|raw| {
                let mut output = OutputModel::new(&raw.id).at(raw.x, raw.y);
                output.0.label = raw.label.clone();
                output.0.param_type = raw.param_type();
                output
            })
            .collect();

        let connections = self
            .links
            .into_iter()
            .map(|link| ConnectionDefinition {
                source: link.from,
                destination: link.to,
            })
            .collect();

        Ok(WorkflowDocument {
            steps,
            inputs,
            outputs,
            connections,
        })
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputFormat {
    /// The crate's own document format
    Native,
    /// Id lists for ports and `from`/`to` links
    Compact,
}

/// Renders a workflow document to SVG markup
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the workflow JSON file
    workflow_path: String,

    /// Format of the workflow file
    #[arg(short, long, value_enum, default_value_t = InputFormat::Native)]
    format: InputFormat,

    /// Where to write the markup; stdout when omitted
    #[arg(short, long)]
    output: Option<String>,

    /// Viewport width in pixels
    #[arg(long, default_value_t = 1024.0)]
    width: f64,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 768.0)]
    height: f64,

    /// Fit the workflow into the viewport
    #[arg(long)]
    fit: bool,

    /// Zoom level to apply after drawing (and after fitting)
    #[arg(long)]
    scale: Option<f64>,

    /// Also save a binary snapshot of the rendered scene
    #[arg(long)]
    snapshot: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run_render(cli);
}

fn run_render(cli: Cli) {
    let total_start = Instant::now();

    // --- 1. Loading ---
    let load_start = Instant::now();
    let json = fs::read_to_string(&cli.workflow_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read workflow file '{}': {}",
            &cli.workflow_path, e
        ))
    });
    let model = match cli.format {
        InputFormat::Native => WorkflowModel::from_json(&json),
        InputFormat::Compact => serde_json::from_str::<CompactWorkflow>(&json)
            .map_err(|e| ModelError::JsonParseError(e.to_string()))
            .and_then(WorkflowModel::from_document),
    }
    .unwrap_or_else(|e| exit_with_error(&format!("Failed to load workflow: {}", e)));
    let load_duration = load_start.elapsed();

    // --- 2. Drawing ---
    let draw_start = Instant::now();
    let scene = Scene::new(Rect::new(0.0, 0.0, cli.width, cli.height));
    let workflow = Workflow::new(scene, model.clone())
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to draw workflow: {}", e)));
    if cli.fit {
        workflow
            .fit_to_viewport(false)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to fit workflow: {}", e)));
    }
    if let Some(scale) = cli.scale {
        workflow
            .set_scale(scale)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to scale workflow: {}", e)));
    }
    let draw_duration = draw_start.elapsed();

    // --- 3. Output ---
    let scene = workflow.scene();
    let markup = scene.to_markup(scene.root());
    match &cli.output {
        Some(path) => fs::write(path, &markup).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to write markup to '{}': {}", path, e))
        }),
        None => println!("{}", markup),
    }
    if let Some(path) = &cli.snapshot {
        let snapshot = scene
            .snapshot(scene.root())
            .unwrap_or_else(|| exit_with_error("Scene root is missing"));
        snapshot
            .save(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to save snapshot: {}", e)));
    }

    let root = scene.root();
    let nodes = scene
        .query_selector_all(root, ".node")
        .map(|n| n.len())
        .unwrap_or(0);
    let edges = scene
        .query_selector_all(root, ".edge")
        .map(|e| e.len())
        .unwrap_or(0);

    eprintln!("\n--- Scene Summary ---");
    eprintln!("Steps:                {}", model.to_document().steps.len());
    eprintln!("Rendered Nodes:       {}", nodes);
    eprintln!("Rendered Edges:       {}", edges);
    eprintln!("Scale:                {}", workflow.scale());
    eprintln!("Transform:            {}", workflow.transform());
    eprintln!("\n--- Performance Summary ---");
    eprintln!("Loading:              {:?}", load_duration);
    eprintln!("Drawing:              {:?}", draw_duration);
    eprintln!("-----------------------------");
    eprintln!("Total Execution:      {:?}", total_start.elapsed());
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
