use clap::Parser;
use rand::Rng;
use rand::rngs::ThreadRng;
use std::fs;
use workflow_canvas::graph::ConnectionId;
use workflow_canvas::graph::connectable::PortSide;
use workflow_canvas::model::ConnectionDefinition;
use workflow_canvas::prelude::*;

const COLUMN_SPACING: f64 = 250.0;
const ROW_SPACING: f64 = 120.0;

/// A CLI tool to generate random layered workflows for the canvas renderer
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_workflow.json")]
    output: String,

    /// Number of step columns between the inputs and the outputs
    #[arg(long, default_value_t = 4)]
    layers: usize,

    /// The minimum number of steps per column
    #[arg(long, default_value_t = 1)]
    min: usize,

    /// The maximum number of steps per column
    #[arg(long, default_value_t = 4)]
    max: usize,

    /// Number of workflow inputs
    #[arg(long, default_value_t = 2)]
    inputs: usize,

    /// Number of workflow outputs
    #[arg(long, default_value_t = 1)]
    outputs: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    if cli.min == 0 || cli.min > cli.max {
        eprintln!(
            "Error: --min ({}) must be at least 1 and not greater than --max ({})",
            cli.min, cli.max
        );
        std::process::exit(1);
    }

    println!(
        "Generating workflow ({} layers, {} to {} steps per layer)...",
        cli.layers, cli.min, cli.max
    );

    let mut document = WorkflowDocument::default();

    // Column 0 holds the workflow inputs; their out-side ids feed the first layer.
    let mut previous: Vec<String> = (0..cli.inputs)
        .map(|i| {
            let id = format!("input_{}", i);
            document.inputs.push(
                InputModel::new(&id)
                    .with_type(ParameterType::new("File"))
                    .at(0.0, i as f64 * ROW_SPACING),
            );
            ConnectionId::new(PortSide::Out, &id, &id).to_string()
        })
        .collect();
    println!("-> Generated {} inputs.", cli.inputs);

    for layer in 0..cli.layers {
        let x = (layer + 1) as f64 * COLUMN_SPACING;
        let count = rng.random_range(cli.min..=cli.max);
        let mut produced = Vec::with_capacity(count);

        for row in 0..count {
            let id = format!("step_{}_{}", layer, row);
            let fan_in = if previous.is_empty() {
                0
            } else {
                rng.random_range(1..=previous.len().min(3))
            };
            let mut step = StepModel::new(&id)
                .with_label(&format!("Step {}.{}", layer, row))
                .with_output("out")
                .at(x, row as f64 * ROW_SPACING);
            if rng.random_bool(0.3) {
                step = step.with_run_class("ExpressionTool");
            }

            for port in 0..fan_in {
                let port_id = format!("in_{}", port);
                step = step.with_input(&port_id);
                document.connections.push(ConnectionDefinition {
                    source: pick(&mut rng, &previous).to_string(),
                    destination: ConnectionId::new(PortSide::In, &id, &port_id).to_string(),
                });
            }

            produced.push(ConnectionId::new(PortSide::Out, &id, "out").to_string());
            document.steps.push(step);
        }

        println!("-> Generated layer {} with {} steps.", layer, count);
        if !produced.is_empty() {
            previous = produced;
        }
    }

    let x = (cli.layers + 1) as f64 * COLUMN_SPACING;
    for i in 0..cli.outputs {
        let id = format!("output_{}", i);
        document
            .outputs
            .push(OutputModel::new(&id).at(x, i as f64 * ROW_SPACING));
        if !previous.is_empty() {
            document.connections.push(ConnectionDefinition {
                source: pick(&mut rng, &previous).to_string(),
                destination: ConnectionId::new(PortSide::In, &id, &id).to_string(),
            });
        }
    }
    println!("-> Generated {} outputs.", cli.outputs);

    // Several ports may pick the same upstream source; the model refuses duplicates.
    document.connections.sort_by(|a, b| {
        (&a.source, &a.destination).cmp(&(&b.source, &b.destination))
    });
    document
        .connections
        .dedup_by(|a, b| a.source == b.source && a.destination == b.destination);

    let json_output = document.to_json()?;
    fs::write(&cli.output, json_output)?;

    println!(
        "Successfully generated and saved workflow to '{}'",
        cli.output
    );

    Ok(())
}

fn pick<'a>(rng: &mut ThreadRng, candidates: &'a [String]) -> &'a str {
    &candidates[rng.random_range(0..candidates.len())]
}
