use canvasflow::prelude::*;
use clap::Parser;
use rand::{Rng, rngs::ThreadRng};
use serde_json::json;
use std::fs;

/// A CLI tool to generate random layered canvases for exercising propagation
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated canvas JSON to
    #[arg(short, long, default_value = "generated_canvas.json")]
    output: String,

    /// Number of transform layers between the readers and the writers
    #[arg(long, default_value_t = 4)]
    layers: usize,

    /// Number of nodes per layer
    #[arg(long, default_value_t = 3)]
    width: usize,

    /// Number of columns in each reader's schema
    #[arg(long, default_value_t = 6)]
    columns: usize,
}

const TRANSFORMS: [&str; 6] = ["filter", "sort", "convert-type", "rest-client", "uniq-row", "log"];
const TYPES: [ColumnType; 5] = [
    ColumnType::String,
    ColumnType::Integer,
    ColumnType::Number,
    ColumnType::Boolean,
    ColumnType::Date,
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    if cli.width == 0 {
        eprintln!("Error: --width must be at least 1");
        std::process::exit(1);
    }

    println!(
        "Generating canvas ({} layer(s) of {} node(s), {} reader column(s))...",
        cli.layers, cli.width, cli.columns
    );

    // Edges only ever point to the next layer, so the canvas stays acyclic.
    let mut store = GraphStore::new();
    let mut previous: Vec<String> = Vec::new();
    let total_layers = cli.layers + 2;
    for layer in 0..total_layers {
        let mut current = Vec::with_capacity(cli.width);
        for slot in 0..cli.width {
            let node = if layer == 0 {
                generate_reader(&mut rng, slot, cli.columns)
            } else if layer + 1 == total_layers {
                Node::new(format!("writer-{}", slot), "csv-writer", format!("Writer {}", slot))
            } else {
                generate_transform(&mut rng, layer, slot)
            };
            let node = node.at(Position::new(layer as f64 * 250.0, slot as f64 * 120.0));
            current.push(node.id.clone());
            store.add_node(node);
        }

        for target in &current {
            if previous.is_empty() {
                break;
            }
            let source = &previous[rng.random_range(0..previous.len())];
            store.connect(EdgeEndpoints::new(source.as_str(), target.as_str()))?;
        }
        previous = current;
    }

    let report = store.propagate_all();
    println!(
        "-> Generated {} node(s), {} edge(s); {} schema(s) derived.",
        store.node_count(),
        store.edge_count(),
        report.updated.len()
    );

    fs::write(&cli.output, store.to_canvas().to_json_pretty()?)?;
    println!("Successfully saved canvas to '{}'", cli.output);

    Ok(())
}

fn generate_reader(rng: &mut ThreadRng, slot: usize, columns: usize) -> Node {
    let schema = (0..columns)
        .map(|i| {
            let column_type = TYPES[rng.random_range(0..TYPES.len())];
            Column::new(format!("col_{}", i), column_type).nullable(rng.random_bool(0.3))
        })
        .collect();
    Node::new(format!("reader-{}", slot), "csv-reader", format!("Reader {}", slot))
        .with_config(config(json!({ "path": format!("input_{}.csv", slot) })))
        .with_schema(schema)
}

fn generate_transform(rng: &mut ThreadRng, layer: usize, slot: usize) -> Node {
    let component_type = TRANSFORMS[rng.random_range(0..TRANSFORMS.len())];
    let node = Node::new(
        format!("{}-{}-{}", component_type, layer, slot),
        component_type,
        format!("{} {}.{}", component_type, layer, slot),
    );
    if component_type == "convert-type" {
        node.with_config(config(json!({ "conversions": { "col_0": "string" } })))
    } else {
        node
    }
}

fn config(value: serde_json::Value) -> Config {
    value.as_object().cloned().unwrap_or_default()
}
