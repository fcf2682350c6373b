use canvasflow::prelude::*;
use clap::Parser;
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Loads a saved job canvas, re-propagates every schema and prints the result
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the canvas JSON file
    canvas_path: String,

    /// Write the propagated canvas to this path
    #[arg(short, long)]
    output: Option<String>,

    /// Treat cycles as allowed instead of rejecting them
    #[arg(long)]
    tolerate_cycles: bool,

    /// Alias a custom component type to a built-in one, as `custom=builtin`
    #[arg(short, long = "alias", value_name = "CUSTOM=BUILTIN")]
    aliases: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let total_start = Instant::now();

    // --- 1. Store setup ---
    let policy = if cli.tolerate_cycles {
        CyclePolicy::Tolerate
    } else {
        CyclePolicy::Reject
    };
    let mut builder = GraphStore::builder().cycle_policy(policy);
    for alias in &cli.aliases {
        let Some((custom, builtin)) = alias.split_once('=') else {
            exit_with_error(&format!("Alias '{}' must look like custom=builtin", alias));
        };
        builder = builder.with_type_alias(custom.trim(), builtin.trim());
    }
    let mut store = builder.build();

    // --- 2. Loading ---
    let json = fs::read_to_string(&cli.canvas_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read canvas file '{}': {}",
            &cli.canvas_path, e
        ))
    });
    store
        .load_json(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load canvas: {}", e)));

    // --- 3. Propagation ---
    let propagate_start = Instant::now();
    let report = store.propagate_all();
    let propagate_duration = propagate_start.elapsed();

    // --- 4. Results ---
    println!(
        "Loaded {} node(s) and {} edge(s) from '{}'",
        store.node_count(),
        store.edge_count(),
        cli.canvas_path
    );
    println!(
        "Propagation visited {} node(s), updated {} in {:?}\n",
        report.visited.len(),
        report.updated.len(),
        propagate_duration
    );
    for node in &store.graph().nodes {
        let marker = if report.updated.contains(&node.id) { "*" } else { " " };
        match node.schema() {
            Some(schema) => println!("{} {} ({}): {}", marker, node.id, node.component_type, schema),
            None => println!("{} {} ({}): <no schema>", marker, node.id, node.component_type),
        }
    }

    if let Some(output) = &cli.output {
        let written = store
            .to_canvas()
            .to_json_pretty()
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize canvas: {}", e)));
        fs::write(output, written)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to write '{}': {}", output, e)));
        println!("\nWrote propagated canvas to '{}'", output);
    }

    println!("\nTotal Execution: {:?}", total_start.elapsed());
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
