//! Answer one engine request from a JSON file
//!
//! Reads a `{"taskType", "payload"}` envelope and prints the response
//! envelope to stdout. Logging goes to stderr and follows `RUST_LOG`.

use chroma_assay::{Engine, EngineConfig};
use std::{env, fs, path::Path, process};

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut config_path = None;
    let mut request_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                config_path = Some(args[i + 1].clone());
                i += 1;
            }
            "--help" | "-h" => {
                print_help(&args[0]);
                process::exit(0);
            }
            arg if !arg.starts_with("--") && request_path.is_none() => {
                request_path = Some(arg.to_string());
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                eprintln!("Use --help for usage information");
                process::exit(1);
            }
        }
        i += 1;
    }

    let Some(request_path) = request_path else {
        print_help(&args[0]);
        process::exit(1);
    };

    let config = match config_path {
        Some(path) => EngineConfig::from_json_file(Path::new(&path)).unwrap_or_else(|e| {
            eprintln!("Error: {}", e.user_message());
            eprintln!("Details: {}", e);
            process::exit(1);
        }),
        None => EngineConfig::default(),
    };

    let engine = Engine::new(config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e.user_message());
        eprintln!("Details: {}", e);
        process::exit(1);
    });

    let request = fs::read_to_string(&request_path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", request_path, e);
        process::exit(1);
    });

    println!("{}", engine.handle_json(&request));
}

fn print_help(program: &str) {
    eprintln!("Usage: {} [--config <engine.json>] <request.json>", program);
    eprintln!();
    eprintln!("Task types: calculateMetrics, generateRegressions,");
    eprintln!("            predictConcentrations, processRegionData");
}
