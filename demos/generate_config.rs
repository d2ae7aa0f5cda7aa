//! Generate default engine configuration file
//!
//! Creates a JSON config with all default parameters

use chroma_assay::EngineConfig;
use std::{env, path::Path, process};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <output_config.json>", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  {} config/engine.json", args[0]);
        process::exit(1);
    }

    let output_path = Path::new(&args[1]);

    // Create parent directory if needed
    if let Some(parent) = output_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("Error creating directory: {}", e);
            process::exit(1);
        }
    }

    let config = EngineConfig::default();

    match config.to_json_file(output_path) {
        Ok(()) => {
            eprintln!("Configuration saved to {}", output_path.display());
            eprintln!();
            eprintln!("Config summary:");
            eprintln!("  Catalog: {}", config.catalog.path.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "embedded default".to_string()));
            eprintln!("  LOD = {:.1}·Syx/|m|, LOQ = {:.1}·Syx/|m|",
                     config.quality.lod_factor,
                     config.quality.loq_factor);
            eprintln!("  Prediction: negatives {:?}, roots {:?}, ties {:?}",
                     config.prediction.negative_policy,
                     config.prediction.root_selection,
                     config.prediction.tie_break);
        }
        Err(e) => {
            eprintln!("Error saving configuration: {}", e);
            process::exit(1);
        }
    }
}
