//! Sample circular regions of an assay photograph
//!
//! Usage: sample_image <image> <x,y,radius>... [--reference <index>]
//!
//! Prints each region's mean color and a few analytical responses as JSON.

use chroma_assay::{analyze_image, RegionSample, RegionShape};
use serde_json::json;
use std::{env, path::Path, process};

const SHOWN_KEYS: [&str; 4] = [
    "Signal (RGB - R Component)",
    "Signal (RGB - Euclidean Distance (ΔE_rgb))",
    "Signal (CIELAB - Color Difference (ΔE2000))",
    "Signal (HSV - H Component)",
];

fn parse_circle(id: u32, spec: &str) -> Option<RegionSample> {
    let values: Vec<f64> = spec
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    match values.as_slice() {
        [x, y, radius] => Some(RegionSample::new(
            id,
            RegionShape::Circle { x: *x, y: *y, radius: *radius },
        )),
        _ => None,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <image> <x,y,radius>... [--reference <index>]", args[0]);
        process::exit(1);
    }

    let mut regions = Vec::new();
    let mut reference = None;
    let mut i = 2;
    while i < args.len() {
        if args[i] == "--reference" && i + 1 < args.len() {
            reference = args[i + 1].parse::<u32>().ok();
            i += 2;
            continue;
        }
        let id = regions.len() as u32;
        match parse_circle(id, &args[i]) {
            Some(region) => regions.push(region),
            None => {
                eprintln!("Invalid region '{}', expected x,y,radius", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let summary = match analyze_image(Path::new(&args[1]), &mut regions, reference) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            eprintln!("Details: {}", e);
            process::exit(1);
        }
    };

    let report: Vec<_> = regions
        .iter()
        .map(|region| {
            let responses: serde_json::Map<String, serde_json::Value> = SHOWN_KEYS
                .iter()
                .filter_map(|key| Some((key.to_string(), json!(region.response(key)?))))
                .collect();
            json!({
                "id": region.id,
                "pixelCount": region.color.as_ref().map(|c| c.pixel_count),
                "hex": region.color.as_ref().map(|c| c.hex.clone()),
                "responses": responses,
            })
        })
        .collect();

    let output = json!({
        "regions": report,
        "referenceRequiredButMissing": summary.reference_required_but_missing,
        "failures": summary.failures,
    });
    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Error formatting output: {}", e);
            process::exit(1);
        }
    }
}
