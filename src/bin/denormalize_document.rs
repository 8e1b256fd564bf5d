//! Document Denormalizer Binary
//!
//! Reads a compound document and prints the per-type output mapping as JSON.
//! On a validation failure the structured error object is printed to stdout
//! and the process exits with status 1.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DOC_TYPES_PATH`: JSON file mapping type name → definition (optional)
//! - `DOC_NEST_RELATIONSHIPS`: inline included records (default: off)
//! - `DOC_DESERIALIZE_INCLUDED`: keep the whole included pool (default: off)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! DOC_TYPES_PATH=types.json cargo run --bin denormalize_document -- document.json
//! cat document.json | cargo run --bin denormalize_document
//! ```

use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use compound_doc_kernel::{Denormalizer, DeserializeOptions, InMemoryTypeRegistry};

/// Environment variable naming the type definitions file.
const TYPES_PATH_ENV: &str = "DOC_TYPES_PATH";

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "denormalize_document=info,compound_doc_kernel=info".into());

    if log_format == "pretty" {
        // Pretty format for local development
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true)
            )
            .init();
    }
}

fn load_registry() -> Result<InMemoryTypeRegistry, Box<dyn std::error::Error>> {
    match std::env::var(TYPES_PATH_ENV) {
        Ok(path) if !path.is_empty() => {
            let config: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
            let registry = InMemoryTypeRegistry::from_json(&config)?;
            info!(
                path = %path,
                type_count = registry.len(),
                registry_fingerprint = %registry.fingerprint(),
                "Type registry loaded"
            );
            Ok(registry)
        }
        _ => {
            info!("{} not set, using default type definitions", TYPES_PATH_ENV);
            Ok(InMemoryTypeRegistry::new())
        }
    }
}

fn read_document() -> Result<Value, Box<dyn std::error::Error>> {
    let raw = match std::env::args().nth(1) {
        Some(path) if path != "-" => std::fs::read_to_string(path)?,
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&raw)?)
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let registry = load_registry()?;
    let options = DeserializeOptions::from_env();
    info!(
        nest_deserialized_relationships = options.nest_deserialized_relationships,
        deserialize_included = options.deserialize_included,
        params_hash = %options.params_hash(),
        "Options loaded"
    );

    let document = read_document()?;
    let denormalizer = Denormalizer::new(Arc::new(registry), options);

    let start = Instant::now();
    let result = denormalizer.deserialize(&document);
    let latency_us = start.elapsed().as_micros() as u64;

    match result {
        Ok(output) => {
            info!(
                types = output.len(),
                records = output.record_count(),
                latency_us = latency_us,
                "Document denormalized"
            );
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(status = e.status(), title = e.title(), detail = e.detail(), "Document rejected");
            println!("{}", serde_json::to_string_pretty(&e.to_error_object())?);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting document denormalizer");

    match run() {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Denormalizer failed");
            ExitCode::FAILURE
        }
    }
}
