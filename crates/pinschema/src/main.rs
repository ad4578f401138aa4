//! Pinschema
//!
//! Command line front end for the pin connection rules: type compatibility,
//! connection verdicts on graph files, link validation and default literals.

mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use pin_schema::{ConnectionVerdict, DefaultValue, Graph, GraphDef, PinAddress, PinSchema};
use pin_types::{PinType, TypeDatabase, parse_pin_type};

use crate::config::PinschemaConfig;

/// Pin type compatibility and conversion queries
#[derive(Parser, Debug)]
#[command(name = "pinschema")]
#[command(about = "Pin type compatibility and conversion queries", long_about = None)]
struct Args {
    /// Configuration file
    #[arg(long, default_value = "pinschema.toml")]
    config: PathBuf,

    /// Type manifest (TOML)
    #[arg(short, long)]
    types: Option<PathBuf>,

    /// Class that `self` pins resolve to
    #[arg(long)]
    context: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether an output type may feed an input type, e.g. `int float`
    Check { output: String, input: String },

    /// Ask whether two pins of a graph file may be connected
    Connect {
        /// Graph file (JSON)
        #[arg(short, long)]
        graph: PathBuf,
        /// First pin, as node.pin
        a: PinAddress,
        /// Second pin, as node.pin
        b: PinAddress,
    },

    /// List the links of a pin that no longer type-check
    ValidateLinks {
        /// Graph file (JSON)
        #[arg(short, long)]
        graph: PathBuf,
        /// Pin to inspect, as node.pin
        pin: PinAddress,
    },

    /// Validate a default literal, or print the autogenerated one
    Default {
        pin_type: String,
        value: Option<String>,
    },
}

#[derive(Serialize)]
struct DefaultReport {
    pin_type: String,
    value: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Exits with a failure status when the connection or link check is refused
fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut config = PinschemaConfig::load_from(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;
    if args.types.is_some() {
        config.types = args.types.clone();
    }
    if args.context.is_some() {
        config.calling_context = args.context.clone();
    }
    config.validate().map_err(|e| anyhow!(e))?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let db = load_types(&config)?;
    let calling_context = config
        .calling_context
        .as_deref()
        .map(|name| {
            db.lookup(name)
                .ok_or_else(|| anyhow!("Calling context class not found: {name}"))
        })
        .transpose()?;
    let schema = PinSchema::new(&db).with_calling_context(calling_context);
    debug!(?schema, "Schema ready");

    let passed = match args.command {
        Command::Check { output, input } => {
            let output = parse_pin_type(&output, &db)?;
            let input = parse_pin_type(&input, &db)?;
            let verdict = schema.check_types(&output, &input);
            print_verdict(&verdict, args.json)?;
            verdict.is_allowed()
        }
        Command::Connect { graph, a, b } => {
            let graph = load_graph(&graph, &db)?;
            let verdict = schema.can_create_connection(&graph, &a, &b);
            print_verdict(&verdict, args.json)?;
            verdict.is_allowed()
        }
        Command::ValidateLinks { graph, pin } => {
            let graph = load_graph(&graph, &db)?;
            if graph.pin(&pin).is_none() {
                return Err(anyhow!("Pin not found: {pin}"));
            }
            let invalid = schema.find_invalid_links(&graph, &pin);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&invalid)?);
            } else if invalid.is_empty() {
                println!("All links of {pin} are valid");
            } else {
                for peer in &invalid {
                    println!("{pin} -> {peer}: incompatible");
                }
            }
            invalid.is_empty()
        }
        Command::Default { pin_type, value } => {
            let parsed = parse_pin_type(&pin_type, &db)?;
            let report = default_report(&schema, &pin_type, &parsed, value);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                match &report.message {
                    None => println!("{:?} is valid for {}", report.value, report.pin_type),
                    Some(message) => println!("{message}"),
                }
            }
            report.valid
        }
    };

    Ok(exit_status(passed))
}

fn exit_status(passed: bool) -> ExitCode {
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn load_types(config: &PinschemaConfig) -> Result<TypeDatabase> {
    let db = match &config.types {
        Some(path) => TypeDatabase::load(path)
            .with_context(|| format!("Failed to load types from {}", path.display()))?,
        None => TypeDatabase::with_engine_types(),
    };
    info!(types = db.len(), "Type database loaded");
    Ok(db)
}

fn load_graph(path: &Path, db: &TypeDatabase) -> Result<Graph> {
    let graph = GraphDef::load(path)?
        .resolve(db)
        .with_context(|| format!("Invalid graph {}", path.display()))?;
    Ok(graph)
}

fn default_report(
    schema: &PinSchema<'_>,
    text: &str,
    pin_type: &PinType,
    value: Option<String>,
) -> DefaultReport {
    let value = value.unwrap_or_else(|| schema.autogenerated_default(pin_type));
    let result = schema.validate_default_value(pin_type, "value", &DefaultValue::string(value.clone()));
    DefaultReport {
        pin_type: pin_type.display(schema.reflection()).to_string(),
        value,
        valid: result.is_ok(),
        message: result.err().map(|e| format!("{text}: {e}")),
    }
}

fn print_verdict(verdict: &ConnectionVerdict, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(verdict)?);
        return Ok(());
    }

    if verdict.reason.is_empty() {
        println!("{}", verdict.outcome);
    } else {
        println!("{}: {}", verdict.outcome, verdict.reason);
    }
    if let Some(plan) = &verdict.conversion {
        println!("  via {plan}");
    }
    Ok(())
}
