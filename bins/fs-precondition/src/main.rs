//! fs-precondition: CLI tool for entity tags and conditional request checks.

mod logging;

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use foodshare_preconditions::tag::{self, TagSource};
use foodshare_preconditions::{
    http_date, DefaultBehavior, EntityTag, PreconditionConfig, PreconditionEvaluator, PreconditionResult,
    RequestConditions, ResponseValidators, VersionDescriptor,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fs-precondition")]
#[command(about = "Entity tag derivation and conditional request evaluation")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive an entity tag from row versions or timestamps
    Tag {
        /// Row version as hex; repeat to XOR several together
        #[arg(long = "hex", value_name = "HEX", conflicts_with = "timestamps")]
        row_versions: Vec<String>,
        /// Modification time (HTTP-date or RFC 3339); repeat to take the latest
        #[arg(long = "timestamp", value_name = "DATE")]
        timestamps: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decode an entity tag (hex, falling back to base64)
    Parse {
        /// Tag, quoted or raw
        tag: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Evaluate conditional headers against a resource version
    Evaluate {
        /// Request method
        #[arg(short, long, default_value = "GET")]
        method: String,
        /// If-Match header value; may repeat
        #[arg(long)]
        if_match: Vec<String>,
        /// If-None-Match header value; may repeat
        #[arg(long)]
        if_none_match: Vec<String>,
        /// If-Modified-Since header value
        #[arg(long)]
        if_modified_since: Option<String>,
        /// If-Unmodified-Since header value
        #[arg(long)]
        if_unmodified_since: Option<String>,
        /// Current row version as hex
        #[arg(long)]
        row_version: Option<String>,
        /// Current modification time
        #[arg(long)]
        modified_on: Option<String>,
        /// Outcome when nothing can be evaluated: pass, fail, bad_request,
        /// precondition_required (defaults to the configured method default)
        #[arg(long)]
        default: Option<String>,
        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print response validators for a resource version
    Validators {
        /// Current row version as hex
        #[arg(long)]
        row_version: Option<String>,
        /// Current modification time
        #[arg(long)]
        modified_on: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    match cli.command {
        Commands::Tag {
            row_versions,
            timestamps,
            json,
        } => {
            let etag = if !row_versions.is_empty() {
                let decoded = row_versions
                    .iter()
                    .map(|v| decode_hex(v))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                let members = decoded.iter().map(|v| Some(v.as_slice())).collect();
                tag::derive(&TagSource::RowVersions(members))?
            } else {
                let parsed = timestamps
                    .iter()
                    .map(|t| parse_date(t))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                tag::derive(&TagSource::Timestamps(&parsed))
                    .context("Provide at least one --hex or --timestamp")?
            };

            if json {
                let output = serde_json::json!({
                    "etag": etag.to_quoted(),
                    "bytes": etag.to_hex(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", etag.to_quoted());
            }
        }

        Commands::Parse { tag: value, json } => {
            let Some(etag) = EntityTag::parse(&value) else {
                eprintln!("Error: not a hex or base64 entity tag: {}", value);
                std::process::exit(1);
            };
            let timestamp = tag::decode_timestamp(etag.as_bytes());

            if json {
                let output = serde_json::json!({
                    "etag": etag.to_quoted(),
                    "bytes": etag.to_hex(),
                    "length": etag.as_bytes().len(),
                    "timestamp": timestamp.map(|t| t.to_rfc3339()),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("Bytes: {}", etag.to_hex());
                println!("Length: {}", etag.as_bytes().len());
                println!("Canonical: {}", etag);
                if let Some(ts) = timestamp {
                    println!("As timestamp: {}", ts.to_rfc3339());
                }
            }
        }

        Commands::Evaluate {
            method,
            if_match,
            if_none_match,
            if_modified_since,
            if_unmodified_since,
            row_version,
            modified_on,
            default,
            config,
            json,
        } => {
            let config = PreconditionConfig::load(config.as_deref())?;
            let evaluator = PreconditionEvaluator::from_config(&config)?;

            let mut conditions = RequestConditions::new();
            for value in &if_match {
                conditions = conditions.with_if_match(value);
            }
            for value in &if_none_match {
                conditions = conditions.with_if_none_match(value);
            }
            conditions.if_modified_since = if_modified_since.as_deref().and_then(http_date::parse);
            conditions.if_unmodified_since = if_unmodified_since.as_deref().and_then(http_date::parse);

            let local = descriptor(row_version.as_deref(), modified_on.as_deref())?;

            let default = match default {
                Some(behavior) => behavior.parse::<DefaultBehavior>()?.to_result(),
                None => evaluator.classifier().default_result_for_method(&method)?,
            };

            let result = evaluator.evaluate(&conditions, &method, &default, &local)?;
            print_result(&result, &ResponseValidators::from_descriptor(&local), json)?;
        }

        Commands::Validators {
            row_version,
            modified_on,
        } => {
            let local = descriptor(row_version.as_deref(), modified_on.as_deref())?;
            let validators = ResponseValidators::from_descriptor(&local);
            if validators.is_empty() {
                eprintln!("No version information given");
                std::process::exit(1);
            }
            if let Some(etag) = &validators.etag {
                println!("ETag: {}", etag);
            }
            if let Some(last_modified) = &validators.last_modified {
                println!("Last-Modified: {}", last_modified);
            }
        }
    }

    Ok(())
}

fn print_result(
    result: &PreconditionResult,
    validators: &ResponseValidators,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        let output = serde_json::json!({
            "result": result.kind(),
            "status": result.status().map(|s| s.as_u16()),
            "reason": result.reason(),
            "etag": validators.etag,
            "last_modified": validators.last_modified,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Result: {}", result.kind());
        if let Some(status) = result.status() {
            println!("Status: {}", status);
        }
        if let Some(reason) = result.reason() {
            println!("Reason: {}", reason);
        }
    }
    Ok(())
}

fn descriptor(row_version: Option<&str>, modified_on: Option<&str>) -> anyhow::Result<VersionDescriptor> {
    Ok(VersionDescriptor {
        row_version: row_version.map(decode_hex).transpose()?,
        modified_on: modified_on.map(parse_date).transpose()?,
    })
}

fn decode_hex(value: &str) -> anyhow::Result<Vec<u8>> {
    hex::decode(value.trim()).with_context(|| format!("Invalid hex row version: {}", value))
}

fn parse_date(value: &str) -> anyhow::Result<DateTime<Utc>> {
    http_date::parse(value).ok_or_else(|| anyhow!("Invalid date: {}", value))
}
