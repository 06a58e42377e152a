//! JSON:API include CLI
//!
//! Command-line interface for resolving included resources over a resource document.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use jsonapi_include::{
    load_document, load_json_auto, render_included, validate_document, IncludeParams,
    IncludedRelationshipExtractor, RequestContext, ValidateError,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jsonapi-include")]
#[command(about = "Resolve JSON:API included relationships over a resource document")]
#[command(version)]
struct Cli {
    /// Log walk decisions to stderr (same as RUST_LOG=jsonapi_include=trace)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the included resources for one or more root resources
    Extract {
        /// Resource document: file path or URL (http:// or https://)
        document: String,

        /// Key of a root resource (repeat for a collection response)
        #[arg(long, required = true)]
        root: Vec<String>,

        /// Resource type of the requested element (used by bare include=)
        #[arg(long)]
        element: Option<String>,

        /// Include query string, e.g. "include[authors]=books,profile"
        #[arg(long, default_value = "")]
        include: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a resource document
    Validate {
        /// Resource document: file path or URL
        document: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Parse an include query string and print the per-type paths
    ParseInclude {
        /// Query string, e.g. "include[authors]=books&include[books]=author"
        query: String,

        /// Resource type of the requested element (used by bare include=)
        #[arg(long)]
        element: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Extract {
            document,
            root,
            element,
            include,
            output,
            pretty,
        } => run_extract(ExtractArgs {
            document,
            roots: root,
            element,
            include,
            output,
            pretty,
        }),
        Commands::Validate { document, json } => run_validate(&document, json),
        Commands::ParseInclude { query, element } => run_parse_include(&query, element.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("jsonapi_include=trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

struct ExtractArgs {
    document: String,
    roots: Vec<String>,
    element: Option<String>,
    include: String,
    output: Option<PathBuf>,
    pretty: bool,
}

fn run_extract(args: ExtractArgs) -> Result<(), u8> {
    let ExtractArgs {
        document: source,
        roots,
        element,
        include,
        output,
        pretty,
    } = args;

    let document = load_document(&source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let params = IncludeParams::parse(&include, element.as_deref()).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let mut handles = Vec::with_capacity(roots.len());
    for key in &roots {
        let handle = document.graph.find(key).ok_or_else(|| {
            eprintln!("Error: no resource with key '{}'", key);
            2u8
        })?;
        handles.push(handle);
    }

    let mut context = RequestContext::new(params);
    context.element_name = element;

    let accessor = document.accessor();
    let included = IncludedRelationshipExtractor::new(&accessor).extract_all(handles, &context);
    debug!(roots = roots.len(), included = included.len(), "extraction finished");

    let rendered = render_included(&included);
    let json_output = if pretty {
        serde_json::to_string_pretty(&rendered)
    } else {
        serde_json::to_string(&rendered)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_validate(source: &str, json_output: bool) -> Result<(), u8> {
    let value = load_json_auto(source).map_err(|e| {
        report_error(json_output, &format!("loading document: {}", e));
        e.exit_code() as u8
    })?;

    match validate_document(&value) {
        Ok(document) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": true,
                    "types": document.registry.len(),
                    "resources": document.graph.len(),
                });
                println!("{}", output);
            } else {
                println!(
                    "Valid ({} types, {} resources)",
                    document.registry.len(),
                    document.graph.len()
                );
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(ValidateError::Load(e)) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        let output = serde_json::json!({ "valid": false, "error": msg });
        println!("{}", output);
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn run_parse_include(query: &str, element: Option<&str>) -> Result<(), u8> {
    let params = IncludeParams::parse(query, element).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let json_output = serde_json::to_string(&params).map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;
    println!("{}", json_output);
    Ok(())
}
