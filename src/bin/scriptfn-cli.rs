//! scriptfn CLI - run and inspect script function providers
//!
//! `serve` speaks the NDJSON provider service on stdin/stdout. `functions`
//! and `call` configure a provider from a script file for quick checks.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use scriptfn::marshal::infer_json;
use scriptfn::provider::{CallFunctionResponse, FunctionProvider, ProviderConfig};
use scriptfn::service::Service;
use scriptfn::wire::{DynamicValue, Type, json};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "scriptfn")]
#[command(about = "Expose script functions as typed provider functions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve provider requests as NDJSON on stdin/stdout
    Serve {
        /// Configure from this script before serving
        #[arg(long)]
        script: Option<PathBuf>,

        /// Compile the script without strict variables
        #[arg(long)]
        no_strict: bool,
    },

    /// List the procedures a script exposes
    Functions {
        /// Script file
        #[arg(long)]
        script: PathBuf,

        /// Compile the script without strict variables
        #[arg(long)]
        no_strict: bool,
    },

    /// Call one procedure with JSON arguments
    Call {
        /// Script file
        #[arg(long)]
        script: PathBuf,

        /// Compile the script without strict variables
        #[arg(long)]
        no_strict: bool,

        /// Procedure name
        name: String,

        /// Arguments as JSON text; types are inferred from their shape
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries protocol output.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { script, no_strict } => {
            let provider = Arc::new(FunctionProvider::new());
            if let Some(path) = script {
                configure(&provider, &path, !no_strict)?;
            }
            let service = Service::new(provider);
            let stdin = io::stdin();
            service.run(stdin.lock(), io::stdout().lock())?;
        }
        Commands::Functions { script, no_strict } => {
            let provider = FunctionProvider::new();
            configure(&provider, &script, !no_strict)?;
            for name in provider.functions().keys() {
                println!("{name}");
            }
        }
        Commands::Call {
            script,
            no_strict,
            name,
            args,
        } => {
            let provider = FunctionProvider::new();
            configure(&provider, &script, !no_strict)?;

            let mut payloads = Vec::with_capacity(args.len());
            for (index, text) in args.iter().enumerate() {
                let value = infer_json(text)
                    .with_context(|| format!("argument #{index} is not valid JSON"))?;
                payloads.push(DynamicValue::new(&Type::Dynamic, &value)?);
            }

            match provider.call_function(&name, &payloads)? {
                CallFunctionResponse::Result(result) => {
                    let value = result.unmarshal(&Type::Dynamic)?;
                    let rendered = json::to_json(&value, &value.ty())?;
                    println!("{}", serde_json::to_string_pretty(&rendered)?);
                    eprintln!("type: {}", value.ty());
                }
                CallFunctionResponse::Error(error) => bail!(error.text),
            }
        }
    }

    Ok(())
}

fn configure(provider: &FunctionProvider, path: &Path, strict: bool) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    let config = ProviderConfig { js: source, strict };
    let payload = DynamicValue::new(&ProviderConfig::object_type(), &config.to_value())?;
    if let Some(diagnostic) = provider.configure_provider(&payload).into_iter().next() {
        bail!("{}: {}", diagnostic.summary, diagnostic.detail);
    }
    Ok(())
}
