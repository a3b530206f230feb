use anyhow::{Context, Result};
use barchart::data::QueryResult;
use barchart::graph::render_preview;
use barchart::ir::{ChartPropsEnvelope, FlatProps};
use barchart::transform::{transform_props, transform_props_with_rows};
use barchart::{controls, render_chart, telemetry, OutputFormat, RenderOptions};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "barchart")]
#[command(about = "Turn dashboard chart props into bar/column chart configuration", long_about = None)]
struct Cli {
    /// Log pipeline stages to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the selected chart configuration as JSON
    Config(InputArgs),
    /// Print the flat props as JSON
    Props(InputArgs),
    /// Draw a preview image of the selected configuration
    Render {
        #[command(flatten)]
        input: InputArgs,
        /// Image format
        #[arg(long, value_enum, default_value_t = OutputFormat::Png)]
        format: OutputFormat,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the control panel declaration as JSON
    Controls {
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Envelope JSON file (defaults to stdin)
    input: Option<PathBuf>,
    /// Take rows from this file (CSV, or JSON rows) instead of the envelope's result sets
    #[arg(long, alias = "csv")]
    rows: Option<PathBuf>,
    /// Reject form data that does not match the control panel
    #[arg(long)]
    strict: bool,
    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(if cli.verbose { "debug" } else { "warn" });

    match cli.command {
        Command::Config(args) => {
            let props = load_props(&args)?;
            write_json(&render_chart(&props), args.pretty)
        }
        Command::Props(args) => {
            let props = load_props(&args)?;
            write_json(&props, args.pretty)
        }
        Command::Render {
            input,
            format,
            output,
        } => {
            let props = load_props(&input)?;
            let bytes = render_preview(&props, &RenderOptions::for_props(&props, format))
                .context("Failed to render preview")?;
            write_bytes(&bytes, output.as_deref())
        }
        Command::Controls { pretty } => write_json(&controls::control_panel(), pretty),
    }
}

fn load_props(args: &InputArgs) -> Result<FlatProps> {
    let raw = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read envelope from stdin")?;
            buf
        }
    };
    let envelope: ChartPropsEnvelope =
        serde_json::from_str(&raw).context("Failed to parse chart props envelope")?;

    if args.strict {
        envelope
            .form_data
            .validate()
            .context("Form data rejected")?;
    }

    let props = match &args.rows {
        Some(path) => {
            let result = QueryResult::from_path(path)
                .with_context(|| format!("Failed to load rows from {}", path.display()))?;
            transform_props_with_rows(envelope, result.data)
        }
        None => transform_props(envelope).context("Failed to transform chart props")?,
    };
    info!(rows = props.data.len(), "loaded chart props");
    Ok(props)
}

fn write_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let mut json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize output")?;
    json.push('\n');
    write_bytes(json.as_bytes(), None)
}

fn write_bytes(bytes: &[u8], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(bytes).context("Failed to write to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
            Ok(())
        }
    }
}
