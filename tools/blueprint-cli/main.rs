use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use blueprint_compiler::codegen::TargetFormat;
use blueprint_compiler::config::DesignOptions;
use blueprint_compiler::design::{DesignRequest, DesignResponse, ResponseBody, design};
use blueprint_compiler::extract::Attachment;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatCli {
    Human,
    Node,
    Zap,
    Notes,
}

impl From<FormatCli> for TargetFormat {
    fn from(format: FormatCli) -> Self {
        match format {
            FormatCli::Human => TargetFormat::HumanLogic,
            FormatCli::Node => TargetFormat::NodeBased,
            FormatCli::Zap => TargetFormat::ZapBased,
            FormatCli::Notes => TargetFormat::ArchitectureNotes,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Compile an automation description into workflow blueprints", long_about = None)]
struct Cli {
    /// Automation description. Read from stdin when omitted.
    text: Option<String>,

    /// Attachment metadata as `name:bytes:mime-type`. Repeatable.
    #[arg(short, long = "file", value_parser = parse_attachment)]
    files: Vec<Attachment>,

    /// Renderings to produce. Repeatable; defaults to all.
    #[arg(short = 'F', long = "format", value_enum)]
    formats: Vec<FormatCli>,

    /// JSON file with design options.
    #[arg(short, long)]
    options: Option<PathBuf>,

    /// Print only the human-readable logic on success.
    #[arg(long)]
    human: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut options = match &cli.options {
        Some(path) => {
            let json = fs::read_to_string(path).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to read options file '{}': {}", path.display(), e))
            });
            DesignOptions::from_json(&json).unwrap_or_else(|e| exit_with_error(&e.to_string()))
        }
        None => DesignOptions::default(),
    };
    if !cli.formats.is_empty() {
        options.formats = cli.formats.iter().copied().map(TargetFormat::from).collect::<BTreeSet<_>>();
    }

    let text = match cli.text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to read stdin: {}", e)));
            buf
        }
    };

    let request = DesignRequest {
        text,
        files: cli.files,
    };
    let response = DesignResponse::from_result(&request, design(&request, &options));

    if cli.human
        && let ResponseBody::Success(success) = &response.body
        && let Some(human_logic) = &success.human_logic
    {
        print!("{human_logic}");
    } else {
        let json = serde_json::to_string_pretty(&response.body)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize response: {}", e)));
        println!("{json}");
    }

    if !response.is_success() {
        std::process::exit(1);
    }
}

fn parse_attachment(raw: &str) -> Result<Attachment, String> {
    let mut parts = raw.rsplitn(3, ':');
    let (Some(mime), Some(size), Some(name)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected name:bytes:mime-type, got '{raw}'"));
    };
    let byte_size = size
        .parse()
        .map_err(|_| format!("'{size}' is not a byte count"))?;
    Ok(Attachment::new(name, byte_size, mime))
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
