use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

use mdocx::Config;

#[derive(Parser)]
#[command(name = "mdocx")]
#[command(about = "Convert Markdown files to DOCX")]
struct Cli {
    /// Input Markdown file
    input: PathBuf,

    /// Output DOCX file (defaults to input name with .docx extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file with font and color settings
    #[arg(short, long, default_value = "mdocx.toml")]
    config: PathBuf,

    /// Override the body font family from the config
    #[arg(long)]
    font: Option<String>,

    /// Log parse and image-loading details
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let mut config = Config::load(&cli.config);
    if let Some(font) = cli.font {
        config.font.family = font;
    }

    // Read input file
    let markdown = match fs::read_to_string(&cli.input) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading {}: {}", cli.input.display(), e);
            std::process::exit(1);
        }
    };

    // Convert markdown to DOCX
    let docx_bytes =
        match mdocx::markdown_to_docx_with_config(&markdown, &config, cli.input.parent()) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };

    // Determine output path
    let output = cli
        .output
        .unwrap_or_else(|| cli.input.with_extension("docx"));

    // Write DOCX
    if let Err(e) = fs::write(&output, docx_bytes) {
        eprintln!("Error writing {}: {}", output.display(), e);
        std::process::exit(1);
    }

    println!("Created {}", output.display());
}
