use std::io::Read as _;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use draftsman::{ContentBlock, DocumentAssembler, DocumentSpec, ImageSource, StyleSheet};

/// Assemble a declarative document spec into a paginated PDF
#[derive(Parser, Debug)]
#[command(name = "draftsman")]
#[command(version)]
#[command(about = "Render document specs (headings, tables, diagrams) to PDF", long_about = None)]
struct Args {
    /// Input document spec: .json, .yaml/.yml or .toml (use "-" for JSON on stdin)
    #[arg(value_name = "INPUT", required_unless_present = "completions")]
    input: Option<PathBuf>,

    /// Output PDF path
    #[arg(short, long, value_name = "OUTPUT", required_unless_present = "completions")]
    output: Option<PathBuf>,

    /// Style sheet TOML file
    #[arg(short, long, value_name = "STYLE")]
    style: Option<PathBuf>,

    /// Print shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn main() -> Result<(), String> {
    env_logger::init();
    let args = Args::parse();

    if let Some(shell) = args.completions {
        let mut cmd = Args::command();
        clap_complete::generate(shell, &mut cmd, "draftsman", &mut std::io::stdout());
        return Ok(());
    }

    let input = args.input.expect("clap enforces INPUT");
    let output = args.output.expect("clap enforces --output");

    let style = load_style(args.style.as_deref())?;
    let mut spec = load_document_spec(&input)?;

    // Relative image paths are resolved against the spec file's directory.
    if input.to_str() != Some("-") {
        if let Some(base) = input.parent() {
            resolve_image_paths(&mut spec, base);
        }
    }

    let output_ext = output
        .extension()
        .and_then(|e| e.to_str())
        .ok_or("Output file has no extension")?
        .to_ascii_lowercase();
    if output_ext != "pdf" {
        return Err(format!(
            "Unsupported output format: .{output_ext} (documents render to .pdf)"
        ));
    }

    let assembler = DocumentAssembler::new();
    assembler
        .render_to_file(&spec, &style, &output)
        .map_err(|e| e.to_string())?;
    eprintln!("PDF saved to: {}", output.display());

    Ok(())
}

fn load_style(path: Option<&Path>) -> Result<StyleSheet, String> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read style file: {e}"))?;
            StyleSheet::from_toml_str(&content).map_err(|e| e.to_string())
        }
        None => Ok(StyleSheet::default()),
    }
}

fn load_document_spec(input: &Path) -> Result<DocumentSpec, String> {
    if input.to_str() == Some("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {e}"))?;
        return serde_json::from_str(&buffer).map_err(|e| format!("Failed to parse spec: {e}"));
    }

    let content = std::fs::read_to_string(input)
        .map_err(|e| format!("Failed to read input file: {e}"))?;
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "json" => serde_json::from_str(&content).map_err(|e| format!("Failed to parse spec: {e}")),
        "yaml" | "yml" => {
            serde_yaml::from_str(&content).map_err(|e| format!("Failed to parse spec: {e}"))
        }
        "toml" => toml::from_str(&content).map_err(|e| format!("Failed to parse spec: {e}")),
        other => Err(format!(
            "Unsupported spec format: .{other} (use .json, .yaml or .toml)"
        )),
    }
}

fn resolve_image_paths(spec: &mut DocumentSpec, base: &Path) {
    for block in &mut spec.blocks {
        if let ContentBlock::Image {
            source: ImageSource::Path(path),
            ..
        } = block
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
