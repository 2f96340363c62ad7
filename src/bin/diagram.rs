use std::io::Read as _;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use draftsman::raster;
use draftsman::{DiagramComposer, DiagramSpec, StyleSheet};

/// Standalone diagram renderer (SVG/PNG/PDF)
#[derive(Parser, Debug)]
#[command(name = "draftsman-diagram")]
#[command(version)]
#[command(about = "Render a diagram spec to SVG, PNG or PDF", long_about = None)]
struct Args {
    /// Input diagram spec: .json, .yaml/.yml or .toml (use "-" for JSON on stdin)
    #[arg(value_name = "INPUT", required_unless_present = "completions")]
    input: Option<PathBuf>,

    /// Output file path (extension determines format: .svg, .png or .pdf)
    #[arg(short, long, value_name = "OUTPUT", required_unless_present = "completions")]
    output: Option<PathBuf>,

    /// Style sheet TOML file
    #[arg(short, long, value_name = "STYLE")]
    style: Option<PathBuf>,

    /// Raster resolution for PNG output, in pixels per canvas unit
    #[arg(long, default_value_t = 96)]
    dpi: u32,

    /// Print shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn main() -> Result<(), String> {
    env_logger::init();
    let args = Args::parse();

    if let Some(shell) = args.completions {
        let mut cmd = Args::command();
        clap_complete::generate(shell, &mut cmd, "draftsman-diagram", &mut std::io::stdout());
        return Ok(());
    }

    let input = args.input.expect("clap enforces INPUT");
    let output = args.output.expect("clap enforces --output");

    let style = match args.style.as_deref() {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read style file: {e}"))?;
            StyleSheet::from_toml_str(&content).map_err(|e| e.to_string())?
        }
        None => StyleSheet::default(),
    };

    let spec = load_diagram_spec(&input)?;
    let composer = DiagramComposer::new();

    let output_ext = output
        .extension()
        .and_then(|e| e.to_str())
        .ok_or("Output file has no extension")?
        .to_ascii_lowercase();

    match output_ext.as_str() {
        "svg" => {
            let svg = composer.compose_svg(&spec, &style).map_err(|e| e.to_string())?;
            std::fs::write(&output, svg).map_err(|e| format!("Failed to write SVG: {e}"))?;
            eprintln!("SVG saved to: {}", output.display());
        }
        "png" => {
            let buffer = composer
                .compose(&spec, &style, args.dpi)
                .map_err(|e| e.to_string())?;
            std::fs::write(&output, buffer.data)
                .map_err(|e| format!("Failed to write PNG: {e}"))?;
            eprintln!(
                "PNG saved to: {} ({}x{})",
                output.display(),
                buffer.width,
                buffer.height
            );
        }
        "pdf" => {
            let svg = composer.compose_svg(&spec, &style).map_err(|e| e.to_string())?;
            let pdf_data = raster::svg_to_pdf(&svg).map_err(|e| e.to_string())?;
            std::fs::write(&output, pdf_data).map_err(|e| format!("Failed to write PDF: {e}"))?;
            eprintln!("PDF saved to: {}", output.display());
        }
        _ => {
            return Err(format!(
                "Unsupported output format: .{output_ext} (use .svg, .png or .pdf)"
            ));
        }
    }

    Ok(())
}

fn load_diagram_spec(input: &Path) -> Result<DiagramSpec, String> {
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
