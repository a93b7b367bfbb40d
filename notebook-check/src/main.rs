use anyhow::{bail, Context};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about = "Fail if an executed notebook recorded an error output")]
struct Args {
    #[arg(value_name = "EXECUTED_NOTEBOOK")]
    notebook: PathBuf,
}

/// The parts of an nbformat document the check needs. v4 keeps cells at the
/// top level, v3 nests them in worksheets.
#[derive(Debug, Default, Deserialize)]
struct Notebook {
    #[serde(default)]
    cells: Vec<Cell>,
    #[serde(default)]
    worksheets: Vec<Worksheet>,
}

#[derive(Debug, Default, Deserialize)]
struct Worksheet {
    #[serde(default)]
    cells: Vec<Cell>,
}

#[derive(Debug, Deserialize)]
struct Cell {
    cell_type: String,
    #[serde(default)]
    outputs: Vec<Output>,
}

#[derive(Debug, Deserialize)]
struct Output {
    output_type: String,
}

impl Notebook {
    fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells
            .iter()
            .chain(self.worksheets.iter().flat_map(|ws| ws.cells.iter()))
    }

    fn has_errors(&self) -> bool {
        self.cells()
            .filter(|cell| cell.cell_type == "code")
            .flat_map(|cell| cell.outputs.iter())
            .any(|output| matches!(output.output_type.as_str(), "error" | "pyerr"))
    }
}

fn check(path: &Path) -> anyhow::Result<()> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading notebook {}", path.display()))?;
    let notebook: Notebook = serde_json::from_str(&contents)
        .with_context(|| format!("parsing notebook {}", path.display()))?;
    if notebook.has_errors() {
        bail!("{} has one or more errors", path.display());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    check(&args.notebook)?;
    println!("OK");
    Ok(())
}
