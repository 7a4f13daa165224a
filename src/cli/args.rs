//! Command-line argument definitions using clap

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::pipeline::{LoadOptions, Variant};
use crate::schema::Schema;

/// credprep - Clean and encode loan records for segmentation and fitness models
#[derive(Parser, Debug)]
#[command(name = "credprep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the preparation pipeline on a loan record file
    Prepare(PrepareArgs),

    /// Transform one already-encoded record with a saved fitted state
    Score(ScoreArgs),

    /// Print per-group statistics for a prepared table
    Profile(ProfileArgs),

    /// Print the effective column schema
    Schema {
        /// Schema JSON file (defaults to the built-in loan record schema)
        #[arg(long)]
        schema: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file path (CSV or Parquet, determined by extension).
    /// Defaults to input directory with '_prepared' suffix (e.g., loans.csv → loans_prepared.csv).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Downstream model the features are prepared for.
    /// Options: "segmentation" (scaled, default) or "classification" (one-hot plus FIT label)
    #[arg(long, default_value = "segmentation")]
    pub variant: Variant,

    /// Schema JSON file (defaults to the built-in loan record schema)
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// Field separator for CSV input (single ASCII character, or "tab")
    #[arg(long, default_value = ",", value_parser = parse_separator)]
    pub separator: u8,

    /// Fitted state output path. Defaults to '<stem>_state.json' beside the input.
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// JSON report output path. Defaults to '<stem>_report.json' beside the input.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Fail instead of imputing when a present value cannot be parsed or mapped
    #[arg(long, default_value = "false")]
    pub strict: bool,

    /// Skip interactive confirmation prompts
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,
}

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Fitted state written by `prepare`
    #[arg(long)]
    pub state: PathBuf,

    /// Encoded record as a JSON object, e.g. '{"SUELDO": 8000, "ESTADO CIVIL": 1}'
    #[arg(long)]
    pub record: String,
}

#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// Prepared table (CSV or Parquet) carrying the group column
    #[arg(short, long)]
    pub input: PathBuf,

    /// Column holding the group of each row, e.g. CLUSTER or FIT
    #[arg(short, long)]
    pub group: String,

    /// Schema JSON file (defaults to the built-in loan record schema)
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// Field separator for CSV input
    #[arg(long, default_value = ",", value_parser = parse_separator)]
    pub separator: u8,
}

impl PrepareArgs {
    /// Get the output path, deriving from input if not explicitly provided.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| derived_path(&self.input, "prepared", output_extension(&self.input)))
    }

    /// Scaled model input written beside the cleaned table (segmentation only)
    pub fn scaled_path(&self) -> PathBuf {
        let output = self.output_path();
        let extension = output_extension(&output);
        derived_path(&self.input, "scaled", extension)
    }

    pub fn state_path(&self) -> PathBuf {
        self.state
            .clone()
            .unwrap_or_else(|| derived_path(&self.input, "state", "json"))
    }

    pub fn report_path(&self) -> PathBuf {
        self.report
            .clone()
            .unwrap_or_else(|| derived_path(&self.input, "report", "json"))
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            separator: self.separator,
        }
    }

    /// Every file this run writes, in write order
    pub fn written_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.output_path()];
        if self.variant == Variant::Segmentation {
            paths.push(self.scaled_path());
        }
        paths.push(self.state_path());
        paths.push(self.report_path());
        paths
    }
}

impl ScoreArgs {
    /// Parse `--record` into column → encoded value
    pub fn parse_record(&self) -> Result<BTreeMap<String, f64>> {
        serde_json::from_str(&self.record)
            .context("--record must be a JSON object mapping feature columns to numbers")
    }
}

impl ProfileArgs {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            separator: self.separator,
        }
    }
}

/// Built-in schema unless a file is given
pub fn resolve_schema(path: Option<&Path>) -> Result<Schema> {
    match path {
        Some(path) => Schema::from_path(path),
        None => Schema::default_loan_records(),
    }
}

/// `<dir>/<stem>_<suffix>.<extension>` beside `input`
fn derived_path(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    parent.join(format!("{}_{}.{}", stem, suffix, extension))
}

/// Tables are written as Parquet only when the reference path is Parquet
fn output_extension(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("parquet") => "parquet",
        _ => "csv",
    }
}

/// Validator for the separator parameter
fn parse_separator(s: &str) -> Result<u8, String> {
    match s {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => {
            let bytes = s.as_bytes();
            if bytes.len() == 1 && bytes[0].is_ascii() {
                Ok(bytes[0])
            } else {
                Err(format!(
                    "separator must be a single ASCII character, got '{}'",
                    s
                ))
            }
        }
    }
}
