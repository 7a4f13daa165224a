//! credprep: Loan Record Preparation CLI Tool
//!
//! Cleans raw loan records into model-ready features, saves the fitted
//! state, and scores single records against it.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Table};
use console::style;
use polars::prelude::DataFrame;

use credprep::cli::{
    confirm_overwrite, confirm_step, existing_paths, resolve_schema, Cli, Commands, PrepareArgs,
    ProfileArgs, ScoreArgs,
};
use credprep::pipeline::{load_table, FittedState, Preparer, Variant};
use credprep::report::{export_report, GroupProfile, PreparationReport, PreparationSummary, ReportParams};
use credprep::schema::{ColumnRole, Schema};
use credprep::utils::{
    abandon, create_spinner, finish_with_success, finish_with_warning, print_banner,
    print_completion, print_config, print_count, print_info, print_step_header, print_step_time,
    print_success, print_warning,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Prepare(args) => run_prepare(args),
        Commands::Score(args) => run_score(args),
        Commands::Profile(args) => run_profile(args),
        Commands::Schema { schema } => run_schema(&resolve_schema(schema.as_deref())?),
    }
}

fn run_prepare(args: &PrepareArgs) -> Result<()> {
    print_banner(env!("CARGO_PKG_VERSION"));

    let schema = resolve_schema(args.schema.as_deref())?;
    let output_path = args.output_path();
    print_config(
        &args.input,
        &schema.name,
        &args.variant.to_string(),
        &output_path,
        args.strict,
    );

    if !args.no_confirm {
        let existing = existing_paths(&args.written_paths());
        if !confirm_overwrite(&existing)? {
            print_info("Nothing written. Re-run with different output paths or --no-confirm.");
            return Ok(());
        }
    }

    // Step 1: Load
    print_step_header(1, "Load Records");
    let step_start = Instant::now();
    let spinner = create_spinner("Reading input file...");
    let table = match load_table(&args.input, &schema, &args.load_options()) {
        Ok(table) => table,
        Err(e) => {
            abandon(&spinner);
            return Err(e);
        }
    };
    finish_with_success(
        &spinner,
        &format!("Loaded {} rows × {} columns", table.height(), table.width()),
    );
    let load_elapsed = step_start.elapsed();
    print_step_time(load_elapsed);

    // Step 2: Clean, encode, impute
    print_step_header(2, "Clean and Encode");
    let step_start = Instant::now();
    let spinner = create_spinner("Running preparation stages...");
    let preparer = Preparer::new(schema, args.variant).strict(args.strict);
    let prepared = match preparer.prepare(table) {
        Ok(prepared) => prepared,
        Err(e) => {
            abandon(&spinner);
            return Err(e.into());
        }
    };

    let coerced = prepared.ledger.total_coerced();
    if coerced == 0 {
        finish_with_success(&spinner, "All present values parsed and mapped");
    } else {
        finish_with_warning(
            &spinner,
            &format!("{} unreadable value(s) will be imputed", coerced),
        );
    }
    if prepared.dropped_empty_rows > 0 {
        print_count("empty rows", prepared.dropped_empty_rows, Some("(dropped)"));
    }
    print_count("missing cells", prepared.ledger.total_missing(), None);
    print_count(
        "feature columns",
        prepared.state.feature_columns.len(),
        Some(format!("({})", prepared.state.variant).as_str()),
    );
    let prepare_elapsed = step_start.elapsed();
    print_step_time(prepare_elapsed);

    if coerced > 0 && !args.no_confirm {
        for cell in prepared.ledger.coerced_cells().iter().take(5) {
            print_warning(&format!("row {} {}: '{}'", cell.row, cell.column, cell.raw));
        }
        if !confirm_step(&format!("Continue with {} unreadable value(s) imputed?", coerced))? {
            print_info("Nothing written. Use --strict to fail on unreadable values.");
            return Ok(());
        }
    }

    // Step 3: Save
    print_step_header(3, "Save Results");
    let step_start = Instant::now();
    let spinner = create_spinner("Writing outputs...");

    let mut cleaned = prepared.cleaned.clone();
    save_dataset(&mut cleaned, &output_path)?;
    if args.variant == Variant::Segmentation {
        let mut scaled = prepared.model_input.to_dataframe()?;
        save_dataset(&mut scaled, &args.scaled_path())?;
    }

    let state_path = args.state_path();
    prepared.state.save(&state_path)?;

    let report_path = args.report_path();
    let input_file = args.input.display().to_string();
    let report = PreparationReport::from_prepared(
        &prepared,
        &ReportParams {
            input_file: &input_file,
            strict: args.strict,
        },
    );
    export_report(&report, &report_path)?;

    finish_with_success(&spinner, &format!("Saved to {}", output_path.display()));
    if args.variant == Variant::Segmentation {
        print_success(&format!("Scaled features: {}", args.scaled_path().display()));
    }
    print_success(&format!("Fitted state: {}", state_path.display()));
    print_success(&format!("Report: {}", report_path.display()));
    let save_elapsed = step_start.elapsed();
    print_step_time(save_elapsed);

    let mut summary = PreparationSummary::from_prepared(&prepared);
    summary.set_load_time(load_elapsed);
    summary.set_prepare_time(prepare_elapsed);
    summary.set_save_time(save_elapsed);
    summary.display();

    print_completion();
    Ok(())
}

fn run_score(args: &ScoreArgs) -> Result<()> {
    let state = FittedState::load(&args.state)?;
    let record = args.parse_record()?;

    let absent = state.missing_features(&record);
    if !absent.is_empty() {
        eprintln!(
            "{} {} feature(s) absent, filled from fitted state: {}",
            style("!").yellow().bold(),
            absent.len(),
            absent.join(", ")
        );
    }

    let vector = state.transform_record(&record)?;
    println!("{}", serde_json::to_string(&vector.to_vec())?);
    Ok(())
}

fn run_profile(args: &ProfileArgs) -> Result<()> {
    let schema = resolve_schema(args.schema.as_deref())?;
    let table = load_table(&args.input, &schema, &args.load_options())?;
    let profile = GroupProfile::build(&table, &args.group, &schema)?;
    profile.display();
    Ok(())
}

fn run_schema(schema: &Schema) -> Result<()> {
    println!();
    println!(
        "    {} {} {}",
        style("📜").cyan(),
        style("SCHEMA").white().bold(),
        style(&schema.name).dim()
    );
    println!(
        "    {}",
        style(format!(
            "currency symbol '{}', placeholder '{}'",
            schema.currency_symbol, schema.placeholder
        ))
        .dim()
    );
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Column").add_attribute(Attribute::Bold),
        Cell::new("Role").add_attribute(Attribute::Bold),
        Cell::new("Trim").add_attribute(Attribute::Bold),
        Cell::new("Encoding").add_attribute(Attribute::Bold),
        Cell::new("Aliases").add_attribute(Attribute::Bold),
    ]);

    for spec in &schema.columns {
        let encoding = match &spec.role {
            ColumnRole::Ordinal { mapping } | ColumnRole::Categorical { mapping } => mapping
                .entries()
                .iter()
                .map(|(literal, code)| format!("{} → {}", literal, code))
                .collect::<Vec<_>>()
                .join("\n"),
            ColumnRole::Flag { true_literal } => format!("'{}' → 1, else 0", true_literal),
            ColumnRole::Target { max_fit } => format!("FIT = 1 when ≤ {}", max_fit),
            ColumnRole::Currency => format!("strip '{}', parse amount", schema.currency_symbol),
            ColumnRole::Numeric => "parse number".to_string(),
            ColumnRole::Identifier => "dropped".to_string(),
        };
        table.add_row(vec![
            Cell::new(&spec.name),
            Cell::new(spec.role.label()),
            Cell::new(if spec.trim { "yes" } else { "" }).set_alignment(CellAlignment::Center),
            Cell::new(encoding),
            Cell::new(spec.aliases.join("\n")),
        ]);
    }

    for line in table.to_string().lines() {
        println!("    {}", line);
    }
    println!();
    Ok(())
}

/// Save dataset to file (CSV or Parquet based on extension)
fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    use anyhow::Context;
    use polars::prelude::*;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            CsvWriter::new(&mut file)
                .finish(df)
                .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
        }
        "parquet" => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            ParquetWriter::new(file)
                .finish(df)
                .with_context(|| format!("Failed to write Parquet file: {}", path.display()))?;
        }
        _ => anyhow::bail!(
            "Unsupported output format: {}. Supported formats: csv, parquet",
            extension
        ),
    }

    Ok(())
}
