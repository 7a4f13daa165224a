//! Preparation summary report generation

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::{ColumnTally, Prepared};

/// Summary of one preparation run
#[derive(Debug, Default)]
pub struct PreparationSummary {
    pub variant: String,
    pub rows_loaded: usize,
    pub dropped_empty_rows: usize,
    pub rows_prepared: usize,
    pub feature_count: usize,
    pub one_hot_columns: usize,
    pub tallies: Vec<ColumnTally>,
    pub ignored_columns: Vec<String>,
    /// (fit, not fit) counts for the classification variant
    pub label_counts: Option<(usize, usize)>,
    pub load_time: Duration,
    pub prepare_time: Duration,
    pub save_time: Duration,
}

impl PreparationSummary {
    pub fn from_prepared(prepared: &Prepared) -> Self {
        let label_counts = prepared.labels.as_ref().map(|labels| {
            let fit = labels.iter().filter(|l| **l == 1).count();
            (fit, labels.len() - fit)
        });

        Self {
            variant: prepared.state.variant.to_string(),
            rows_loaded: prepared.rows_loaded,
            dropped_empty_rows: prepared.dropped_empty_rows,
            rows_prepared: prepared.features.n_rows(),
            feature_count: prepared.features.n_cols(),
            one_hot_columns: prepared
                .state
                .one_hot
                .iter()
                .map(|c| c.categories.len())
                .sum(),
            tallies: prepared.ledger.tallies().to_vec(),
            ignored_columns: prepared.ignored_columns.clone(),
            label_counts,
            ..Default::default()
        }
    }

    pub fn set_load_time(&mut self, elapsed: Duration) {
        self.load_time = elapsed;
    }

    pub fn set_prepare_time(&mut self, elapsed: Duration) {
        self.prepare_time = elapsed;
    }

    pub fn set_save_time(&mut self, elapsed: Duration) {
        self.save_time = elapsed;
    }

    pub fn total_coerced(&self) -> usize {
        self.tallies.iter().map(|t| t.coerced).sum()
    }

    pub fn total_missing(&self) -> usize {
        self.tallies.iter().map(|t| t.missing).sum()
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("PREPARATION SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("🧭 Variant"), Cell::new(&self.variant)]);
        table.add_row(vec![Cell::new("📁 Rows Loaded"), Cell::new(self.rows_loaded)]);
        table.add_row(vec![
            Cell::new("🗑️  Empty Rows Dropped"),
            Cell::new(self.dropped_empty_rows).fg(if self.dropped_empty_rows == 0 {
                Color::White
            } else {
                Color::Yellow
            }),
        ]);
        table.add_row(vec![
            Cell::new("✅ Rows Prepared"),
            Cell::new(self.rows_prepared)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("🔢 Feature Columns"),
            Cell::new(self.feature_count),
        ]);
        if self.one_hot_columns > 0 {
            table.add_row(vec![
                Cell::new("🧩 One-hot Indicators"),
                Cell::new(self.one_hot_columns),
            ]);
        }
        table.add_row(vec![
            Cell::new("❔ Missing Cells"),
            Cell::new(self.total_missing()),
        ]);
        table.add_row(vec![
            Cell::new("⚠️  Coerced Cells"),
            Cell::new(self.total_coerced()).fg(if self.total_coerced() == 0 {
                Color::White
            } else {
                Color::Red
            }),
        ]);
        if let Some((fit, not_fit)) = self.label_counts {
            table.add_row(vec![Cell::new("🎯 Fit / Not Fit"), Cell::new(format!("{} / {}", fit, not_fit))]);
        }

        let total = self.load_time + self.prepare_time + self.save_time;
        if !total.is_zero() {
            table.add_row(vec![
                Cell::new("⏱️  Total Time"),
                Cell::new(format!("{:.2}s", total.as_secs_f64())),
            ]);
        }

        // Indent the table
        for line in table.to_string().lines() {
            println!("    {}", line);
        }

        let touched: Vec<&ColumnTally> = self
            .tallies
            .iter()
            .filter(|t| t.missing > 0 || t.coerced > 0 || t.imputed > 0)
            .collect();

        if !touched.is_empty() {
            println!();
            println!(
                "    {} {}",
                style("📝").cyan(),
                style("IMPUTED COLUMNS").white().bold()
            );
            println!("    {}", style("─".repeat(50)).dim());
            println!();

            let mut detail = Table::new();
            detail.load_preset(UTF8_FULL_CONDENSED);
            detail.set_header(vec![
                Cell::new("Column").add_attribute(Attribute::Bold),
                Cell::new("Missing").add_attribute(Attribute::Bold),
                Cell::new("Coerced").add_attribute(Attribute::Bold),
                Cell::new("Imputed").add_attribute(Attribute::Bold),
            ]);
            for tally in touched {
                detail.add_row(vec![
                    Cell::new(&tally.column),
                    Cell::new(tally.missing),
                    Cell::new(tally.coerced).fg(if tally.coerced == 0 {
                        Color::White
                    } else {
                        Color::Red
                    }),
                    Cell::new(tally.imputed),
                ]);
            }
            for line in detail.to_string().lines() {
                println!("    {}", line);
            }
        }

        if !self.ignored_columns.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("Ignored Columns").yellow(),
                style(format!("({})", self.ignored_columns.len())).dim()
            );
            for column in &self.ignored_columns {
                println!("        {} {}", style("•").dim(), column);
            }
        }
    }
}
