//! Styled terminal output for the CLI

use std::path::Path;
use std::time::Duration;

use console::{style, Emoji};

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static COMPASS: Emoji<'_, '_> = Emoji("🧭 ", "");
pub static SCROLL: Emoji<'_, '_> = Emoji("📜 ", "");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");

pub fn print_banner(version: &str) {
    let banner = r#"
                        _
     ___ _ __ ___  __| |_ __  _ __ ___ _ __
    / __| '__/ _ \/ _` | '_ \| '__/ _ \ '_ \
   | (__| | |  __/ (_| | |_) | | |  __/ |_) |
    \___|_|  \___|\__,_| .__/|_|  \___| .__/
                       |_|            |_|
    "#;

    println!();
    println!("{}", style(banner).cyan().bold());
    println!(
        "    {}",
        style("Loan record preparation for segmentation and fitness models").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Configuration card for a `prepare` run
pub fn print_config(input: &Path, schema: &str, variant: &str, output: &Path, strict: bool) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(box_width - 20)
    );
    println!("    ├{}┤", line);
    println!("    │  {} Input:   {:<38}│", FOLDER, truncate_path(input, 37));
    println!("    │  {} Schema:  {:<38}│", SCROLL, truncate_string(schema, 37));
    println!("    │  {} Variant: {:<38}│", COMPASS, truncate_string(variant, 37));
    println!("    │  {} Output:  {:<38}│", SAVE, truncate_path(output, 37));
    println!("    ├{}┤", line);
    println!(
        "    │  Strict mode: {:<39}│",
        if strict {
            style("on").yellow()
        } else {
            style("off").dim()
        }
    );
    println!("    └{}┘", line);
    println!();
}

pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

pub fn print_warning(message: &str) {
    println!("    {} {}", WARN, style(message).yellow());
}

pub fn print_step_time(elapsed: Duration) {
    println!(
        "      {}",
        style(format!("took {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

pub fn print_completion() {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style("Preparation complete!").green().bold()
    );
    println!();
}

pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    match detail {
        Some(info) => println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        ),
        None => println!("      Found {} {}", style(count).yellow().bold(), description),
    }
}

fn truncate_path(path: &Path, max_len: usize) -> String {
    truncate_string(&path.display().to_string(), max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}
