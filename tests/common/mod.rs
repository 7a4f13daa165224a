//! Shared test utilities and fixture generators

#![allow(dead_code)]

use std::path::PathBuf;

use credprep::pipeline::normalize_frame;
use credprep::schema::Schema;
use polars::prelude::*;
use tempfile::TempDir;

/// Canonical headers of the loan record file, in file order
pub const LOAN_HEADERS: [&str; 14] = [
    "CLIENTE",
    "PRECIO PRODUCTO",
    "SUELDO",
    "EDAD (RANGO DE EDAD EN AÑOS)",
    "DEPENDIENTES ECONOMICOS",
    "OCUPACION",
    "ANTIGUEDAD",
    "ESTADO CIVIL",
    "UTILIZACION DINERO",
    "VIVIENDA PROPIA",
    "VEHICULO PROPIO",
    "TARJETA DE CREDITO",
    "TIPO DE COMPRAS",
    "Cuotas pendientes actual",
];

/// Three clients plus one fully empty row.
///
/// - client 1: clean record, 0 pending installments (fit)
/// - client 2: 3 pending installments (not fit)
/// - client 3: padded marital status, 1 pending installment (fit)
pub fn loan_rows() -> Vec<Vec<&'static str>> {
    vec![
        vec![
            "1", "Q 66.908,00", "Q 8.500,00", "30 - 39 años", "2", "Dueño", "1-5 años",
            "Casado", "Consumo", "Si", "No", "Si", "Autocompras", "0",
        ],
        vec![
            "2", "Q 45.000,00", "Q 6.000,00", "18 - 29 años", "0", "Empleado", "0-1 año",
            "Soltero", "Otro", "No", "No", "Si", "Sobre Vehículos", "3",
        ],
        vec![
            "3", "Q 120.500,00", "Q 12.000,00", "40 - 49 años", "4", "Empleado", "5-10 años",
            " Divorciado ", "Consumo", "Si", "Si", "No", "Autocompras", "1",
        ],
        vec![""; 14],
    ]
}

/// Render rows as CSV text, quoting fields that contain the separator
pub fn to_csv(headers: &[&str], rows: &[Vec<&str>]) -> String {
    to_delimited(headers, rows, ',')
}

pub fn to_delimited(headers: &[&str], rows: &[Vec<&str>], separator: char) -> String {
    let quote = |field: &str| {
        if field.contains(separator) || field.contains('"') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    };
    let sep = separator.to_string();

    let mut text = headers.iter().map(|h| quote(*h)).collect::<Vec<_>>().join(&sep);
    text.push('\n');
    for row in rows {
        text.push_str(&row.iter().map(|f| quote(*f)).collect::<Vec<_>>().join(&sep));
        text.push('\n');
    }
    text
}

/// Create a temporary directory with a CSV file holding `rows`
pub fn create_temp_loan_csv(headers: &[&str], rows: &[Vec<&str>]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("loans.csv");
    std::fs::write(&csv_path, to_csv(headers, rows)).unwrap();
    (temp_dir, csv_path)
}

/// The default fixture written to a temporary CSV
pub fn create_default_loan_csv() -> (TempDir, PathBuf) {
    create_temp_loan_csv(&LOAN_HEADERS, &loan_rows())
}

/// Build a frame straight from string rows, the way the CSV loader would
pub fn loan_table(headers: &[&str], rows: &[Vec<&str>]) -> DataFrame {
    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let values: Vec<Option<&str>> = rows
                .iter()
                .map(|row| Some(row[i]))
                .collect();
            Column::new((*name).into(), values)
        })
        .collect();
    let df = DataFrame::new(columns).unwrap();
    normalize_frame(df, &Schema::default_loan_records().unwrap()).unwrap()
}

pub fn default_loan_table() -> DataFrame {
    loan_table(&LOAN_HEADERS, &loan_rows())
}

/// Rows with random but well-formed values, for property and benchmark runs
pub fn random_loan_rows(n: usize, seed: u64) -> Vec<Vec<String>> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(seed);
    let ages = ["18 - 29 años", "30 - 39 años", "40 - 49 años", "50 años o mas"];
    let tenure = ["0-1 año", "1-5 años", "5-10 años", "10 años o más"];
    let marital = ["Soltero", "Casado", "Divorciado", "Viudo"];
    let yes_no = ["Si", "No"];

    (0..n)
        .map(|i| {
            let price: u32 = rng.gen_range(1_000..500_000);
            let salary: u32 = rng.gen_range(2_000..40_000);
            let mut row = vec![
                (i + 1).to_string(),
                format!("Q {},00", thousands_dot(price)),
                format!("Q {},00", thousands_dot(salary)),
                ages[rng.gen_range(0..ages.len())].to_string(),
                rng.gen_range(0..6).to_string(),
                if rng.gen_bool(0.3) { "Dueño" } else { "Empleado" }.to_string(),
                tenure[rng.gen_range(0..tenure.len())].to_string(),
                marital[rng.gen_range(0..marital.len())].to_string(),
                if rng.gen_bool(0.6) { "Consumo" } else { "Inversion" }.to_string(),
                yes_no[rng.gen_range(0..2)].to_string(),
                yes_no[rng.gen_range(0..2)].to_string(),
                yes_no[rng.gen_range(0..2)].to_string(),
                if rng.gen_bool(0.5) { "Autocompras" } else { "Sobre Vehículos" }.to_string(),
                rng.gen_range(0..6).to_string(),
            ];
            // Knock out roughly 5% of the cells, never the identifier
            for cell in row.iter_mut().skip(1) {
                if rng.gen_bool(0.05) {
                    cell.clear();
                }
            }
            row
        })
        .collect()
}

/// `1234567` → `"1.234.567"`
pub fn thousands_dot(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Float64 values of a column, panicking when it is not Float64
pub fn numeric(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap_or_else(|_| panic!("missing column {}", name))
        .f64()
        .unwrap_or_else(|_| panic!("expected numeric column {}", name))
        .into_iter()
        .collect()
}

/// Text values of a column, panicking when it is not text
pub fn text(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap_or_else(|_| panic!("missing column {}", name))
        .str()
        .unwrap_or_else(|_| panic!("expected text column {}", name))
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}
