//! End-to-end tests for the preparation pipeline

mod common;

use common::*;
use credprep::pipeline::{load_table, LoadOptions, PrepError, Preparer, Variant, FIT_COLUMN};
use credprep::schema::Schema;
use polars::prelude::DataType;

fn preparer(variant: Variant) -> Preparer {
    Preparer::new(Schema::default_loan_records().unwrap(), variant)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_segmentation_drops_empty_row_and_cleans_values() {
    let prepared = preparer(Variant::Segmentation)
        .prepare(default_loan_table())
        .unwrap();

    assert_eq!(prepared.rows_loaded, 4);
    assert_eq!(prepared.dropped_empty_rows, 1);
    assert_eq!(prepared.features.n_rows(), 3);

    let cleaned = &prepared.cleaned;
    assert_eq!(
        numeric(cleaned, "PRECIO PRODUCTO"),
        vec![Some(66908.0), Some(45000.0), Some(120500.0)]
    );
    assert_eq!(
        numeric(cleaned, "SUELDO"),
        vec![Some(8500.0), Some(6000.0), Some(12000.0)]
    );
    assert_eq!(
        numeric(cleaned, "EDAD (RANGO DE EDAD EN AÑOS)"),
        vec![Some(1.0), Some(0.0), Some(2.0)]
    );
    assert_eq!(
        numeric(cleaned, "ESTADO CIVIL"),
        vec![Some(1.0), Some(0.0), Some(2.0)]
    );
    assert_eq!(
        numeric(cleaned, "UTILIZACION DINERO"),
        vec![Some(1.0), Some(0.0), Some(1.0)]
    );
    assert_eq!(
        numeric(cleaned, "TIPO DE COMPRAS"),
        vec![Some(0.0), Some(1.0), Some(0.0)]
    );
    assert_eq!(prepared.ledger.total_coerced(), 0);
}

#[test]
fn test_segmentation_excludes_identifier_and_target() {
    let prepared = preparer(Variant::Segmentation)
        .prepare(default_loan_table())
        .unwrap();

    let columns = prepared.features.columns();
    assert_eq!(columns.len(), 12);
    assert_eq!(columns[0], "PRECIO PRODUCTO");
    assert_eq!(columns[11], "TIPO DE COMPRAS");
    assert!(!columns.iter().any(|c| c == "CLIENTE"));
    assert!(!columns.iter().any(|c| c == "Cuotas pendientes actual"));
    assert_eq!(prepared.ignored_columns, vec!["Cuotas pendientes actual".to_string()]);
    assert!(prepared.labels.is_none());
}

#[test]
fn test_segmentation_scales_each_column() {
    let prepared = preparer(Variant::Segmentation)
        .prepare(default_loan_table())
        .unwrap();

    let scaled = &prepared.model_input;
    for col in 0..scaled.n_cols() {
        let mean = scaled.column(col).mean().unwrap();
        assert!(approx(mean, 0.0), "column {} has mean {}", col, mean);
    }
    // unscaled features are kept alongside
    assert_eq!(prepared.features.row(0)[0], 66908.0);
}

#[test]
fn test_unmapped_category_is_counted_and_imputed() {
    let mut rows = loan_rows();
    rows[1][7] = "Viudo";
    let prepared = preparer(Variant::Segmentation)
        .prepare(loan_table(&LOAN_HEADERS, &rows))
        .unwrap();

    let tally = prepared.ledger.tally("ESTADO CIVIL").unwrap();
    assert_eq!(tally.coerced, 1);
    assert_eq!(tally.missing, 0);
    assert_eq!(tally.imputed, 1);

    // mean of Casado (1) and Divorciado (2)
    assert_eq!(
        numeric(&prepared.cleaned, "ESTADO CIVIL"),
        vec![Some(1.0), Some(1.5), Some(2.0)]
    );
    assert_eq!(prepared.ledger.coerced_cells()[0].raw, "Viudo");
}

/// Empty row first, then the three clients with "Viudo" at input row 3
fn rows_with_leading_empty_row() -> Vec<Vec<&'static str>> {
    let mut rows = loan_rows();
    rows[2][7] = "Viudo";
    rows.insert(0, vec![""; 14]);
    rows
}

#[test]
fn test_coerced_cells_report_input_rows() {
    let prepared = preparer(Variant::Segmentation)
        .prepare(loan_table(&LOAN_HEADERS, &rows_with_leading_empty_row()))
        .unwrap();

    assert_eq!(prepared.rows_loaded, 5);
    assert_eq!(prepared.dropped_empty_rows, 2);
    assert_eq!(prepared.source_rows, vec![1, 2, 3]);

    let cells = prepared.ledger.coerced_cells();
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].column, "ESTADO CIVIL");
    assert_eq!(cells[0].raw, "Viudo");
    assert_eq!(cells[0].row, 3);

    // mean of Casado (1) and Soltero (0)
    assert_eq!(
        numeric(&prepared.cleaned, "ESTADO CIVIL"),
        vec![Some(1.0), Some(0.0), Some(0.5)]
    );
}

#[test]
fn test_strict_mode_reports_input_rows() {
    let err = preparer(Variant::Segmentation)
        .strict(true)
        .prepare(loan_table(&LOAN_HEADERS, &rows_with_leading_empty_row()))
        .unwrap_err();

    match err {
        PrepError::CoercedValues { cells } => {
            assert_eq!(cells.len(), 1);
            assert_eq!(cells[0].row, 3);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_strict_mode_rejects_unreadable_values() {
    let mut rows = loan_rows();
    rows[0][2] = "ocho mil";
    let err = preparer(Variant::Segmentation)
        .strict(true)
        .prepare(loan_table(&LOAN_HEADERS, &rows))
        .unwrap_err();

    match err {
        PrepError::CoercedValues { cells } => {
            assert_eq!(cells.len(), 1);
            assert_eq!(cells[0].column, "SUELDO");
            assert_eq!(cells[0].raw, "ocho mil");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_missing_flag_encodes_as_zero() {
    let mut rows = loan_rows();
    rows[0][9] = "";
    let prepared = preparer(Variant::Segmentation)
        .prepare(loan_table(&LOAN_HEADERS, &rows))
        .unwrap();

    assert_eq!(
        numeric(&prepared.cleaned, "VIVIENDA PROPIA"),
        vec![Some(0.0), Some(0.0), Some(1.0)]
    );
    assert_eq!(prepared.ledger.tally("VIVIENDA PROPIA").unwrap().missing, 1);
}

#[test]
fn test_no_nulls_remain_after_preparation() {
    let rows = random_loan_rows(200, 7);
    let row_refs: Vec<Vec<&str>> = rows
        .iter()
        .map(|r| r.iter().map(String::as_str).collect())
        .collect();
    let table = loan_table(&LOAN_HEADERS, &row_refs);

    for variant in [Variant::Segmentation, Variant::Classification] {
        let prepared = preparer(variant).prepare(table.clone()).unwrap();
        assert!(prepared.cleaned.get_columns().iter().all(|c| c.null_count() == 0));
        assert!(prepared.features.rows().all(|row| row.iter().all(|v| v.is_finite())));
    }
}

#[test]
fn test_missing_required_column() {
    let headers: Vec<&str> = LOAN_HEADERS.iter().copied().filter(|h| *h != "SUELDO").collect();
    let rows: Vec<Vec<&str>> = loan_rows()
        .into_iter()
        .map(|mut r| {
            r.remove(2);
            r
        })
        .collect();
    let err = preparer(Variant::Segmentation)
        .prepare(loan_table(&headers, &rows))
        .unwrap_err();

    match err {
        PrepError::SchemaMismatch { missing, .. } => assert_eq!(missing, vec!["SUELDO".to_string()]),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_only_empty_rows_is_an_error() {
    let rows = vec![vec![""; 14], vec![""; 14]];
    let err = preparer(Variant::Segmentation)
        .prepare(loan_table(&LOAN_HEADERS, &rows))
        .unwrap_err();
    assert!(matches!(err, PrepError::EmptyTable));
}

#[test]
fn test_classification_labels_and_one_hot() {
    let mut headers = LOAN_HEADERS.to_vec();
    headers.push("SUCURSAL");
    let extra = ["Norte", "", "Centro", ""];
    let rows: Vec<Vec<&str>> = loan_rows()
        .into_iter()
        .zip(extra)
        .map(|(mut r, e)| {
            r.push(e);
            r
        })
        .collect();

    let prepared = preparer(Variant::Classification)
        .prepare(loan_table(&headers, &rows))
        .unwrap();

    assert_eq!(prepared.labels, Some(vec![1, 0, 1]));

    let columns = prepared.features.columns();
    let tail: Vec<&str> = columns[columns.len() - 3..].iter().map(String::as_str).collect();
    assert_eq!(tail, vec!["SUCURSAL_Centro", "SUCURSAL_Norte", "SUCURSAL_Unknown"]);
    assert!(!columns.iter().any(|c| c == "SUCURSAL"));
    assert!(!columns.iter().any(|c| c == FIT_COLUMN));
    assert!(!columns.iter().any(|c| c == "Cuotas pendientes actual"));

    let names = prepared.cleaned.get_column_names();
    assert_eq!(names.last().map(|n| n.as_str()), Some(FIT_COLUMN));
    assert_eq!(
        numeric(&prepared.cleaned, FIT_COLUMN),
        vec![Some(1.0), Some(0.0), Some(1.0)]
    );

    // classification features are not scaled
    assert!(prepared.state.scaler.is_none());
    assert_eq!(prepared.model_input, prepared.features);
    assert_eq!(prepared.state.one_hot.len(), 1);
}

#[test]
fn test_classification_keeps_numeric_extra_columns() {
    let mut headers = LOAN_HEADERS.to_vec();
    headers.push("BURO");
    let extra = ["1.5", "", "2.5", ""];
    let rows: Vec<Vec<&str>> = loan_rows()
        .into_iter()
        .zip(extra)
        .map(|(mut r, e)| {
            r.push(e);
            r
        })
        .collect();

    let prepared = preparer(Variant::Classification)
        .prepare(loan_table(&headers, &rows))
        .unwrap();

    assert_eq!(prepared.cleaned.column("BURO").unwrap().dtype(), &DataType::Float64);
    assert_eq!(
        numeric(&prepared.cleaned, "BURO"),
        vec![Some(1.5), Some(2.0), Some(2.5)]
    );
    assert_eq!(prepared.state.impute_means.get("BURO"), Some(&2.0));
}

#[test]
fn test_missing_pending_installments_is_not_fit() {
    let mut rows = loan_rows();
    rows[0][13] = "";
    let prepared = preparer(Variant::Classification)
        .prepare(loan_table(&LOAN_HEADERS, &rows))
        .unwrap();
    assert_eq!(prepared.labels, Some(vec![0, 0, 1]));
}

#[test]
fn test_prepare_from_csv_file() {
    let (_dir, path) = create_default_loan_csv();
    let schema = Schema::default_loan_records().unwrap();
    let table = load_table(&path, &schema, &LoadOptions::default()).unwrap();

    let prepared = Preparer::new(schema, Variant::Segmentation)
        .prepare(table)
        .unwrap();
    assert_eq!(prepared.features.n_rows(), 3);
    assert_eq!(
        numeric(&prepared.cleaned, "PRECIO PRODUCTO"),
        vec![Some(66908.0), Some(45000.0), Some(120500.0)]
    );
}
