//! Bookkeeping of lossy conversions
//!
//! Parse failures and unmapped categories are imputed exactly like cells that
//! were missing in the input. The ledger keeps the two apart so a run can show
//! how much of the "missing" data was really unreadable data.

use serde::Serialize;

use super::error::CoercedCell;

/// Per-column counts collected while cleaning
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnTally {
    pub column: String,
    /// Cells that were null in the raw input
    pub missing: usize,
    /// Cells with a value that could not be parsed or mapped
    pub coerced: usize,
    /// Cells filled by imputation
    pub imputed: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CoercionLedger {
    tallies: Vec<ColumnTally>,
    #[serde(skip)]
    cells: Vec<CoercedCell>,
}

impl CoercionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn tally_mut(&mut self, column: &str) -> &mut ColumnTally {
        let idx = match self.tallies.iter().position(|t| t.column == column) {
            Some(idx) => idx,
            None => {
                self.tallies.push(ColumnTally {
                    column: column.to_string(),
                    ..Default::default()
                });
                self.tallies.len() - 1
            }
        };
        &mut self.tallies[idx]
    }

    pub fn record_missing(&mut self, column: &str) {
        self.tally_mut(column).missing += 1;
    }

    /// Count `count` null cells at once, for columns that arrive already numeric
    pub fn record_missing_count(&mut self, column: &str, count: usize) {
        if count > 0 {
            self.tally_mut(column).missing += count;
        }
    }

    /// `row` is the index of the cell in the loaded input
    pub fn record_coerced(&mut self, column: &str, row: usize, raw: &str) {
        self.tally_mut(column).coerced += 1;
        self.cells.push(CoercedCell {
            column: column.to_string(),
            row,
            raw: raw.to_string(),
        });
    }

    pub fn record_imputed(&mut self, column: &str, count: usize) {
        if count > 0 {
            self.tally_mut(column).imputed += count;
        }
    }

    pub fn tally(&self, column: &str) -> Option<&ColumnTally> {
        self.tallies.iter().find(|t| t.column == column)
    }

    pub fn tallies(&self) -> &[ColumnTally] {
        &self.tallies
    }

    pub fn coerced_cells(&self) -> &[CoercedCell] {
        &self.cells
    }

    pub fn total_missing(&self) -> usize {
        self.tallies.iter().map(|t| t.missing).sum()
    }

    pub fn total_coerced(&self) -> usize {
        self.tallies.iter().map(|t| t.coerced).sum()
    }

    pub fn total_imputed(&self) -> usize {
        self.tallies.iter().map(|t| t.imputed).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_and_coerced_are_counted_apart() {
        let mut ledger = CoercionLedger::new();
        ledger.record_missing("SUELDO");
        ledger.record_missing_count("SUELDO", 0);
        ledger.record_coerced("SUELDO", 4, "N/A");
        ledger.record_coerced("ESTADO CIVIL", 2, "Viudo");
        ledger.record_imputed("SUELDO", 2);
        ledger.record_imputed("ESTADO CIVIL", 0);

        let sueldo = ledger.tally("SUELDO").unwrap();
        assert_eq!(sueldo.missing, 1);
        assert_eq!(sueldo.coerced, 1);
        assert_eq!(sueldo.imputed, 2);

        assert_eq!(ledger.total_missing(), 1);
        assert_eq!(ledger.total_coerced(), 2);
        assert_eq!(ledger.total_imputed(), 2);
        assert_eq!(ledger.coerced_cells()[1].raw, "Viudo");
    }

    #[test]
    fn test_tallies_keep_first_seen_order() {
        let mut ledger = CoercionLedger::new();
        ledger.record_missing("VIVIENDA PROPIA");
        ledger.record_missing("SUELDO");
        ledger.record_missing_count("DEPENDIENTES ECONOMICOS", 3);

        let columns: Vec<&str> = ledger.tallies().iter().map(|t| t.column.as_str()).collect();
        assert_eq!(
            columns,
            vec!["VIVIENDA PROPIA", "SUELDO", "DEPENDIENTES ECONOMICOS"]
        );
        assert_eq!(ledger.tally("DEPENDIENTES ECONOMICOS").unwrap().missing, 3);
        assert_eq!(ledger.total_missing(), 5);
    }
}
