//! credprep: Loan Record Preparation Library
//!
//! Cleans and encodes tabular loan records into numeric feature matrices
//! for a customer segmentation model and a credit-fitness classifier, and
//! keeps the fitted state needed to transform single records the same way.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod utils;
