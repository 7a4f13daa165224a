//! Pipeline module - load, clean, encode, impute and fit preparation state

pub mod backend;
pub mod currency;
pub mod encode;
pub mod error;
pub mod ledger;
pub mod loader;
pub mod matrix;
pub mod missing;
pub mod onehot;
pub mod prepare;
pub mod scale;
pub mod state;

pub use backend::*;
pub use currency::*;
pub use encode::*;
pub use error::*;
pub use ledger::*;
pub use loader::*;
pub use matrix::*;
pub use missing::*;
pub use onehot::*;
pub use prepare::*;
pub use scale::*;
pub use state::*;
