//! cvm-fii: acquisition and consolidation of CVM quarterly FII disclosures
//!
//! The [`acquisition`] stage mirrors the CVM archive listing into a base
//! directory; the [`consolidation`] stage merges every extracted table into
//! one `consolidado_<type>.csv` per report type.

pub mod acquisition;
pub mod cli;
pub mod config;
pub mod consolidation;
pub mod errors;
pub mod models;
pub mod progress;

pub use errors::{AcquisitionError, ConsolidationError, ReadError};
