//! # MMFD Common Library
//!
//! Shared code for the multi-modal fake news detection services:
//! - Modality data model (per-modality results, verdicts, analysis requests)
//! - Configuration schema and resolution
//! - Common error types

pub mod config;
pub mod error;
pub mod modality;

pub use error::{Error, Result};
pub use modality::{AnalysisRequest, ConfidenceLevel, Modality, ModalityResult, Verdict};
