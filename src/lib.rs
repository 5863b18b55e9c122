//! Global pairwise sequence alignment scoring with dependency-respecting parallel fills.
//!
//! ```no_run
//! use gpsa::inputs::AlignmentInputs;
//! use gpsa::scoring::SubstitutionTable;
//! use gpsa::wavefront::{fill, Strategy};
//!
//! let (table, cmap) = SubstitutionTable::match_mismatch(b"ACGTU", 1.0, -1.0, -2.0)?;
//! let inputs = AlignmentInputs::new("GATTACA", "GCATGCU", table, cmap)?;
//!
//! let result = fill(&inputs, Strategy::TiledBlockDiagonal, 16)?;
//! assert_eq!(result.matrix.final_score(), -1.0);
//! # Ok::<(), gpsa::errors::GpsaError>(())
//! ```

pub mod errors;
pub mod inputs;
pub mod io;
pub mod matrix;
pub mod scoring;
pub mod wavefront;
