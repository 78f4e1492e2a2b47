//! # Curvekit Math
//!
//! Numerical building blocks for the Curvekit curve calibration engine.
//!
//! This crate provides:
//!
//! - **Linear Algebra**: Dense inversion, products and block slicing on
//!   `nalgebra` matrices
//! - **Interpolation**: Linear interpolation with node sensitivities
//! - **Solvers**: Newton and Broyden root finders for square nonlinear systems
//!
//! ## Design Philosophy
//!
//! - **No shared state**: every routine is a free function or a small value type
//! - **Errors, not panics**: singular systems and non-convergence surface as [`MathError`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::uninlined_format_args)]

pub mod error;
pub mod interpolation;
pub mod linear_algebra;
pub mod solvers;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{MathError, MathResult};
    pub use crate::interpolation::{Interpolator, LinearInterpolator};
    pub use crate::linear_algebra::{block, invert, multiply, scale, set_block};
    pub use crate::solvers::{
        BroydenVectorRootFinder, NewtonVectorRootFinder, VectorRootFinder,
        VectorRootFinderConfig, VectorRootResult,
    };
}

pub use error::{MathError, MathResult};
