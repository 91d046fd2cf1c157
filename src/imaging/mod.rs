//! Image probing and fit math.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` (header only, no full decode) |
//! | **Fit** | pure aspect-preserving scaling in [`calculations`] |
//!
//! The module is split into:
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Calculations**: pure functions for placement math (unit testable)

pub mod backend;
pub mod calculations;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::fit_within;
pub use rust_backend::{RustBackend, supported_input_extensions};
