//! Chart rendering (SVG side effects, invoked after finalization only).

pub mod svg;

pub use svg::{render_decomposition, render_raw};
