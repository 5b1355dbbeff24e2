//! Numeric primitives: the bound map and the Voigt special function.

pub mod bound;
pub mod voigt;

pub use bound::{amp, Bound};
pub use voigt::voigt;
