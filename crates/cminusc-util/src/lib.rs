//! cminusc-util - shared foundations for the cminusc compiler.
//!
//! Holds the pieces every other crate in the workspace needs: source
//! spans (`span`) and the diagnostic stage/formatting vocabulary
//! (`diagnostic`). Kept deliberately small: this compiler has no need for
//! string interning or arena allocation, so unlike larger compilers this
//! crate does not grow a `Symbol`/`StringTable` layer.

pub mod diagnostic;
pub mod span;

pub use diagnostic::{report_fatal, Stage};
pub use span::Span;
