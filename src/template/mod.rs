// src/template/mod.rs

//! Relay config templating.
//!
//! - [`render`] is a pure text transform: literal placeholder → value.
//! - [`materialize`] reads a template through a [`crate::fs::FileSystem`],
//!   renders it, and writes the result to a resolved output path.

pub mod materialize;
pub mod render;

pub use materialize::materialize;
pub use render::render;

/// One resolved replacement: every occurrence of `placeholder` becomes
/// `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub placeholder: String,
    pub value: String,
}

impl Substitution {
    pub fn new(placeholder: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            value: value.into(),
        }
    }
}
