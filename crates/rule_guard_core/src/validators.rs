//! The built-in check catalog.
//!
//! Each submodule groups related check variants; every variant decodes its
//! own strictly-typed parameters and declares its stable configuration name.

pub mod alerts;
pub mod annotations;
pub mod expression;
pub mod labels;
