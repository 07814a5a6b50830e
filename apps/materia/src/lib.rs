//! # Materia CLI Library
//!
//! Library half of the `materia` binary, split out so integration tests can
//! drive document loading and commands directly.

pub mod cli;
pub mod document;
