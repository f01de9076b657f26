//! # Larder Application Library
//!
//! Command-line surface and configuration layer of the Larder binary,
//! exposed as a library so the commands can be driven from tests.

pub mod cli;
pub mod config;
