//! `lumen-cli` library crate.
//!
//! Line parsing and text rendering for the terminal host. The binary
//! entrypoint lives in `main.rs`.

pub mod input;
pub mod view;
