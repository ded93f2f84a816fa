//! Pure domain logic for the lumen gallery client.
//!
//! Everything in this crate is synchronous and free of I/O so the
//! session engine, the CLI host and tests can share one source of
//! truth for catalog, layout, selection, lightbox and upload rules.

pub mod catalog;
pub mod commands;
pub mod error;
pub mod layout;
pub mod lightbox;
pub mod pagination;
pub mod selection;
pub mod types;
pub mod upload;
pub mod validation;
