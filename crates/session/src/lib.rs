//! `lumen-session` -- the gallery session engine.
//!
//! A [`session::Session`] owns the catalog of the current search, drives
//! paginated retrieval, tracks selection and the lightbox cursor, and runs
//! uploads through a bounded worker pool. Hosts talk to it through method
//! calls and named commands, and listen to it through the event bus.

pub mod commands;
pub mod config;
mod context;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod navigator;
pub mod render;
pub mod sentinel;
pub mod session;
pub mod tagger;
pub mod upload;
