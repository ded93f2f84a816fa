//! HTTP client for the lumen image service.
//!
//! Provides typed wrappers over the image, tag, upload, auth and config
//! endpoints using [`reqwest`], and the [`service::ImageService`] seam the
//! session engine is written against.

pub mod api;
pub mod service;
pub mod wire;
