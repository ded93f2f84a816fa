//! Event fan-out for the lumen session engine.
//!
//! The engine never calls back into the host directly; it publishes
//! [`bus::GalleryEvent`]s and hosts subscribe to whatever they render.

pub mod bus;
