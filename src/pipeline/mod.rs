//! Pipeline stages.
//!
//! ```text
//! Extraction:  input ──▶ render (spawn_blocking) ──▶ crop ──▶ encode (PNG, atomic write)
//! Manifest:    input ──▶ encode (base64) ──▶ vision model ──▶ manifest ──▶ encode (JSON, atomic write)
//! ```
//!
//! Each stage is a plain module so it can be tested in isolation; the
//! end-to-end orchestration lives in [`crate::extract`] and [`crate::generate`].

pub mod crop;
pub mod encode;
pub mod input;
pub mod render;
