//! Core domain types and shared logic for the darkroom image service.
//!
//! This crate defines the canonical data model used across all other crates:
//! - The canonical image record and its lifecycle statuses
//! - Dual-shape label values and their accessors
//! - Upload acceptance rules
//! - Configuration types

pub mod config;
pub mod entity;
pub mod error;
pub mod label;
pub mod upload;

pub use entity::{Dimensions, ImageRecord, ImageStatus, METADATA_SENTINEL, SEARCHABLE_STATUSES};
pub use error::{Error, Result};
pub use label::{Label, LabelStats, LabelValue};
pub use upload::{ALLOWED_MIME_TYPES, MAX_IMAGE_BYTES, new_image_id};
