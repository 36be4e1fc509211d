//! # sync-types
//!
//! Wire format types for the waveland file mirroring protocol.
//!
//! This crate provides the foundational types used across all waveland crates:
//! - [`FileUpdate`] - A single `<name>|<base64 payload>` text frame
//! - [`validate_name`] - Path-safety rule for names received over the wire
//! - [`is_editor_artifact`] - Swap/backup/temp file recognition
//! - [`ContentHash`] - Digest used for change detection
//! - [`FrameError`] - Validation errors

#![warn(missing_docs)]
#![warn(clippy::all)]

mod artifact;
mod error;
mod frame;
mod hash;
mod name;

pub use artifact::{is_editor_artifact, BACKUP_SUFFIX, TEMP_SUFFIX};
pub use error::FrameError;
pub use frame::{FileUpdate, DELIMITER, MAX_FRAME_SIZE};
pub use hash::ContentHash;
pub use name::validate_name;
