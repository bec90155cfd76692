#![forbid(unsafe_code)]

//! EDID block builder for a fixed-geometry panel.
//!
//! Builds VESA EDID 1.4 base blocks (and, optionally, a header-only CTA-861
//! extension block) describing one panel at a selectable refresh rate, for use
//! with kernel firmware-EDID override paths.
//!
//! This crate intentionally provides a *pure* builder API that returns fully
//! formed blocks as `Vec<u8>` so callers can decide how to write them. All
//! filesystem side effects live in the `edid-gen` tool.

pub mod block;
pub mod checksum;
pub mod dump;
mod error;
pub mod profile;
pub mod timing;
pub mod validate;
pub mod variants;

pub use block::{build, EDID_BLOCK_SIZE, HEADER_MAGIC};
pub use error::{EdidError, InvalidReason, Result};
pub use profile::{
    AspectRatio, Chromaticity, EdidProfile, ExtensionPolicy, FeatureFlags, ManufacturerId,
    StandardTiming, VideoInput,
};
pub use timing::{compute_timing, DetailedTiming, DtdFlags};
pub use variants::{generate_variants, Artifact, Variant};
