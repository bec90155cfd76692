//! Per-refresh-rate variant generation.
//!
//! Drives timing derivation, block assembly, checksumming, and the structural
//! self-check for each requested rate. A rate that cannot be encoded is
//! recorded in its own [`Variant`] and never aborts the remaining rates;
//! a malformed profile fails the whole run before any timing work.

use crate::block;
use crate::dump;
use crate::error::{EdidError, Result};
use crate::profile::EdidProfile;
use crate::timing::{self, DetailedTiming};
use crate::validate;

/// One generated artifact: the raw block bytes plus a human-readable dump and
/// the timing that produced them.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub dump: String,
    pub timing: DetailedTiming,
}

/// Outcome of one requested refresh rate.
#[derive(Debug)]
pub struct Variant {
    pub rate_hz: u32,
    pub outcome: std::result::Result<Artifact, EdidError>,
}

impl Variant {
    /// True when the failure indicates a builder defect rather than an
    /// unencodable mode.
    pub fn is_builder_defect(&self) -> bool {
        matches!(self.outcome, Err(EdidError::InvalidEdid(_)))
    }
}

/// Generate one artifact per requested refresh rate, in request order.
///
/// Generation is stateless and repeatable: the same profile and rate set
/// reproduce byte-identical artifacts.
pub fn generate_variants(profile: &EdidProfile, rates_hz: &[u32]) -> Result<Vec<Variant>> {
    profile.validate()?;
    Ok(rates_hz
        .iter()
        .map(|&rate_hz| Variant {
            rate_hz,
            outcome: generate_one(profile, rate_hz),
        })
        .collect())
}

fn generate_one(profile: &EdidProfile, rate_hz: u32) -> std::result::Result<Artifact, EdidError> {
    let timing = timing::compute_timing(
        profile.h_active,
        profile.v_active,
        rate_hz,
        profile.image_size_mm,
    )?;
    let bytes = block::build(profile, &timing)?;
    validate::validate(&bytes)?;
    let dump = dump::render(profile, &timing, &bytes);
    Ok(Artifact {
        bytes,
        dump,
        timing,
    })
}
