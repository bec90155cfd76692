//! Structural self-check over finished artifacts.
//!
//! A failure here is a builder defect, not bad input: the generator runs this
//! over every artifact before handing it out, and callers must treat a
//! violation as fatal for that artifact.

use crate::block::{
    CTA_EXTENSION_TAG, DESCRIPTOR_OFFSETS, EDID_BLOCK_SIZE, HEADER_MAGIC, TAG_DISPLAY_NAME,
    TAG_DUMMY, TAG_RANGE_LIMITS,
};
use crate::checksum;
use crate::error::{EdidError, InvalidReason, Result};

// Tags the descriptor region may legitimately carry. 0xFE (unspecified text)
// and 0xFF (serial string) are accepted on re-parse even though the builder
// currently never emits them.
const KNOWN_DESCRIPTOR_TAGS: [u8; 5] = [TAG_DUMMY, TAG_DISPLAY_NAME, TAG_RANGE_LIMITS, 0xFE, 0xFF];

/// Check every structural invariant of an artifact, in order: block length,
/// header magic, per-block checksum, extension count, descriptor region.
/// Returns the first violated invariant.
pub fn validate(artifact: &[u8]) -> Result<()> {
    if artifact.is_empty() || artifact.len() % EDID_BLOCK_SIZE != 0 {
        return invalid(InvalidReason::BadLength(artifact.len()));
    }

    if artifact[0..8] != HEADER_MAGIC {
        return invalid(InvalidReason::BadHeader);
    }

    for (index, block) in artifact.chunks_exact(EDID_BLOCK_SIZE).enumerate() {
        if !checksum::verify(block) {
            let sum = block.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
            return invalid(InvalidReason::BadChecksum { block: index, sum });
        }
    }

    let extension_blocks = artifact.len() / EDID_BLOCK_SIZE - 1;
    let declared = artifact[126];
    if usize::from(declared) != extension_blocks {
        return invalid(InvalidReason::ExtensionCountMismatch {
            declared,
            actual: extension_blocks,
        });
    }

    check_descriptor_region(artifact)?;

    for (index, block) in artifact.chunks_exact(EDID_BLOCK_SIZE).enumerate().skip(1) {
        if block[0] != CTA_EXTENSION_TAG {
            return invalid(InvalidReason::UnknownExtensionTag {
                block: index,
                tag: block[0],
            });
        }
    }

    Ok(())
}

/// The four descriptor slots must hold exactly one detailed timing (the
/// preferred mode, in the first slot) and otherwise only recognized
/// display-descriptor tags.
fn check_descriptor_region(artifact: &[u8]) -> Result<()> {
    let mut detailed_timings = 0usize;
    let mut first_is_timing = false;

    for (slot_index, &offset) in DESCRIPTOR_OFFSETS.iter().enumerate() {
        let slot = &artifact[offset..offset + 18];
        // A non-zero leading u16 is a pixel clock, marking a detailed timing.
        if slot[0] != 0 || slot[1] != 0 {
            detailed_timings += 1;
            if slot_index == 0 {
                first_is_timing = true;
            }
            continue;
        }
        let tag = slot[3];
        if !KNOWN_DESCRIPTOR_TAGS.contains(&tag) {
            return invalid(InvalidReason::UnknownDescriptorTag {
                slot: slot_index,
                tag,
            });
        }
    }

    if detailed_timings != 1 {
        return invalid(InvalidReason::PreferredTimingCount(detailed_timings));
    }
    if !first_is_timing {
        return invalid(InvalidReason::PreferredNotFirst);
    }
    Ok(())
}

fn invalid(reason: InvalidReason) -> Result<()> {
    Err(EdidError::InvalidEdid(reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::build;
    use crate::profile::{EdidProfile, ExtensionPolicy};
    use crate::timing::compute_timing;

    fn valid_artifact() -> Vec<u8> {
        let profile = EdidProfile::ultrawide_49();
        let timing = compute_timing(5120, 1440, 60, profile.image_size_mm).unwrap();
        build(&profile, &timing).unwrap()
    }

    #[test]
    fn accepts_a_freshly_built_artifact() {
        validate(&valid_artifact()).unwrap();
    }

    #[test]
    fn accepts_an_artifact_with_cta_extension() {
        let mut profile = EdidProfile::ultrawide_49();
        profile.extension = ExtensionPolicy::CtaHeaderOnly;
        let timing = compute_timing(5120, 1440, 60, profile.image_size_mm).unwrap();
        let artifact = build(&profile, &timing).unwrap();
        validate(&artifact).unwrap();
    }

    #[test]
    fn rejects_bad_length() {
        let artifact = valid_artifact();
        let err = validate(&artifact[..100]).unwrap_err();
        assert!(matches!(
            err,
            EdidError::InvalidEdid(InvalidReason::BadLength(100))
        ));
        assert!(matches!(
            validate(&[]).unwrap_err(),
            EdidError::InvalidEdid(InvalidReason::BadLength(0))
        ));
    }

    #[test]
    fn rejects_bad_header() {
        let mut artifact = valid_artifact();
        artifact[1] = 0x00;
        // Header damage also breaks the checksum; the header check runs first.
        assert!(matches!(
            validate(&artifact).unwrap_err(),
            EdidError::InvalidEdid(InvalidReason::BadHeader)
        ));
    }

    #[test]
    fn rejects_bad_checksum() {
        let mut artifact = valid_artifact();
        artifact[40] ^= 0x10;
        assert!(matches!(
            validate(&artifact).unwrap_err(),
            EdidError::InvalidEdid(InvalidReason::BadChecksum { block: 0, .. })
        ));
    }

    #[test]
    fn rejects_extension_count_mismatch() {
        let mut artifact = valid_artifact();
        artifact[126] = 1;
        artifact[127] = artifact[127].wrapping_sub(1); // keep checksum valid
        assert!(matches!(
            validate(&artifact).unwrap_err(),
            EdidError::InvalidEdid(InvalidReason::ExtensionCountMismatch {
                declared: 1,
                actual: 0
            })
        ));
    }

    #[test]
    fn rejects_unknown_descriptor_tag() {
        let mut artifact = valid_artifact();
        let delta = 0x42u8.wrapping_sub(artifact[108 + 3]);
        artifact[108 + 3] = 0x42;
        artifact[127] = artifact[127].wrapping_sub(delta);
        assert!(matches!(
            validate(&artifact).unwrap_err(),
            EdidError::InvalidEdid(InvalidReason::UnknownDescriptorTag { slot: 3, tag: 0x42 })
        ));
    }

    #[test]
    fn rejects_missing_preferred_timing() {
        let mut artifact = valid_artifact();
        // Zero the pixel clock and retag: the slot turns into a dummy descriptor.
        artifact[54] = 0;
        artifact[55] = 0;
        artifact[56] = 0;
        artifact[57] = TAG_DUMMY;
        artifact[127] = crate::checksum::compute(&artifact[..127]);
        assert!(matches!(
            validate(&artifact).unwrap_err(),
            EdidError::InvalidEdid(InvalidReason::PreferredTimingCount(0))
        ));
    }

    #[test]
    fn rejects_unknown_extension_tag() {
        let mut profile = EdidProfile::ultrawide_49();
        profile.extension = ExtensionPolicy::CtaHeaderOnly;
        let timing = compute_timing(5120, 1440, 60, profile.image_size_mm).unwrap();
        let mut artifact = build(&profile, &timing).unwrap();
        artifact[128] = 0x70;
        artifact[255] = crate::checksum::compute(&artifact[128..255]);
        assert!(matches!(
            validate(&artifact).unwrap_err(),
            EdidError::InvalidEdid(InvalidReason::UnknownExtensionTag { block: 1, tag: 0x70 })
        ));
    }
}
