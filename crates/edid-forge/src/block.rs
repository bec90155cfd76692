//! Assembly of the 128-byte base block (and optional CTA extension block)
//! from a profile plus one computed detailed timing.

use crate::checksum;
use crate::error::{EdidError, Result};
use crate::profile::{EdidProfile, ExtensionPolicy, StandardTiming};
use crate::timing::DetailedTiming;

pub const EDID_BLOCK_SIZE: usize = 128;
pub const HEADER_MAGIC: [u8; 8] = [0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];

/// Byte offsets of the four 18-byte descriptor slots.
pub(crate) const DESCRIPTOR_OFFSETS: [usize; 4] = [54, 72, 90, 108];

const EDID_VERSION: (u8, u8) = (1, 4);

pub(crate) const TAG_DISPLAY_NAME: u8 = 0xFC;
pub(crate) const TAG_RANGE_LIMITS: u8 = 0xFD;
pub(crate) const TAG_DUMMY: u8 = 0x10;
pub(crate) const CTA_EXTENSION_TAG: u8 = 0x02;
const CTA_REVISION: u8 = 3;

// Floor values for the range-limits descriptor; the ceiling always comes from
// the generated timing so the limits bracket it.
const RANGE_MIN_V_RATE_HZ: u64 = 48;
const RANGE_MIN_H_RATE_KHZ: u64 = 30;

/// Build the finished artifact for one (profile, timing) pair: the base block
/// with its checksum applied, plus the extension block when the profile asks
/// for one. The output always has a length that is a multiple of 128.
pub fn build(profile: &EdidProfile, timing: &DetailedTiming) -> Result<Vec<u8>> {
    let mut base = assemble_base(profile, timing)?;
    base[127] = checksum::compute(&base[..127]);

    let mut artifact = base.to_vec();
    if profile.extension == ExtensionPolicy::CtaHeaderOnly {
        artifact.extend_from_slice(&cta_extension_block());
    }
    Ok(artifact)
}

/// Assemble the base block with a zeroed checksum byte (not yet valid).
fn assemble_base(profile: &EdidProfile, timing: &DetailedTiming) -> Result<[u8; EDID_BLOCK_SIZE]> {
    profile.validate()?;

    let mut block = [0u8; EDID_BLOCK_SIZE];
    block[0..8].copy_from_slice(&HEADER_MAGIC);
    block[8..10].copy_from_slice(&profile.manufacturer.to_bytes());
    block[10..12].copy_from_slice(&profile.product_code.to_le_bytes());
    block[12..16].copy_from_slice(&profile.serial_number.to_le_bytes());
    block[16] = profile.manufacture_week;
    block[17] = (profile.manufacture_year - 1990) as u8;
    block[18] = EDID_VERSION.0;
    block[19] = EDID_VERSION.1;
    block[20] = profile.video_input.encode();
    block[21] = profile.screen_size_cm.0;
    block[22] = profile.screen_size_cm.1;
    block[23] = (profile.gamma_x100 - 100) as u8;
    block[24] = profile.features.bits();
    block[25..35].copy_from_slice(&profile.chromaticity.pack());
    block[35..38].copy_from_slice(&profile.established_timings);

    for (i, slot) in block[38..54].chunks_exact_mut(2).enumerate() {
        match profile.standard_timings.get(i).and_then(|t| t.encode()) {
            Some(enc) => slot.copy_from_slice(&enc),
            None => slot.copy_from_slice(&StandardTiming::UNUSED),
        }
    }

    block[54..72].copy_from_slice(&timing.encode());
    write_display_name(&mut block[72..90], &profile.display_name);
    write_range_limits(&mut block[90..108], timing)?;
    write_dummy(&mut block[108..126]);

    block[126] = match profile.extension {
        ExtensionPolicy::None => 0,
        ExtensionPolicy::CtaHeaderOnly => 1,
    };
    Ok(block)
}

/// Monitor name descriptor (tag 0xFC): payload is exactly 13 bytes, truncated
/// if longer, 0x0A-terminated when shorter, space-filled after the terminator.
fn write_display_name(slot: &mut [u8], name: &str) {
    slot[0..5].copy_from_slice(&[0x00, 0x00, 0x00, TAG_DISPLAY_NAME, 0x00]);
    let payload = &mut slot[5..18];
    payload.fill(0x20);
    let bytes = name.as_bytes();
    let n = bytes.len().min(13);
    payload[..n].copy_from_slice(&bytes[..n]);
    if n < 13 {
        payload[n] = 0x0A;
    }
}

/// Range limits descriptor (tag 0xFD), derived from the generated timing so
/// the advertised limits always bracket it.
fn write_range_limits(slot: &mut [u8], timing: &DetailedTiming) -> Result<()> {
    let clock_hz = timing.pixel_clock_hz();
    let frame = u64::from(timing.h_total()) * u64::from(timing.v_total());
    // Exact floor/ceil of the achieved rates so the limits always bracket them.
    let min_v = (clock_hz / frame).min(RANGE_MIN_V_RATE_HZ).max(1);
    let max_v = clock_hz.div_ceil(frame);

    let h_freq_hz = timing.h_freq_hz();
    let min_h_khz = (h_freq_hz / 1000).min(RANGE_MIN_H_RATE_KHZ).max(1);
    let max_h_khz = h_freq_hz.div_ceil(1000);

    let max_clock_10mhz = timing.pixel_clock_hz().div_ceil(10_000_000);

    slot[0..5].copy_from_slice(&[0x00, 0x00, 0x00, TAG_RANGE_LIMITS, 0x00]);
    slot[5] = rate_u8("range_min_v_rate", min_v)?;
    slot[6] = rate_u8("range_max_v_rate", max_v)?;
    slot[7] = rate_u8("range_min_h_rate", min_h_khz)?;
    slot[8] = rate_u8("range_max_h_rate", max_h_khz)?;
    slot[9] = rate_u8("range_max_pixel_clock", max_clock_10mhz)?;
    // No secondary timing formula; pad per the descriptor format.
    slot[10] = 0x00;
    slot[11] = 0x0A;
    slot[12..18].fill(0x20);
    Ok(())
}

/// Unused descriptor slot (tag 0x10, zero payload).
fn write_dummy(slot: &mut [u8]) {
    slot.fill(0x00);
    slot[3] = TAG_DUMMY;
}

/// Header-only CTA-861 extension block: revision 3, no data block collection,
/// no native detailed timings, own checksum.
fn cta_extension_block() -> [u8; EDID_BLOCK_SIZE] {
    let mut block = [0u8; EDID_BLOCK_SIZE];
    block[0] = CTA_EXTENSION_TAG;
    block[1] = CTA_REVISION;
    block[2] = 0x00; // no DTDs present
    block[3] = 0x00; // native DTD count
    block[127] = checksum::compute(&block[..127]);
    block
}

fn rate_u8(field: &'static str, value: u64) -> Result<u8> {
    if value == 0 || value > u64::from(u8::MAX) {
        return Err(EdidError::TimingOverflow {
            field,
            value,
            max: u64::from(u8::MAX),
        });
    }
    Ok(value as u8)
}
