//! Detailed timing derivation and the 18-byte DTD encoding.
//!
//! The calculator is pure: identical (resolution, rate) inputs always produce
//! an identical descriptor. Blanking follows a reduced-blanking style rule
//! with a fixed 160-pixel horizontal blank and a vertical blank that scales
//! with the active height.

use bitflags::bitflags;

use crate::error::{EdidError, Result};

const PIXEL_CLOCK_UNIT_HZ: u64 = 10_000;
const MAX_PIXEL_CLOCK_UNITS: u64 = 0xFFFF;

// Reduced-blanking horizontal geometry (CVT-RB numbers).
const H_BLANK: u16 = 160;
const H_SYNC_OFFSET: u16 = 48;
const H_SYNC_PULSE: u16 = 32;
const V_SYNC_OFFSET: u8 = 3;
const V_SYNC_PULSE: u8 = 5;
const MIN_V_BLANK: u16 = 30;

bitflags! {
    /// Byte 17 of a detailed timing descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DtdFlags: u8 {
        const INTERLACED = 1 << 7;
        /// Sync type bits 4..3 = 0b11: digital separate sync.
        const SYNC_DIGITAL_SEPARATE = 0b11 << 3;
        const VSYNC_POSITIVE = 1 << 2;
        const HSYNC_POSITIVE = 1 << 1;
    }
}

/// One fully specified video mode, as carried in an 18-byte DTD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailedTiming {
    /// Pixel clock in 10 kHz units (the DTD's native granularity).
    pub pixel_clock_10khz: u16,
    pub h_active: u16,
    pub h_blank: u16,
    pub v_active: u16,
    pub v_blank: u16,
    pub h_sync_offset: u16,
    pub h_sync_pulse: u16,
    pub v_sync_offset: u8,
    pub v_sync_pulse: u8,
    pub h_image_mm: u16,
    pub v_image_mm: u16,
    pub h_border: u8,
    pub v_border: u8,
    pub flags: DtdFlags,
}

impl DetailedTiming {
    pub fn pixel_clock_hz(&self) -> u64 {
        u64::from(self.pixel_clock_10khz) * PIXEL_CLOCK_UNIT_HZ
    }

    pub fn h_total(&self) -> u32 {
        u32::from(self.h_active) + u32::from(self.h_blank)
    }

    pub fn v_total(&self) -> u32 {
        u32::from(self.v_active) + u32::from(self.v_blank)
    }

    /// Achieved vertical refresh in millihertz, from the encoded pixel clock.
    pub fn refresh_millihz(&self) -> u64 {
        let denom = u64::from(self.h_total()) * u64::from(self.v_total());
        if denom == 0 {
            return 0;
        }
        self.pixel_clock_hz() * 1000 / denom
    }

    /// Horizontal scan rate in hertz.
    pub fn h_freq_hz(&self) -> u64 {
        let h_total = u64::from(self.h_total());
        if h_total == 0 {
            return 0;
        }
        self.pixel_clock_hz() / h_total
    }

    /// The 18-byte DTD wire encoding.
    ///
    /// Byte 4 splits 5/3 between the high bits of `h_active` (bits 12:8) and
    /// `h_blank` (bits 10:8) so panels wider than 4095 pixels encode without
    /// truncation; byte 7 keeps the 4/4 split for the vertical fields.
    pub fn encode(&self) -> [u8; 18] {
        let [clock_lo, clock_hi] = self.pixel_clock_10khz.to_le_bytes();
        [
            clock_lo,
            clock_hi,
            (self.h_active & 0xFF) as u8,
            (self.h_blank & 0xFF) as u8,
            ((self.h_active >> 5) & 0xF8) as u8 | ((self.h_blank >> 8) & 0x07) as u8,
            (self.v_active & 0xFF) as u8,
            (self.v_blank & 0xFF) as u8,
            ((self.v_active >> 4) & 0xF0) as u8 | ((self.v_blank >> 8) & 0x0F) as u8,
            (self.h_sync_offset & 0xFF) as u8,
            (self.h_sync_pulse & 0xFF) as u8,
            ((self.v_sync_offset & 0x0F) << 4) | (self.v_sync_pulse & 0x0F),
            ((self.h_sync_offset >> 2) & 0xC0) as u8
                | ((self.h_sync_pulse >> 4) & 0x30) as u8
                | ((self.v_sync_offset >> 2) & 0x0C)
                | ((self.v_sync_pulse >> 4) & 0x03),
            (self.h_image_mm & 0xFF) as u8,
            (self.v_image_mm & 0xFF) as u8,
            ((self.h_image_mm >> 4) & 0xF0) as u8 | ((self.v_image_mm >> 8) & 0x0F) as u8,
            self.h_border,
            self.v_border,
            self.flags.bits(),
        ]
    }
}

/// Derive the preferred detailed timing for an active resolution at a target
/// vertical refresh.
///
/// Fails with [`EdidError::TimingOverflow`] when the computed pixel clock
/// exceeds the 16-bit 10 kHz encoding (655.35 MHz) or any geometric field
/// exceeds its bit width; values are never truncated.
pub fn compute_timing(
    h_active: u16,
    v_active: u16,
    refresh_hz: u32,
    image_size_mm: (u16, u16),
) -> Result<DetailedTiming> {
    if refresh_hz == 0 {
        return Err(EdidError::Profile("refresh rate must be positive"));
    }
    check_width("h_active", h_active.into(), 0x1FFF)?;
    check_width("v_active", v_active.into(), 0xFFF)?;
    check_width("h_image_mm", image_size_mm.0.into(), 0xFFF)?;
    check_width("v_image_mm", image_size_mm.1.into(), 0xFFF)?;

    let v_blank = (v_active / 32).max(MIN_V_BLANK);
    check_width("v_blank", v_blank.into(), 0xFFF)?;

    let h_total = u64::from(h_active) + u64::from(H_BLANK);
    let v_total = u64::from(v_active) + u64::from(v_blank);
    let clock_hz = h_total * v_total * u64::from(refresh_hz);
    let clock_units = (clock_hz + PIXEL_CLOCK_UNIT_HZ / 2) / PIXEL_CLOCK_UNIT_HZ;
    if clock_units > MAX_PIXEL_CLOCK_UNITS {
        return Err(EdidError::TimingOverflow {
            field: "pixel_clock",
            value: clock_units,
            max: MAX_PIXEL_CLOCK_UNITS,
        });
    }
    if clock_units == 0 {
        return Err(EdidError::Profile("computed pixel clock is below the 10 kHz unit"));
    }

    Ok(DetailedTiming {
        pixel_clock_10khz: clock_units as u16,
        h_active,
        h_blank: H_BLANK,
        v_active,
        v_blank,
        h_sync_offset: H_SYNC_OFFSET,
        h_sync_pulse: H_SYNC_PULSE,
        v_sync_offset: V_SYNC_OFFSET,
        v_sync_pulse: V_SYNC_PULSE,
        h_image_mm: image_size_mm.0,
        v_image_mm: image_size_mm.1,
        h_border: 0,
        v_border: 0,
        flags: DtdFlags::SYNC_DIGITAL_SEPARATE | DtdFlags::HSYNC_POSITIVE | DtdFlags::VSYNC_POSITIVE,
    })
}

fn check_width(field: &'static str, value: u64, max: u64) -> Result<()> {
    if value > max {
        return Err(EdidError::TimingOverflow { field, value, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ultrawide_60hz_reproduces_reference_blanking() {
        let timing = compute_timing(5120, 1440, 60, (1196, 339)).unwrap();
        assert_eq!(timing.h_blank, 160);
        assert_eq!(timing.v_blank, 45);
        // (5120 + 160) * (1440 + 45) * 60 = 470_448_000 Hz.
        assert_eq!(timing.pixel_clock_10khz, 47045);
    }

    #[test]
    fn flags_byte_matches_digital_separate_positive_sync() {
        let timing = compute_timing(1920, 1080, 60, (598, 336)).unwrap();
        assert_eq!(timing.encode()[17], 0x1E);
    }

    #[test]
    fn pixel_clock_overflow_is_reported_not_truncated() {
        // (5120 + 160) * (1440 + 45) * 120 is ~941 MHz, over the 655.35 MHz cap.
        let err = compute_timing(5120, 1440, 120, (1196, 339)).unwrap_err();
        match err {
            EdidError::TimingOverflow { field, value, max } => {
                assert_eq!(field, "pixel_clock");
                assert!(value > max);
            }
            other => panic!("expected TimingOverflow, got {other:?}"),
        }
    }

    #[test]
    fn geometric_field_overflow_is_reported() {
        let err = compute_timing(8192, 1440, 60, (1196, 339)).unwrap_err();
        assert!(matches!(
            err,
            EdidError::TimingOverflow { field: "h_active", .. }
        ));
    }

    #[test]
    fn zero_refresh_is_rejected() {
        assert!(compute_timing(1920, 1080, 0, (598, 336)).is_err());
    }

    #[test]
    fn determinism_identical_inputs_identical_descriptor() {
        let a = compute_timing(2560, 1440, 144, (700, 390)).unwrap();
        let b = compute_timing(2560, 1440, 144, (700, 390)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.encode(), b.encode());
    }

    #[test]
    fn dtd_encoding_field_packing() {
        let timing = compute_timing(5120, 1440, 60, (1196, 339)).unwrap();
        let bytes = timing.encode();
        // Decode the split fields back out.
        let h_active = u16::from(bytes[2]) | (u16::from(bytes[4] & 0xF8) << 5);
        let h_blank = u16::from(bytes[3]) | (u16::from(bytes[4] & 0x07) << 8);
        let v_active = u16::from(bytes[5]) | (u16::from(bytes[7] & 0xF0) << 4);
        let v_blank = u16::from(bytes[6]) | (u16::from(bytes[7] & 0x0F) << 8);
        assert_eq!((h_active, h_blank, v_active, v_blank), (5120, 160, 1440, 45));
        let h_image = u16::from(bytes[12]) | (u16::from(bytes[14] & 0xF0) << 4);
        let v_image = u16::from(bytes[13]) | (u16::from(bytes[14] & 0x0F) << 8);
        assert_eq!((h_image, v_image), (1196, 339));
    }

    #[test]
    fn widths_past_4095_round_trip_through_byte_4() {
        // 5120 needs 13 bits of h_active; a 4/4 nibble split would silently
        // drop bit 12 and decode as 1024.
        let timing = compute_timing(5120, 1440, 60, (1196, 339)).unwrap();
        let bytes = timing.encode();
        assert_eq!(bytes[4], 0xA0);
        let h_active = u16::from(bytes[2]) | (u16::from(bytes[4] & 0xF8) << 5);
        assert_eq!(h_active, 5120);
    }

    #[test]
    fn refresh_from_encoded_clock_is_close_to_target() {
        let timing = compute_timing(1920, 1080, 144, (598, 336)).unwrap();
        let refresh = timing.refresh_millihz();
        assert!((143_900..=144_100).contains(&refresh), "refresh={refresh}");
    }
}
