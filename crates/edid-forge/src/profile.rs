//! The static description of the physical panel.
//!
//! An [`EdidProfile`] is constructed once and never mutated; everything that
//! varies per refresh rate lives in [`crate::timing::DetailedTiming`].

use bitflags::bitflags;

use crate::error::{EdidError, Result};

/// Packed EDID vendor ID: three ASCII uppercase letters, 5 bits each ('A' = 1),
/// stored big-endian in bytes 8..10 of the base block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManufacturerId(u16);

impl ManufacturerId {
    pub fn new(letters: &str) -> Result<Self> {
        let bytes = letters.as_bytes();
        if bytes.len() != 3 {
            return Err(EdidError::Profile("manufacturer id must be exactly 3 letters"));
        }
        let mut packed = 0u16;
        for &b in bytes {
            if !b.is_ascii_uppercase() {
                return Err(EdidError::Profile("manufacturer id must be ASCII uppercase A-Z"));
            }
            packed = (packed << 5) | u16::from(b - b'A' + 1);
        }
        Ok(Self(packed))
    }

    pub fn to_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    pub fn letters(self) -> [char; 3] {
        let decode = |v: u16| (((v & 0x1F) as u8) + b'A' - 1) as char;
        [decode(self.0 >> 10), decode(self.0 >> 5), decode(self.0)]
    }
}

/// CIE 1931 chromaticity coordinates as 10-bit fixed point (coordinate × 1024).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chromaticity {
    pub red: (u16, u16),
    pub green: (u16, u16),
    pub blue: (u16, u16),
    pub white: (u16, u16),
}

impl Chromaticity {
    /// sRGB primaries with a D65 white point.
    pub const SRGB: Self = Self {
        red: (655, 338),
        green: (307, 614),
        blue: (154, 61),
        white: (320, 337),
    };

    /// EDID packing into bytes 25..35: two bytes of low-order bit pairs
    /// followed by the eight high-order bytes.
    pub(crate) fn pack(&self) -> [u8; 10] {
        let lo = |v: u16| (v & 0x3) as u8;
        let hi = |v: u16| (v >> 2) as u8;
        [
            lo(self.red.0) << 6 | lo(self.red.1) << 4 | lo(self.green.0) << 2 | lo(self.green.1),
            lo(self.blue.0) << 6 | lo(self.blue.1) << 4 | lo(self.white.0) << 2 | lo(self.white.1),
            hi(self.red.0),
            hi(self.red.1),
            hi(self.green.0),
            hi(self.green.1),
            hi(self.blue.0),
            hi(self.blue.1),
            hi(self.white.0),
            hi(self.white.1),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    Ratio16x10,
    Ratio4x3,
    Ratio5x4,
    Ratio16x9,
}

/// One 2-byte standard timing slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardTiming {
    pub h_active: u16,
    pub aspect: AspectRatio,
    pub refresh_hz: u16,
}

impl StandardTiming {
    /// Marker for an unused standard timing slot.
    pub const UNUSED: [u8; 2] = [0x01, 0x01];

    /// Encode into the 2-byte slot format. `None` when the mode cannot be
    /// represented: `h_active` must be `(n + 31) * 8` for a byte-sized `n`,
    /// refresh must lie in 60..=123 Hz.
    pub fn encode(self) -> Option<[u8; 2]> {
        if self.h_active < 256 || self.h_active > 2288 || self.h_active % 8 != 0 {
            return None;
        }
        if !(60..=123).contains(&self.refresh_hz) {
            return None;
        }
        let byte0 = (self.h_active / 8 - 31) as u8;
        let aspect = match self.aspect {
            AspectRatio::Ratio16x10 => 0u8,
            AspectRatio::Ratio4x3 => 1,
            AspectRatio::Ratio5x4 => 2,
            AspectRatio::Ratio16x9 => 3,
        };
        Some([byte0, aspect << 6 | (self.refresh_hz - 60) as u8])
    }

    /// Standard timing for an explicit mode, if its aspect ratio and geometry
    /// are representable in the slot format.
    pub fn for_mode(h_active: u16, v_active: u16, refresh_hz: u16) -> Option<Self> {
        let (h, v) = (u32::from(h_active), u32::from(v_active));
        let aspect = if h * 10 == v * 16 {
            AspectRatio::Ratio16x10
        } else if h * 3 == v * 4 {
            AspectRatio::Ratio4x3
        } else if h * 4 == v * 5 {
            AspectRatio::Ratio5x4
        } else if h * 9 == v * 16 {
            AspectRatio::Ratio16x9
        } else {
            return None;
        };
        let timing = Self {
            h_active,
            aspect,
            refresh_hz,
        };
        timing.encode().map(|_| timing)
    }
}

bitflags! {
    /// Byte 24 of the base block: feature support bitmap.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FeatureFlags: u8 {
        const STANDBY = 1 << 7;
        const SUSPEND = 1 << 6;
        const ACTIVE_OFF = 1 << 5;
        /// Display color type bits 4..3 (digital): RGB 4:4:4 + YCrCb 4:4:4.
        const COLOR_RGB444_YCRCB444 = 1 << 3;
        const COLOR_RGB444_YCRCB422 = 1 << 4;
        const SRGB_DEFAULT = 1 << 2;
        const PREFERRED_TIMING_NATIVE = 1 << 1;
        const CONTINUOUS_FREQUENCY = 1 << 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoInput {
    /// Digital input; interface and color-depth bits left unspecified.
    Digital,
    /// Analog input with default signal levels.
    Analog,
}

impl VideoInput {
    pub(crate) fn encode(self) -> u8 {
        match self {
            Self::Digital => 0x80,
            Self::Analog => 0x00,
        }
    }
}

/// Whether the builder appends an extension block after the base block.
///
/// The only supported extension is a header-only CTA-861 block (no native
/// detailed timings, no data block collection). It exists so consumers that
/// insist on an extension block still see a valid, checksummed one; it never
/// carries timing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtensionPolicy {
    #[default]
    None,
    CtaHeaderOnly,
}

/// The fixed, reusable description of a physical panel.
#[derive(Debug, Clone)]
pub struct EdidProfile {
    pub manufacturer: ManufacturerId,
    pub product_code: u16,
    pub serial_number: u32,
    /// 1..=54, or 0 for unspecified.
    pub manufacture_week: u8,
    /// Full year; encoded as an offset from 1990.
    pub manufacture_year: u16,
    pub video_input: VideoInput,
    /// Horizontal/vertical screen size in centimeters.
    pub screen_size_cm: (u8, u8),
    /// Display gamma × 100 (220 for gamma 2.2); encoded as gamma × 100 − 100.
    pub gamma_x100: u16,
    pub features: FeatureFlags,
    pub chromaticity: Chromaticity,
    /// Legacy established timings bitmap; all zero for a custom panel.
    pub established_timings: [u8; 3],
    /// Up to 8 slots; remaining slots are emitted as unused.
    pub standard_timings: Vec<StandardTiming>,
    /// Preferred active resolution. The per-rate detailed timing is derived
    /// from this, never stored in the profile.
    pub h_active: u16,
    pub v_active: u16,
    /// Physical image size in millimeters, carried in the detailed timing.
    pub image_size_mm: (u16, u16),
    /// Monitor name descriptor text; truncated to 13 bytes on emit.
    pub display_name: String,
    pub extension: ExtensionPolicy,
}

impl EdidProfile {
    /// Fixed profile for the MSI MPG 491CQPX QD-OLED 49" ultrawide
    /// (5120×1440, 1196×339 mm panel).
    pub fn ultrawide_49() -> Self {
        Self {
            manufacturer: ManufacturerId::new("MSI").expect("static vendor id"),
            product_code: 0x0491,
            serial_number: 1,
            manufacture_week: 1,
            manufacture_year: 2022,
            video_input: VideoInput::Digital,
            screen_size_cm: (115, 46),
            gamma_x100: 220,
            features: FeatureFlags::ACTIVE_OFF
                | FeatureFlags::COLOR_RGB444_YCRCB444
                | FeatureFlags::PREFERRED_TIMING_NATIVE,
            chromaticity: Chromaticity::SRGB,
            established_timings: [0, 0, 0],
            standard_timings: Self::standard_timing_ladder(5120, 1440, 60),
            h_active: 5120,
            v_active: 1440,
            image_size_mm: (1196, 339),
            display_name: "MPG491CQPX".to_string(),
            extension: ExtensionPolicy::None,
        }
    }

    /// Standard-timing slots for a preferred mode: the mode itself when the
    /// slot format can express it, then the legacy 1024×768/800×600/640×480
    /// fallbacks so older parsers always find something familiar.
    pub fn standard_timing_ladder(h_active: u16, v_active: u16, refresh_hz: u16) -> Vec<StandardTiming> {
        let legacy = [(1024, 768), (800, 600), (640, 480)];
        let mut slots = Vec::with_capacity(4);
        if let Some(preferred) = StandardTiming::for_mode(h_active, v_active, refresh_hz) {
            slots.push(preferred);
        }
        for (h, v) in legacy {
            if (h, v) == (h_active, v_active) {
                continue;
            }
            if let Some(timing) = StandardTiming::for_mode(h, v, 60) {
                slots.push(timing);
            }
        }
        slots
    }

    /// Reject malformed static profiles before any timing work begins.
    pub fn validate(&self) -> Result<()> {
        if self.h_active == 0 || self.v_active == 0 {
            return Err(EdidError::Profile("active resolution must be non-zero"));
        }
        if !(1990..=2245).contains(&self.manufacture_year) {
            return Err(EdidError::Profile("manufacture year must be in 1990..=2245"));
        }
        if self.manufacture_week > 54 {
            return Err(EdidError::Profile("manufacture week must be in 0..=54"));
        }
        if !(100..=355).contains(&self.gamma_x100) {
            return Err(EdidError::Profile("display gamma must be in 1.00..=3.55"));
        }
        if self.display_name.is_empty() || !self.display_name.is_ascii() {
            return Err(EdidError::Profile("display name must be non-empty ASCII"));
        }
        if self.standard_timings.len() > 8 {
            return Err(EdidError::Profile("at most 8 standard timings"));
        }
        if self.standard_timings.iter().any(|t| t.encode().is_none()) {
            return Err(EdidError::Profile("standard timing not representable in slot format"));
        }
        Ok(())
    }
}
