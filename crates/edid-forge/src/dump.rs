//! Human-readable artifact dump: decoded fields plus hex rows.
//!
//! Documentation output only; nothing re-parses it.

use std::fmt::Write as _;

use crate::block::EDID_BLOCK_SIZE;
use crate::profile::EdidProfile;
use crate::timing::DetailedTiming;

pub fn render(profile: &EdidProfile, timing: &DetailedTiming, artifact: &[u8]) -> String {
    let mut out = String::new();
    let [a, b, c] = profile.manufacturer.letters();
    let refresh_millihz = timing.refresh_millihz();
    let clock_hz = timing.pixel_clock_hz();

    let _ = writeln!(
        out,
        "vendor: {a}{b}{c}  product: {:#06x}  serial: {}",
        profile.product_code, profile.serial_number
    );
    let _ = writeln!(out, "name: {}", profile.display_name);
    let _ = writeln!(
        out,
        "mode: {}x{} @ {}.{:03} Hz",
        timing.h_active,
        timing.v_active,
        refresh_millihz / 1000,
        refresh_millihz % 1000
    );
    let _ = writeln!(
        out,
        "pixel clock: {}.{:02} MHz  h_total: {}  v_total: {}",
        clock_hz / 1_000_000,
        clock_hz % 1_000_000 / 10_000,
        timing.h_total(),
        timing.v_total()
    );
    let _ = writeln!(
        out,
        "blocks: {} ({} bytes)",
        artifact.len() / EDID_BLOCK_SIZE,
        artifact.len()
    );
    out.push('\n');

    for (row, chunk) in artifact.chunks(16).enumerate() {
        let _ = write!(out, "{:04x}:", row * 16);
        for byte in chunk {
            let _ = write!(out, " {byte:02x}");
        }
        out.push('\n');
    }
    out
}
