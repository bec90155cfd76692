use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use edid_forge::{generate_variants, EdidProfile, ExtensionPolicy, ManufacturerId};

#[derive(Parser, Debug)]
#[command(
    name = "edid-gen",
    about = "Generate firmware-override EDID blocks for a fixed-geometry panel at one or more refresh rates."
)]
struct Args {
    /// Output directory for .bin artifacts and .txt dumps
    #[arg(long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Requested refresh rates in Hz
    #[arg(long, value_delimiter = ',', default_value = "60,120,144,240")]
    rates: Vec<u32>,

    /// Horizontal active pixels
    #[arg(long, default_value_t = 5120)]
    width: u16,

    /// Vertical active pixels
    #[arg(long, default_value_t = 1440)]
    height: u16,

    /// Display name carried in the monitor-name descriptor (truncated to 13 bytes)
    #[arg(long, default_value = "MPG491CQPX")]
    name: String,

    /// Three-letter EDID vendor ID
    #[arg(long, default_value = "MSI")]
    manufacturer: String,

    /// Append a header-only CTA-861 extension block
    #[arg(long, action = clap::ArgAction::SetTrue)]
    cta_extension: bool,

    /// Overwrite existing artifacts
    #[arg(long, action = clap::ArgAction::SetTrue)]
    force: bool,

    /// Suppress per-variant output
    #[arg(long, action = clap::ArgAction::SetTrue)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    run(args)
}

fn run(args: Args) -> anyhow::Result<()> {
    if args.rates.is_empty() {
        bail!("at least one refresh rate is required");
    }

    let mut profile = EdidProfile::ultrawide_49();
    profile.manufacturer = ManufacturerId::new(&args.manufacturer)
        .with_context(|| format!("manufacturer id {:?}", args.manufacturer))?;
    profile.h_active = args.width;
    profile.v_active = args.height;
    profile.display_name = args.name.clone();
    profile.standard_timings = EdidProfile::standard_timing_ladder(args.width, args.height, 60);
    profile.extension = if args.cta_extension {
        ExtensionPolicy::CtaHeaderOnly
    } else {
        ExtensionPolicy::None
    };

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create {}", args.out_dir.display()))?;

    let variants = generate_variants(&profile, &args.rates).context("generate variants")?;

    let slug = artifact_slug(&args.name);
    let mut default_60hz: Option<Vec<u8>> = None;
    let mut wrote_any = false;
    let mut builder_defect = false;

    for variant in &variants {
        match &variant.outcome {
            Ok(artifact) => {
                let bin_path = args.out_dir.join(format!("{slug}_{}hz.bin", variant.rate_hz));
                let txt_path = args.out_dir.join(format!("{slug}_{}hz.txt", variant.rate_hz));
                ensure_writable(&bin_path, args.force)?;
                ensure_writable(&txt_path, args.force)?;
                write_atomic(&bin_path, &artifact.bytes)
                    .with_context(|| format!("write {}", bin_path.display()))?;
                write_atomic(&txt_path, artifact.dump.as_bytes())
                    .with_context(|| format!("write {}", txt_path.display()))?;
                if !args.quiet {
                    eprintln!(
                        "{:>4} Hz: ok ({} bytes, pixel clock {} x 10 kHz) -> {}",
                        variant.rate_hz,
                        artifact.bytes.len(),
                        artifact.timing.pixel_clock_10khz,
                        bin_path.display()
                    );
                }
                if variant.rate_hz == 60 {
                    default_60hz = Some(artifact.bytes.clone());
                }
                wrote_any = true;
            }
            Err(err) if variant.is_builder_defect() => {
                // Post-build validation failures point at the builder itself;
                // never downgrade them to a skipped variant.
                eprintln!("{:>4} Hz: builder defect: {err}", variant.rate_hz);
                builder_defect = true;
            }
            Err(err) => {
                if !args.quiet {
                    eprintln!("{:>4} Hz: skipped: {err}", variant.rate_hz);
                }
            }
        }
    }

    // Convenience alias pointing at the 60 Hz artifact.
    if let Some(bytes) = default_60hz {
        let alias_path = args.out_dir.join(format!("{slug}.bin"));
        ensure_writable(&alias_path, args.force)?;
        write_atomic(&alias_path, &bytes)
            .with_context(|| format!("write {}", alias_path.display()))?;
        if !args.quiet {
            eprintln!("default: {} (60 Hz)", alias_path.display());
        }
    }

    if builder_defect {
        bail!("one or more artifacts failed post-build validation");
    }
    if !wrote_any {
        bail!("no artifact could be generated for the requested rates");
    }
    Ok(())
}

fn ensure_writable(path: &Path, force: bool) -> anyhow::Result<()> {
    if !force && path.exists() {
        bail!("refusing to overwrite {} (use --force)", path.display());
    }
    Ok(())
}

fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or("edid");
    let tmp_path = parent.join(format!(".{file_name}.edid_gen.tmp"));

    fs::write(&tmp_path, data)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;

    // `rename` doesn't replace on Windows.
    #[cfg(windows)]
    {
        let _ = fs::remove_file(path);
    }

    fs::rename(&tmp_path, path).with_context(|| {
        format!(
            "rename temp file {} to {}",
            tmp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}

fn artifact_slug(name: &str) -> String {
    let trimmed = name.trim();
    let mut out = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        if ch.is_ascii_alphanumeric() || ch == '.' || ch == '_' || ch == '-' {
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push('_');
        }
    }
    if out.is_empty() || out == "." || out == ".." {
        "edid".to_string()
    } else {
        out
    }
}
