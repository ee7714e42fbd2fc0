use super::types::DerivedBitrate;

/// Bitrate used when no size target is given ("maximum compression")
pub const MAX_COMPRESSION_KBPS: u64 = 500;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Compute a constant bitrate that lands the output near `target_size_mb`.
///
/// `target_size_mb == 0` selects [`MAX_COMPRESSION_KBPS`] whatever the
/// duration. Otherwise the result is
/// `floor(target_size_mb * 1024 * 1024 * 8 / duration_s / 1000)`.
///
/// The caller must reject `duration_s <= 0` before calling; the planner does
/// not substitute a default for a missing duration.
///
/// No clamping is applied. A tiny target over a long clip can plan 0 kbps and
/// a large target over a very short clip can plan more than the source
/// carries; the encoder simply won't exceed what the content needs.
pub fn plan_bitrate(target_size_mb: u32, duration_s: f64) -> DerivedBitrate {
    if target_size_mb == 0 {
        return DerivedBitrate {
            kbps: MAX_COMPRESSION_KBPS,
        };
    }

    debug_assert!(
        duration_s > 0.0,
        "plan_bitrate called with non-positive duration {}",
        duration_s
    );

    let target_bits = target_size_mb as u64 * BYTES_PER_MB * 8;
    let kbps = (target_bits as f64 / duration_s / 1000.0).floor();

    DerivedBitrate { kbps: kbps as u64 }
}
