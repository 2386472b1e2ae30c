//! Thread usage estimates: stitch counts to skein quantities.

/// One skein of floss, in inches (8.7 yards).
pub const SKEIN_LENGTH_INCHES: f64 = 8.7 * 36.0;

/// Thread consumed by one stitch at the 14 stitches-per-inch reference
/// density.
pub const STITCH_LENGTH_INCHES_AT_14: f64 = 1.6;

/// Raw skein quantity for a stitch count at the given density and strand
/// count.
pub fn estimate_skeins_value(stitch_count: u32, stitches_per_inch: u32, strands: u32) -> f64 {
    if stitch_count == 0 {
        return 0.0;
    }
    let inches_per_stitch = (STITCH_LENGTH_INCHES_AT_14 * 14.0) / stitches_per_inch as f64;
    (stitch_count as f64 * inches_per_stitch * (strands as f64 / 2.0)) / SKEIN_LENGTH_INCHES
}

/// Skein estimate formatted for the legend, two decimal places.
pub fn estimate_skeins(stitch_count: u32, stitches_per_inch: u32, strands: u32) -> String {
    if stitch_count == 0 {
        return "0.00".to_string();
    }
    format!(
        "{:.2}",
        estimate_skeins_value(stitch_count, stitches_per_inch, strands)
    )
}

/// Ceiling to a multiple of `unit` for shopping quantities. Units below or at
/// zero leave the value untouched.
pub fn round_up_to_unit(value: f64, unit: f64) -> f64 {
    if unit <= 0.0 || !value.is_finite() {
        return value;
    }
    (value / unit).ceil() * unit
}

/// Shopping-list label for a rounded skein quantity: whole units print as an
/// integer, fractional units keep two decimals.
pub fn shopping_label(rounded: f64, unit: f64) -> String {
    if unit == 1.0 {
        format!("{}", rounded.round() as u64)
    } else {
        format!("{rounded:.2}")
    }
}
