use exif::Rational;

/// Convert an EXIF degrees/minutes/seconds triple to signed decimal degrees.
///
/// Returns `None` unless there are exactly three components with non-zero
/// denominators. `S` and `W` references negate the result; any other (or
/// missing) reference leaves it positive. Rounded to 6 decimal places.
pub fn dms_to_decimal(dms: &[Rational], hemisphere: Option<&str>) -> Option<f64> {
    let [degrees, minutes, seconds] = dms else {
        return None;
    };
    if dms.iter().any(|component| component.denom == 0) {
        return None;
    }

    let magnitude = degrees.to_f64() + minutes.to_f64() / 60.0 + seconds.to_f64() / 3600.0;
    let negative = hemisphere
        .map(|h| h.trim().to_ascii_uppercase())
        .is_some_and(|h| h == "S" || h == "W");

    Some(round_to_micro_degrees(if negative { -magnitude } else { magnitude }))
}

fn round_to_micro_degrees(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}
