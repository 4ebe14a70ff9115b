use std::time::Duration;

/// Human-readable elapsed time: `12.3s`, `2m 5.0s`, `1h 3m`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 60.0 {
        format!("{secs:.1}s")
    } else if secs < 3600.0 {
        let whole = elapsed.as_secs();
        let minutes = whole / 60;
        let rest = secs - (minutes * 60) as f64;
        format!("{minutes}m {rest:.1}s")
    } else {
        let whole = elapsed.as_secs();
        format!("{}h {}m", whole / 3600, (whole % 3600) / 60)
    }
}
