//! Simulated progress for a generation request whose real duration is unknown.

/// Bursts per estimated duration
const SEGMENTS: u32 = 8;
/// Share of each segment spent advancing; the rest is a pause
const BURST_SHARE: f64 = 0.7;
/// Envelope steepness: at the estimated duration progress is ~95% of the ceiling
const STEEPNESS: f64 = 3.0;
const MAX_CEILING: f32 = 99.0;

fn ease_out_quad(t: f64) -> f64 {
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Percent complete after `elapsed_ms` of a request estimated at `duration_ms`.
///
/// Advances in bursts separated by pauses ("stutter"), fast at first and
/// slowing as it approaches `ceiling`, which it never reaches. Monotonic in
/// `elapsed_ms`. `ceiling` is clamped to `0..=99`; a zero duration sits at
/// the ceiling.
pub fn stutter_progress(elapsed_ms: u64, duration_ms: u64, ceiling: f32) -> f32 {
    let ceiling = if ceiling.is_nan() {
        0.0
    } else {
        ceiling.clamp(0.0, MAX_CEILING)
    };
    if duration_ms == 0 {
        return ceiling;
    }
    let t = elapsed_ms as f64 / duration_ms as f64;
    let segment_len = 1.0 / f64::from(SEGMENTS);
    let k = (t / segment_len).floor();
    let within = ((t - k * segment_len) / segment_len).max(0.0);
    let local = if within < BURST_SHARE {
        ease_out_quad(within / BURST_SHARE)
    } else {
        1.0
    };
    let stepped = (k + local) * segment_len;
    let pct = f64::from(ceiling) * (1.0 - (-STEEPNESS * stepped).exp());
    (pct as f32).min(ceiling)
}
