//! Pure calculation functions for placing images in boxes.
//!
//! All functions here are pure and testable without any I/O or images.
//! Sizes are `(width, height)` pairs; source sizes are pixels, target sizes
//! are in whatever linear unit the caller uses (inches in this crate).

/// Largest size with the source aspect ratio that fits inside `max_w` x `max_h`.
///
/// One edge touches the bound, the other is at most its bound. Negative
/// bounds are treated as zero.
pub fn fit_within(source: (f64, f64), max_w: f64, max_h: f64) -> (f64, f64) {
    let (src_w, src_h) = source;
    let scale = (max_w.max(0.0) / src_w).min(max_h.max(0.0) / src_h);
    (src_w * scale, src_h * scale)
}
