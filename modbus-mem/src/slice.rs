//! Data movement helpers for contiguous runs.
//!
//! Neither function validates the requested run. Range checks are done by [`crate::Bank`]
//! before either of them is called; parts of a run outside of the sequence are simply skipped.

/// Copy the `count` elements starting at `start` into a new vector.
pub fn slice_run<T: Copy>(sequence: &[T], start: usize, count: usize) -> Vec<T> {
    sequence.iter().skip(start).take(count).copied().collect()
}

/// Overwrite `destination[start..start + source.len()]` with `source` in order.
///
/// The destination is never resized.
pub fn update_run<T: Copy>(source: &[T], destination: &mut [T], start: usize) {
    for (dst, src) in destination.iter_mut().skip(start).zip(source.iter()) {
        *dst = *src;
    }
}
