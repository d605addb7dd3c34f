use crate::models::TimingWindow;

/// Merge overlapping or touching windows into a minimal sorted set.
///
/// Windows are sorted by (start, end), then folded left to right: a window
/// whose start does not exceed the accumulated end extends it.
pub fn merge_windows(windows: &[TimingWindow]) -> Vec<TimingWindow> {
    if windows.is_empty() {
        return Vec::new();
    }

    let mut sorted = windows.to_vec();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.end.total_cmp(&b.end)));

    let mut merged: Vec<TimingWindow> = Vec::with_capacity(sorted.len());
    for current in sorted {
        match merged.last_mut() {
            Some(previous) if current.start <= previous.end => {
                previous.end = previous.end.max(current.end);
            }
            _ => merged.push(current),
        }
    }
    merged
}

/// Complement of `merged` within `[0, total_duration)`.
///
/// Expects already-merged, sorted windows. The result and the input are
/// disjoint and together exactly cover the duration.
pub fn invert_windows(merged: &[TimingWindow], total_duration: f64) -> Vec<TimingWindow> {
    let mut inverted = Vec::new();
    let mut prev_end = 0.0_f64;

    for window in merged {
        if window.start > prev_end {
            inverted.push(TimingWindow::new(prev_end, window.start));
        }
        prev_end = window.end;
    }
    if prev_end < total_duration {
        inverted.push(TimingWindow::new(prev_end, total_duration));
    }
    inverted
}
