/// Map signed inclusive `(start, stop)` indices, where negative values count
/// from the end, onto a half-open `(safe_start, safe_end)` pair that can be
/// used to slice a sequence of length `len` directly.
pub fn normalize_range(start: i64, stop: i64, len: usize) -> (usize, usize) {
    let len = len as i64;

    let mut start = if start < 0 { len + start } else { start };
    let mut stop = if stop < 0 { len + stop } else { stop };

    // Past-the-front indices clamp to the head.
    if start < 0 {
        start = 0;
    }
    if stop < 0 {
        stop = 0;
    }

    if stop >= len {
        stop = len - 1;
    }

    // Out-of-bounds start or an inverted window selects nothing.
    if start >= len || start > stop {
        return (0, 0);
    }

    (start as usize, (stop + 1) as usize)
}
