//! Split message text into length-bounded segments.

/// Split `text` into the fewest segments whose code point counts stay
/// within `limit`. Boundaries are always `char` boundaries, so a
/// multi-byte code point is never torn apart, and concatenating the
/// returned slices in order reproduces `text` exactly.
pub(crate) fn segment(text: &str, limit: usize) -> Vec<&str> {
    assert!(limit > 0, "segment limit must be positive");

    let mut segments = Vec::new();
    let mut rest = text;
    loop {
        let mut end = rest.len();
        for (count, (offset, _)) in rest.char_indices().enumerate() {
            if count == limit {
                end = offset;
                break;
            }
        }
        segments.push(&rest[..end]);
        rest = &rest[end..];
        if rest.is_empty() {
            break;
        }
    }
    segments
}
