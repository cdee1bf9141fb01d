/// Limits `text` to `max_len` characters. Longer strings keep their first `max_len - 1`
/// characters followed by an ellipsis, so the result is exactly `max_len` characters long.
#[must_use]
pub fn fit_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_owned();
    }

    let mut fitted: String = text.chars().take(max_len.saturating_sub(1)).collect();
    if max_len > 0 {
        fitted.push('…');
    }

    fitted
}

/// Truncates or zero-pads `bytes` to exactly `len` bytes.
#[must_use]
pub fn fit_bytes(bytes: &[u8], len: usize) -> Vec<u8> {
    let mut fitted = bytes[..bytes.len().min(len)].to_vec();
    fitted.resize(len, 0);

    fitted
}
