//! Formatting used by the renderer. Display-only: none of this affects
//! what the store retains.

/// Default count above which the feed shows "N+" instead of the exact count
pub const DEFAULT_DISPLAY_THRESHOLD: usize = 100;

/// Label for the number of received records, e.g. "42" or "100+"
pub fn count_label(len: usize, threshold: usize) -> String {
    if len > threshold {
        format!("{}+", threshold)
    } else {
        len.to_string()
    }
}

/// Shorten a mint address to its first 8 and last 4 characters
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 12 {
        return address.to_string();
    }

    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
