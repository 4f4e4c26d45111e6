//! Heuristic token estimation and budget-aware truncation.
//!
//! The estimate is deliberately approximate: roughly 4 characters per token
//! for most text and 1.5 characters per token for CJK ideographs. Actual
//! provider tokenizers are never invoked, which keeps this module free of
//! network and model dependencies.

/// Inclusive CJK unified ideograph range counted at the denser rate.
const CJK_RANGE: std::ops::RangeInclusive<char> = '\u{4e00}'..='\u{9fa5}';

/// Estimate the token count for a string.
///
/// CJK codepoints contribute `ceil(n / 1.5)` tokens, everything else
/// `ceil(n / 4)`. Empty text yields 0.
pub fn estimate_tokens(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }

    let total = text.chars().count() as u32;
    let cjk = text.chars().filter(|c| CJK_RANGE.contains(c)).count() as u32;
    let other = total - cjk;

    // ceil(cjk / 1.5) == ceil(2 * cjk / 3)
    (cjk * 2).div_ceil(3) + other.div_ceil(4)
}

/// Truncate text so its estimated token count fits the budget.
///
/// Text already within the budget is returned unchanged. Otherwise the
/// first `floor(chars * budget / estimate)` characters are kept and a
/// `"..."` marker is appended. The cut is proportional by length, not
/// token-accurate; slight over- or undershoot is accepted.
pub fn truncate_to_budget(text: &str, max_tokens: u32) -> String {
    if text.is_empty() {
        return String::new();
    }

    let current = estimate_tokens(text);
    if current <= max_tokens {
        return text.to_string();
    }

    let ratio = f64::from(max_tokens) / f64::from(current);
    let target_chars = (text.chars().count() as f64 * ratio).floor() as usize;

    let mut truncated: String = text.chars().take(target_chars).collect();
    truncated.push_str("...");
    truncated
}

/// Human-readable token count for display surfaces.
pub fn format_token_count(tokens: u32) -> String {
    if tokens < 1000 {
        format!("{tokens} tokens")
    } else {
        format!("{:.1}K tokens", f64::from(tokens) / 1000.0)
    }
}
