/// Number of leading token characters kept visible in logs
const VISIBLE_TOKEN_CHARS: usize = 6;

/// Mask a bearer token for logging, keeping only a short prefix
pub fn mask_token(token: &str) -> String {
    if token.chars().count() <= VISIBLE_TOKEN_CHARS {
        "***".to_string()
    } else {
        let prefix: String = token.chars().take(VISIBLE_TOKEN_CHARS).collect();
        format!("{}***", prefix)
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
