/// Maximum number of characters of a remote response body kept in logs and errors.
pub const MAX_LOGGED_BODY_CHARS: usize = 512;

/// Truncates a response body for logging, on a character boundary.
///
/// Bodies longer than [`MAX_LOGGED_BODY_CHARS`] are cut and suffixed with `…`.
pub fn truncate_for_log(body: &str) -> String {
    match body.char_indices().nth(MAX_LOGGED_BODY_CHARS) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}
