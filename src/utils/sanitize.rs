//! Utilities for sanitizing probe error messages.
//!
//! Error text from resolvers, TLS stacks and HTTP clients is stored on uptime
//! rows and surfaced to operators, so control characters are removed and the
//! length is capped before persistence.

/// Sanitizes an error message by removing control characters.
///
/// Control characters (0x00-0x1F, except newline/tab/carriage return) can cause
/// issues when stored in databases or displayed in logs. This function removes
/// them while preserving readability.
///
/// # Arguments
///
/// * `message` - The error message to sanitize
///
/// # Returns
///
/// A sanitized version of the message with control characters removed.
pub fn sanitize_error_message(message: &str) -> String {
    message
        .chars()
        .filter(|c| {
            // Allow printable ASCII, newline, tab, carriage return
            // Remove other control characters (0x00-0x1F except \n, \t, \r)
            let code = *c as u32;
            code >= 0x20 // Printable ASCII starts at 0x20 (space)
                || code == 0x09 // Tab
                || code == 0x0A // Newline
                || code == 0x0D // Carriage return
                || code > 0x7F // Allow non-ASCII (UTF-8)
        })
        .collect()
}

/// Sanitizes and truncates an error message to a maximum length.
///
/// This function:
/// 1. Sanitizes the message by removing control characters
/// 2. Truncates to `MAX_ERROR_MESSAGE_LENGTH` if necessary
/// 3. Appends truncation indicator if the message was truncated
///
/// # Arguments
///
/// * `message` - The error message to sanitize and truncate
///
/// # Returns
///
/// A sanitized and truncated version of the message.
pub fn sanitize_and_truncate_error_message(message: &str) -> String {
    let sanitized = sanitize_error_message(message);

    if sanitized.len() > crate::config::MAX_ERROR_MESSAGE_LENGTH {
        // Leave room for the truncation note; back off to a char boundary so
        // multi-byte resolver messages never split mid-character
        let mut truncate_len = crate::config::MAX_ERROR_MESSAGE_LENGTH
            .saturating_sub(50)
            .min(sanitized.len());
        while !sanitized.is_char_boundary(truncate_len) {
            truncate_len -= 1;
        }
        format!(
            "{}... (truncated, original length: {} chars)",
            &sanitized[..truncate_len],
            sanitized.len()
        )
    } else {
        sanitized
    }
}
