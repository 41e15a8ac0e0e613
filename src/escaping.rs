//! Shell escaping for remote commands
//!
//! Deployment shells out through single-quoted `echo '<content>' > <path>`
//! commands, so any literal single quote in rendered content must be
//! re-encoded before it is embedded in a command line.

/// Escape a string for embedding inside a single-quoted shell argument.
///
/// Each literal `'` becomes the four-character sequence `'\''`
/// (close-quote, escaped quote, reopen-quote).
pub fn escape_single_quotes(text: &str) -> String {
    text.replace('\'', "'\\''")
}

/// Quote a complete shell argument.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", escape_single_quotes(s))
}
