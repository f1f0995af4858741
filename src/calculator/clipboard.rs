//! Copying the calculator display to the system clipboard.

use anyhow::{Context, Result};
use arboard::Clipboard;
use tracing::debug;

/// Copy the buffer text to the system clipboard.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    if text.is_empty() {
        anyhow::bail!("Nothing to copy");
    }

    let mut clipboard = Clipboard::new().context("Failed to access clipboard")?;
    clipboard
        .set_text(text.to_string())
        .context("Failed to copy to clipboard")?;

    debug!(%text, "copied to clipboard");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_is_not_copied() {
        let err = copy_to_clipboard("").unwrap_err();
        assert_eq!(err.to_string(), "Nothing to copy");
    }
}
