//! Config command - prints the effective settings.

use anyhow::{Context, Result};

use crate::config::Settings;

/// Render settings as TOML.
pub fn render(settings: &Settings) -> Result<String> {
    toml::to_string_pretty(settings).context("Failed to render settings")
}

/// Run the config command.
pub fn run(settings: &Settings) -> Result<()> {
    println!("Current Configuration:");
    println!("{}", "=".repeat(50));
    println!("{}", render(settings)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_default_settings() {
        let rendered = render(&Settings::default()).unwrap();

        assert!(rendered.contains("extension = \"go\""));
        assert!(rendered.contains("debounce_ms = 500"));
        assert!(rendered.contains("[logging]"));
    }
}
