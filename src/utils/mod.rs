//! Utilities: logging setup (tracing, level from -v/-q with RUST_LOG override)
//! and small text helpers.
//!
//! Key items:
//!   init_logging / derive_level
//!   preview

/// Logging helpers.
pub mod logging {
    use tracing::Level;
    use tracing_subscriber::EnvFilter;

    /// Map CLI verbosity flags to a level. `-q` wins over `-v`.
    pub fn derive_level(verbose: u8, quiet: bool) -> Level {
        if quiet {
            return Level::ERROR;
        }
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    /// Install the global subscriber. Output goes to stderr because stdout
    /// carries the MCP stdio transport.
    ///
    /// `RUST_LOG`, when set, replaces the level derived from the flags.
    pub fn init_logging(level: Level) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
        // A second init (tests) is a no-op.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

pub use logging::{derive_level, init_logging};

/// First `max_chars` characters of `text`, cut on a char boundary.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn quiet_overrides_verbose() {
        assert_eq!(derive_level(3, true), Level::ERROR);
        assert_eq!(derive_level(0, false), Level::INFO);
        assert_eq!(derive_level(1, false), Level::DEBUG);
        assert_eq!(derive_level(5, false), Level::TRACE);
    }

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("hello", 10), "hello");
        assert_eq!(preview("hello", 3), "hel");
        assert_eq!(preview("ééé", 2), "éé");
        assert_eq!(preview("", 0), "");
    }
}
