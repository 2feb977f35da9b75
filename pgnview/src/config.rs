//! Runtime tunables for pgnview.
//!
//! Every value has a compile-time default and can be overridden through an
//! environment variable. Command-line flags take precedence over both.

use std::path::PathBuf;

/// Default tracing filter when neither `RUST_LOG` nor `PGNVIEW_LOG` is set.
const DEFAULT_LOG_FILTER: &str = "warn";

/// File name prefix for the daily rolling log.
pub const LOG_FILE_PREFIX: &str = "pgnview";

/// Get the tracing filter directive.
///
/// Priority:
/// 1. `PGNVIEW_LOG` env variable if set
/// 2. `warn` as fallback
///
/// `RUST_LOG` still wins over both when the subscriber is built.
pub fn get_log_filter() -> String {
    std::env::var("PGNVIEW_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string())
}

/// Get the directory for the rolling log file.
///
/// `None` (the default) logs to stderr. Set `PGNVIEW_LOG_DIR` to write a
/// daily file such as `<dir>/pgnview.2026-01-31` instead.
pub fn get_log_dir() -> Option<PathBuf> {
    std::env::var_os("PGNVIEW_LOG_DIR")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
}

/// Whether boards are drawn with Unicode figurines instead of FEN letters.
///
/// Enabled when `PGNVIEW_UNICODE` is `1` or `true`.
pub fn get_unicode() -> bool {
    std::env::var("PGNVIEW_UNICODE")
        .map(|value| parse_flag(&value))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_log_filter() {
        let filter = get_log_filter();
        match std::env::var("PGNVIEW_LOG") {
            Ok(val) => assert_eq!(filter, val),
            Err(_) => assert_eq!(filter, DEFAULT_LOG_FILTER),
        }
    }

    #[test]
    fn test_get_log_dir() {
        let dir = get_log_dir();
        match std::env::var("PGNVIEW_LOG_DIR") {
            Ok(val) if !val.is_empty() => assert_eq!(dir, Some(PathBuf::from(val))),
            _ => assert_eq!(dir, None),
        }
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" TRUE "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }
}
