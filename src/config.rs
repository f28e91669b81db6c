//! Environment configuration.

use std::env;
use std::time::Duration;

const DEFAULT_POLL_MS: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorDepth {
    #[default]
    Ansi16,
    Ansi256,
    TrueColor,
}

impl ColorDepth {
    pub fn from_env() -> Self {
        Self::detect(
            env::var("COLORTERM").ok().as_deref(),
            env::var("TERM").ok().as_deref(),
        )
    }

    pub fn detect(colorterm: Option<&str>, term: Option<&str>) -> Self {
        let colorterm = colorterm.unwrap_or_default();
        if colorterm.contains("truecolor") || colorterm.contains("24bit") {
            ColorDepth::TrueColor
        } else if term.unwrap_or_default().contains("256color") {
            ColorDepth::Ansi256
        } else {
            ColorDepth::Ansi16
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Tracing output file. Logs never go to the terminal being drawn on.
    pub log_file: Option<String>,
    pub log_filter: Option<String>,
    /// Clear and redraw on every frame shrink, not only large ones.
    pub clear_on_shrink: bool,
    pub poll_interval: Duration,
    pub color_depth: ColorDepth,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            log_filter: None,
            clear_on_shrink: false,
            poll_interval: Duration::from_millis(DEFAULT_POLL_MS),
            color_depth: ColorDepth::Ansi16,
        }
    }
}

impl EnvConfig {
    pub fn from_env() -> Self {
        let poll_ms = env_string_opt("ASK_TUI_POLL_MS")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_POLL_MS);
        Self {
            log_file: env_string_opt("ASK_TUI_LOG"),
            log_filter: env_string_opt("ASK_TUI_LOG_FILTER"),
            clear_on_shrink: env_flag("ASK_TUI_CLEAR_ON_SHRINK"),
            poll_interval: Duration::from_millis(poll_ms),
            color_depth: ColorDepth::from_env(),
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let value = value.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{ColorDepth, EnvConfig};
    use std::env;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn defaults_when_unset() {
        let _lock = env_lock();
        let _log = set_env_guard("ASK_TUI_LOG", None);
        let _shrink = set_env_guard("ASK_TUI_CLEAR_ON_SHRINK", None);
        let _poll = set_env_guard("ASK_TUI_POLL_MS", None);

        let config = EnvConfig::from_env();
        assert_eq!(config.log_file, None);
        assert!(!config.clear_on_shrink);
        assert_eq!(config.poll_interval, Duration::from_millis(50));
    }

    #[test]
    fn flags_require_exact_one() {
        let _lock = env_lock();
        let _shrink = set_env_guard("ASK_TUI_CLEAR_ON_SHRINK", Some("true"));
        assert!(!EnvConfig::from_env().clear_on_shrink);

        let _shrink = set_env_guard("ASK_TUI_CLEAR_ON_SHRINK", Some("1"));
        assert!(EnvConfig::from_env().clear_on_shrink);
    }

    #[test]
    fn blank_strings_are_unset_and_bad_numbers_fall_back() {
        let _lock = env_lock();
        let _log = set_env_guard("ASK_TUI_LOG", Some("   "));
        let _poll = set_env_guard("ASK_TUI_POLL_MS", Some("soon"));

        let config = EnvConfig::from_env();
        assert_eq!(config.log_file, None);
        assert_eq!(config.poll_interval, Duration::from_millis(50));
    }

    #[test]
    fn string_values_are_trimmed() {
        let _lock = env_lock();
        let _log = set_env_guard("ASK_TUI_LOG", Some(" /tmp/ask.log \n"));
        assert_eq!(EnvConfig::from_env().log_file.as_deref(), Some("/tmp/ask.log"));
    }

    #[test]
    fn poll_interval_is_read() {
        let _lock = env_lock();
        let _poll = set_env_guard("ASK_TUI_POLL_MS", Some("10"));
        assert_eq!(EnvConfig::from_env().poll_interval, Duration::from_millis(10));
    }

    #[test]
    fn color_depth_detection() {
        assert_eq!(
            ColorDepth::detect(Some("truecolor"), Some("xterm")),
            ColorDepth::TrueColor
        );
        assert_eq!(ColorDepth::detect(Some("24bit"), None), ColorDepth::TrueColor);
        assert_eq!(
            ColorDepth::detect(None, Some("xterm-256color")),
            ColorDepth::Ansi256
        );
        assert_eq!(ColorDepth::detect(None, Some("vt100")), ColorDepth::Ansi16);
    }
}
