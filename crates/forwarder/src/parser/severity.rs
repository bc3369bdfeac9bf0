use serde::{Deserialize, Serialize};

/// Severity attached to every output fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    /// Parse a level token emitted by an application (case-insensitive).
    ///
    /// `warning` is an alias of `warn`. Returns `None` for anything that is
    /// not a recognised severity word.
    pub fn from_token(token: &str) -> Option<Level> {
        match token.trim().to_ascii_lowercase().as_str() {
            "trace" | "debug" => Some(Level::Debug),
            "info" | "notice" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" | "err" | "fatal" | "critical" | "crit" => Some(Level::Error),
            _ => None,
        }
    }

    /// Like [`Level::from_token`] but unknown tokens fall back to `Info`.
    pub fn resolve(token: &str) -> Level {
        Level::from_token(token).unwrap_or(Level::Info)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }

    /// Numeric level used by bunyan-style JSON sinks.
    pub fn bunyan_code(&self) -> u8 {
        match self {
            Level::Debug => 20,
            Level::Info => 30,
            Level::Warn => 40,
            Level::Error => 50,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
