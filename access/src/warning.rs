//! Warning delivery for recoverable problems.
//!
//! Decode failures, ambiguous paths and restriction violations do not stop
//! an accessor. They are reported as a [`Warning`] according to the
//! accessor's [`WarningLevel`]: to a registered [`WarningListener`] if there
//! is one, else to `tracing` at the configured severity.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Log severity used for warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// Whether warnings are reported, and at which severity.
///
/// The text form is `off`, `debug`, `info`, `warn` or `error`.
///
/// # Examples
///
/// ```
/// use metatree_access::{Severity, WarningLevel};
///
/// assert_eq!("warn".parse::<WarningLevel>().unwrap(), WarningLevel::On(Severity::Warn));
/// assert_eq!(WarningLevel::Off.to_string(), "off");
/// assert!("loud".parse::<WarningLevel>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WarningLevel {
    /// Suppresses logging and listener delivery.
    Off,
    On(Severity),
}

impl Default for WarningLevel {
    fn default() -> Self {
        WarningLevel::On(Severity::Warn)
    }
}

impl FromStr for WarningLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(WarningLevel::Off),
            "debug" => Ok(WarningLevel::On(Severity::Debug)),
            "info" => Ok(WarningLevel::On(Severity::Info)),
            "warn" | "warning" => Ok(WarningLevel::On(Severity::Warn)),
            "error" => Ok(WarningLevel::On(Severity::Error)),
            other => Err(format!("unknown warning level '{other}'")),
        }
    }
}

impl TryFrom<String> for WarningLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WarningLevel> for String {
    fn from(value: WarningLevel) -> Self {
        value.to_string()
    }
}

impl fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WarningLevel::Off => "off",
            WarningLevel::On(Severity::Debug) => "debug",
            WarningLevel::On(Severity::Info) => "info",
            WarningLevel::On(Severity::Warn) => "warn",
            WarningLevel::On(Severity::Error) => "error",
        })
    }
}

/// A recoverable problem met while accessing a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Path of the node the warning is about.
    pub source: String,
    pub message: String,
    pub severity: Severity,
}

/// Receives warnings instead of the default log sink.
pub trait WarningListener {
    fn warning(&self, warning: &Warning);
}

/// Listener that keeps every warning it receives.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use metatree_access::{CollectingListener, Severity, Warning, WarningListener};
///
/// let listener = Rc::new(CollectingListener::default());
/// listener.warning(&Warning {
///     source: "Grid".into(),
///     message: "not a number".into(),
///     severity: Severity::Warn,
/// });
/// assert_eq!(listener.warnings().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct CollectingListener {
    warnings: RefCell<Vec<Warning>>,
}

impl CollectingListener {
    /// Returns a copy of the warnings received so far.
    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings.borrow().clone()
    }

    pub fn clear(&self) {
        self.warnings.borrow_mut().clear();
    }
}

impl WarningListener for CollectingListener {
    fn warning(&self, warning: &Warning) {
        self.warnings.borrow_mut().push(warning.clone());
    }
}

/// Level plus optional listener, carried by each accessor.
#[derive(Clone, Default)]
pub(crate) struct WarningSink {
    pub(crate) level: WarningLevel,
    pub(crate) listener: Option<Rc<dyn WarningListener>>,
}

impl fmt::Debug for WarningSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarningSink")
            .field("level", &self.level)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl WarningSink {
    pub(crate) fn new(level: WarningLevel) -> Self {
        Self {
            level,
            listener: None,
        }
    }

    pub(crate) fn emit(&self, source: &str, message: impl Into<String>) {
        let WarningLevel::On(severity) = self.level else {
            return;
        };
        let warning = Warning {
            source: source.to_string(),
            message: message.into(),
            severity,
        };
        match &self.listener {
            Some(listener) => listener.warning(&warning),
            None => log(&warning),
        }
    }
}

fn log(warning: &Warning) {
    let source = warning.source.as_str();
    let message = warning.message.as_str();
    match warning.severity {
        Severity::Debug => debug!(source, "{message}"),
        Severity::Info => info!(source, "{message}"),
        Severity::Warn => warn!(source, "{message}"),
        Severity::Error => error!(source, "{message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_off_suppresses_listener() {
        let listener = Rc::new(CollectingListener::default());
        let sink = WarningSink {
            level: WarningLevel::Off,
            listener: Some(listener.clone()),
        };
        sink.emit("Grid", "ignored");
        assert!(listener.warnings().is_empty());
    }

    #[test]
    fn test_listener_receives_configured_severity() {
        let listener = Rc::new(CollectingListener::default());
        let sink = WarningSink {
            level: WarningLevel::On(Severity::Info),
            listener: Some(listener.clone()),
        };
        sink.emit("Grid/name", "bad text");
        assert_eq!(
            listener.warnings(),
            vec![Warning {
                source: "Grid/name".into(),
                message: "bad text".into(),
                severity: Severity::Info,
            }]
        );
        listener.clear();
        assert!(listener.warnings().is_empty());
    }

    #[test]
    fn test_level_serde_as_text() {
        let yaml = serde_yaml::to_string(&WarningLevel::On(Severity::Error)).unwrap();
        assert_eq!(yaml.trim(), "error");
        let level: WarningLevel = serde_yaml::from_str("off").unwrap();
        assert_eq!(level, WarningLevel::Off);
    }
}
