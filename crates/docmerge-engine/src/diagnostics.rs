//! Warning reporting shared by every stage of a merge run.
//!
//! A single [`Diagnostics`] value is created by the pipeline driver and passed
//! by reference to the parser, the document model and the passes. It filters
//! parser warnings by a configurable threshold, counts every emitted warning
//! and, in strict mode, turns a non-zero count into a fatal error at the end
//! of the run.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// Threshold for warnings produced while parsing markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum WarningLevel {
    Off,
    #[default]
    Serious,
    Minor,
    All,
}

/// Severity attached to a single parser warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Probably broken output, e.g. an empty link title.
    Serious,
    /// Suspicious but usually harmless text, e.g. an unescaped `#`.
    Minor,
}

impl WarningLevel {
    pub fn admits(self, severity: Severity) -> bool {
        match severity {
            Severity::Serious => self >= WarningLevel::Serious,
            Severity::Minor => self >= WarningLevel::Minor,
        }
    }
}

impl FromStr for WarningLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(WarningLevel::All),
            "minor" => Ok(WarningLevel::Minor),
            "serious" => Ok(WarningLevel::Serious),
            "off" => Ok(WarningLevel::Off),
            other => Err(format!(
                "unknown warning level '{other}', expected all, minor, serious or off"
            )),
        }
    }
}

impl fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WarningLevel::Off => "off",
            WarningLevel::Serious => "serious",
            WarningLevel::Minor => "minor",
            WarningLevel::All => "all",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    level: Cell<WarningLevel>,
    count: Cell<usize>,
    strict: bool,
    messages: RefCell<Vec<String>>,
}

impl Diagnostics {
    pub fn new(level: WarningLevel, strict: bool) -> Self {
        Self {
            level: Cell::new(level),
            strict,
            ..Self::default()
        }
    }

    pub fn level(&self) -> WarningLevel {
        self.level.get()
    }

    /// Reports a structural warning. Always emitted and counted.
    pub fn warn(&self, message: impl fmt::Display) {
        let message = message.to_string();
        log::warn!("{message}");
        self.count.set(self.count.get() + 1);
        self.messages.borrow_mut().push(message);
    }

    /// Reports a parser warning, subject to the current threshold.
    pub fn parser_warning(&self, severity: Severity, message: impl fmt::Display) {
        if self.level.get().admits(severity) {
            self.warn(message);
        }
    }

    /// Temporarily replaces the parser warning threshold.
    ///
    /// The previous threshold is restored when the returned guard is dropped.
    pub fn with_level(&self, level: WarningLevel) -> LevelGuard<'_> {
        let previous = self.level.replace(level);
        LevelGuard {
            diagnostics: self,
            previous,
        }
    }

    pub fn warning_count(&self) -> usize {
        self.count.get()
    }

    /// Every warning emitted so far, in order.
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Ends the run. In strict mode any warning makes the run fail.
    pub fn finish(&self) -> Result<(), EngineError> {
        let count = self.count.get();
        if self.strict && count > 0 {
            return Err(EngineError::TooManyWarnings(count));
        }
        Ok(())
    }
}

pub struct LevelGuard<'a> {
    diagnostics: &'a Diagnostics,
    previous: WarningLevel,
}

impl Drop for LevelGuard<'_> {
    fn drop(&mut self) {
        self.diagnostics.level.set(self.previous);
    }
}
