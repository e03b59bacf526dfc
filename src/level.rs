use colored::{Color, ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Log severity, most severe first.
///
/// A record at level `L` passes a threshold `T` when `L <= T`, so `Level::Error`
/// passes every threshold and `Level::Silly` only passes `Level::Silly`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
    Success = 3,
    Verbose = 4,
    Debug = 5,
    Silly = 6,
}

impl Level {
    /// Every level in priority order.
    pub const ALL: [Level; 7] = [
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Success,
        Level::Verbose,
        Level::Debug,
        Level::Silly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Success => "success",
            Level::Verbose => "verbose",
            Level::Debug => "debug",
            Level::Silly => "silly",
        }
    }

    pub fn priority(&self) -> u8 {
        *self as u8
    }

    pub fn from_priority(priority: u8) -> Option<Level> {
        Level::ALL.get(priority as usize).copied()
    }

    /// Whether a record at this level passes `threshold`.
    pub fn passes(&self, threshold: Level) -> bool {
        *self <= threshold
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`Level`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown log level `{0}`")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Level::ALL
            .iter()
            .copied()
            .find(|level| level.as_str() == lower)
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::INFO => Level::Info,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::TRACE => Level::Silly,
        }
    }
}

/// Terminal style applied to the `[LEVEL]` tag of human-readable lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelStyle {
    pub foreground: Color,
    pub background: Option<Color>,
    pub bold: bool,
}

impl LevelStyle {
    /// Black bold text on the given background.
    pub fn on(background: Color) -> Self {
        Self {
            foreground: Color::Black,
            background: Some(background),
            bold: true,
        }
    }

    pub fn paint(&self, text: &str) -> ColoredString {
        let mut painted = text.color(self.foreground);
        if let Some(background) = self.background {
            painted = painted.on_color(background);
        }
        if self.bold {
            painted = painted.bold();
        }
        painted
    }
}

/// Per-level styles, as returned by the `on_select_colors` hook.
pub type LevelColors = BTreeMap<Level, LevelStyle>;

pub fn default_colors() -> LevelColors {
    BTreeMap::from([
        (Level::Error, LevelStyle::on(Color::Red)),
        (Level::Warn, LevelStyle::on(Color::Yellow)),
        (Level::Info, LevelStyle::on(Color::White)),
        (Level::Success, LevelStyle::on(Color::Green)),
        (Level::Verbose, LevelStyle::on(Color::Blue)),
        (Level::Debug, LevelStyle::on(Color::Magenta)),
        (Level::Silly, LevelStyle::on(Color::Green)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_follow_priority() {
        assert!(Level::Error.passes(Level::Info));
        assert!(Level::Info.passes(Level::Info));
        assert!(!Level::Debug.passes(Level::Info));
        assert!(Level::Success.passes(Level::Success));
        assert!(!Level::Verbose.passes(Level::Success));
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("WARN".parse::<Level>(), Ok(Level::Warn));
        assert_eq!(" success ".parse::<Level>(), Ok(Level::Success));
        assert_eq!(
            "loud".parse::<Level>(),
            Err(ParseLevelError("loud".to_string()))
        );
    }

    #[test]
    fn priority_round_trips() {
        for level in Level::ALL {
            assert_eq!(Level::from_priority(level.priority()), Some(level));
        }
        assert_eq!(Level::from_priority(7), None);
    }

    #[test]
    fn every_level_has_a_default_color() {
        let colors = default_colors();
        assert!(Level::ALL.iter().all(|level| colors.contains_key(level)));
    }
}
