// src/supervisor/classify.rs

//! Relay output classification.
//!
//! The relay writes most errors to stderr, but some error-severity lines
//! show up on stdout tagged with an in-band marker (`[err]`). Both count as
//! error lines; an error line containing a fatal pattern means the relay
//! should be killed.

use std::time::SystemTime;

use crate::config::SupervisorSettings;
use crate::types::{LineAction, StreamKind};

/// One line of relay output.
#[derive(Debug, Clone)]
pub struct OutputEvent {
    pub stream: StreamKind,
    pub line: String,
    pub at: SystemTime,
}

impl OutputEvent {
    pub fn new(stream: StreamKind, line: impl Into<String>) -> Self {
        Self {
            stream,
            line: line.into(),
            at: SystemTime::now(),
        }
    }
}

/// Case-sensitive substrings that make an error line fatal.
#[derive(Debug, Clone, Default)]
pub struct FatalPatterns {
    patterns: Vec<String>,
}

impl FatalPatterns {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::<String>::into)
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// First pattern contained in `line`, if any.
    pub fn find_in(&self, line: &str) -> Option<&str> {
        self.patterns
            .iter()
            .map(String::as_str)
            .find(|p| line.contains(p))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct LineClassifier {
    error_marker: String,
    fatal: FatalPatterns,
}

impl LineClassifier {
    pub fn new(error_marker: impl Into<String>, fatal: FatalPatterns) -> Self {
        Self {
            error_marker: error_marker.into(),
            fatal,
        }
    }

    pub fn from_settings(settings: &SupervisorSettings) -> Self {
        Self::new(
            settings.error_marker.clone(),
            FatalPatterns::new(settings.fatal_patterns.iter().cloned()),
        )
    }

    pub fn fatal_patterns(&self) -> &FatalPatterns {
        &self.fatal
    }

    pub fn classify(&self, event: &OutputEvent) -> LineAction {
        self.classify_line(event.stream, &event.line)
    }

    pub fn classify_line(&self, stream: StreamKind, line: &str) -> LineAction {
        if line.trim().is_empty() {
            return LineAction::Ignore;
        }

        let is_error = match stream {
            StreamKind::Stderr => true,
            StreamKind::Stdout => {
                !self.error_marker.is_empty() && line.contains(self.error_marker.as_str())
            }
        };

        if !is_error {
            return LineAction::Info;
        }

        if self.fatal.find_in(line).is_some() {
            LineAction::KillNow
        } else {
            LineAction::Error
        }
    }
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new("[err]", FatalPatterns::new(["Out of memory", "Dying"]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_ignored_on_both_streams() {
        let c = LineClassifier::default();
        assert_eq!(c.classify_line(StreamKind::Stdout, "   "), LineAction::Ignore);
        assert_eq!(c.classify_line(StreamKind::Stderr, "\t"), LineAction::Ignore);
        assert_eq!(c.classify_line(StreamKind::Stderr, ""), LineAction::Ignore);
    }

    #[test]
    fn stderr_is_error_and_fatal_patterns_kill() {
        let c = LineClassifier::default();
        assert_eq!(
            c.classify_line(StreamKind::Stderr, "[warn] could not bind"),
            LineAction::Error
        );
        assert_eq!(
            c.classify_line(StreamKind::Stderr, "Out of memory on malloc()"),
            LineAction::KillNow
        );
        assert_eq!(
            c.classify_line(StreamKind::Stderr, "Catching signal TERM, exiting cleanly. Dying."),
            LineAction::KillNow
        );
    }

    #[test]
    fn fatal_match_is_case_sensitive() {
        let c = LineClassifier::default();
        assert_eq!(
            c.classify_line(StreamKind::Stderr, "out of memory"),
            LineAction::Error
        );
    }

    #[test]
    fn marked_stdout_is_handled_like_stderr() {
        let c = LineClassifier::default();
        assert_eq!(
            c.classify_line(StreamKind::Stdout, "Jan 01 [err] bad descriptor"),
            LineAction::Error
        );
        assert_eq!(
            c.classify_line(StreamKind::Stdout, "Jan 01 [err] Out of memory"),
            LineAction::KillNow
        );
    }

    #[test]
    fn plain_stdout_is_info_even_with_fatal_text() {
        let c = LineClassifier::default();
        assert_eq!(
            c.classify_line(StreamKind::Stdout, "[notice] Bootstrapped 100%: Done"),
            LineAction::Info
        );
        assert_eq!(
            c.classify_line(StreamKind::Stdout, "[notice] Dying is not happening"),
            LineAction::Info
        );
    }

    #[test]
    fn first_matching_pattern_is_reported() {
        let p = FatalPatterns::new(["Dying", "Out of memory"]);
        assert_eq!(p.find_in("Out of memory. Dying."), Some("Dying"));
        assert_eq!(p.find_in("fine"), None);
    }
}
