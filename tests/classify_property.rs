// tests/classify_property.rs

use proptest::prelude::*;

use relayvisor::supervisor::{FatalPatterns, LineClassifier};
use relayvisor::types::{LineAction, StreamKind};

fn classifier() -> LineClassifier {
    LineClassifier::new("[err]", FatalPatterns::new(["Out of memory", "Dying"]))
}

proptest! {
    #[test]
    fn unmarked_stdout_never_kills(
        prefix in "[a-zA-Z0-9 :%.]{0,30}",
        pattern in prop::sample::select(vec!["Out of memory", "Dying", ""]),
        suffix in "[a-zA-Z0-9 :%.]{0,30}",
    ) {
        let line = format!("{prefix}{pattern}{suffix}");
        prop_assume!(!line.contains("[err]"));

        let action = classifier().classify_line(StreamKind::Stdout, &line);
        prop_assert_ne!(action, LineAction::KillNow);
        prop_assert_ne!(action, LineAction::Error);
    }

    #[test]
    fn stderr_with_a_fatal_pattern_always_kills(
        prefix in "[a-zA-Z0-9 :%.]{0,30}",
        pattern in prop::sample::select(vec!["Out of memory", "Dying"]),
        suffix in "[a-zA-Z0-9 :%.]{0,30}",
    ) {
        let line = format!("{prefix}{pattern}{suffix}");
        prop_assert_eq!(
            classifier().classify_line(StreamKind::Stderr, &line),
            LineAction::KillNow
        );
    }

    #[test]
    fn non_blank_stderr_is_never_ignored_or_info(line in "[a-z ]{0,20}[a-z][a-z ]{0,20}") {
        let action = classifier().classify_line(StreamKind::Stderr, &line);
        prop_assert!(matches!(action, LineAction::Error | LineAction::KillNow));
    }
}
