//! Unified line diffs between canonical texts

use similar::TextDiff;

/// Lines of unchanged context around each hunk
pub const CONTEXT_LINES: usize = 3;

/// Unified diff from `old` to `new`.
///
/// Returns an empty string when the texts are identical. Headers name the
/// sides `current` and `proposed`.
pub fn unified_diff(old: &str, new: &str) -> String {
    labelled_diff(old, new, "current", "proposed")
}

/// Unified diff with caller-chosen side labels
pub fn labelled_diff(old: &str, new: &str, old_label: &str, new_label: &str) -> String {
    let diff = TextDiff::from_lines(old, new);
    let mut unified = diff.unified_diff();
    unified
        .context_radius(CONTEXT_LINES)
        .header(old_label, new_label);
    unified.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_lines(diff: &str) -> Vec<&str> {
        diff.lines()
            .filter(|l| !l.starts_with("---") && !l.starts_with("+++"))
            .filter(|l| !l.starts_with("@@") && !l.starts_with('\\'))
            .collect()
    }

    #[test]
    fn test_identical_is_empty() {
        let text = "Resources:\n  Queue:\n    Type: AWS::SQS::Queue\n";
        assert_eq!(unified_diff(text, text), "");
        assert_eq!(unified_diff("", ""), "");
    }

    #[test]
    fn test_new_stack_is_all_additions() {
        let text = "a: 1\nb: 2\nc: 3\n";
        let diff = unified_diff("", text);
        let lines = body_lines(&diff);
        assert_eq!(lines, vec!["+a: 1", "+b: 2", "+c: 3"]);
        assert!(diff.starts_with("--- current\n+++ proposed\n"));
    }

    #[test]
    fn test_modification_hunk() {
        let old = "a: 1\nb: 2\nc: 3\n";
        let new = "a: 1\nb: 5\nc: 3\n";
        let diff = unified_diff(old, new);
        let lines = body_lines(&diff);
        assert_eq!(lines, vec![" a: 1", "-b: 2", "+b: 5", " c: 3"]);
    }

    #[test]
    fn test_deterministic() {
        let old = "x\ny\nz\n";
        let new = "x\nz\nw\n";
        assert_eq!(unified_diff(old, new), unified_diff(old, new));
    }

    #[test]
    fn test_custom_labels() {
        let diff = labelled_diff("a\n", "b\n", "expected", "actual");
        assert!(diff.starts_with("--- expected\n+++ actual\n"));
    }
}
