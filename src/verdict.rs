//! Yes/no classification of free-text model replies.
//!
//! The filter and verification stages both ask the model a yes/no question but
//! read the answer differently: filtering is tolerant and fails open, while
//! verification accepts nothing but the exact token `yes`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Affirmative,
    Negative,
    Unclear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictPolicy {
    /// Substring match on the lower-cased, trimmed reply. Unclear replies pass.
    Tolerant,
    /// Reply must be exactly `yes`, case and whitespace included.
    Strict,
}

impl VerdictPolicy {
    pub fn classify(self, raw: &str) -> Verdict {
        match self {
            VerdictPolicy::Tolerant => classify_tolerant(raw),
            VerdictPolicy::Strict => classify_strict(raw),
        }
    }

    pub fn accepts(self, raw: &str) -> bool {
        match (self, self.classify(raw)) {
            (_, Verdict::Affirmative) => true,
            (VerdictPolicy::Tolerant, Verdict::Unclear) => true,
            _ => false,
        }
    }
}

pub fn classify_tolerant(raw: &str) -> Verdict {
    let reply = raw.trim().to_lowercase();
    let has_yes = reply.contains("yes");
    let has_no = reply.contains("no");

    if has_yes && !has_no {
        Verdict::Affirmative
    } else if has_no {
        Verdict::Negative
    } else {
        Verdict::Unclear
    }
}

pub fn classify_strict(raw: &str) -> Verdict {
    if raw == "yes" {
        Verdict::Affirmative
    } else {
        Verdict::Negative
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerant_reads_yes_in_any_case() {
        assert_eq!(classify_tolerant("  YES, this is a recipe.\n"), Verdict::Affirmative);
        assert!(VerdictPolicy::Tolerant.accepts("Yes"));
    }

    #[test]
    fn tolerant_rejects_when_no_appears() {
        assert_eq!(classify_tolerant("No"), Verdict::Negative);
        // "no" wins even alongside "yes".
        assert_eq!(classify_tolerant("yes and no"), Verdict::Negative);
        // Substring matching: "not" contains "no".
        assert_eq!(classify_tolerant("This is not food"), Verdict::Negative);
        assert!(!VerdictPolicy::Tolerant.accepts("no"));
    }

    #[test]
    fn tolerant_fails_open_on_ambiguous_reply() {
        assert_eq!(classify_tolerant(""), Verdict::Unclear);
        assert_eq!(classify_tolerant("maybe?"), Verdict::Unclear);
        assert!(VerdictPolicy::Tolerant.accepts(""));
    }

    #[test]
    fn strict_accepts_only_exact_yes() {
        assert!(VerdictPolicy::Strict.accepts("yes"));
        for reply in ["Yes", "yes.", " yes", "yes\n", "YES", "no", ""] {
            assert!(!VerdictPolicy::Strict.accepts(reply), "accepted {reply:?}");
        }
    }

    #[test]
    fn strict_never_reports_unclear() {
        assert_eq!(classify_strict("hmm"), Verdict::Negative);
    }
}
