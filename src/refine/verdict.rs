//! Validator verdict classification.
//!
//! Turns the validator's free-form answer into a three-way decision by a
//! keyword scan over the start of the normalized text. The classifier is a
//! pure function so it can be swapped for a structured-output contract
//! without touching the loop.

use serde::{Deserialize, Serialize};

/// Number of leading characters scanned for keywords.
pub const SCAN_WINDOW: usize = 100;

/// Keywords that signal approval.
pub const APPROVAL_KEYWORDS: &[&str] = &["APPROVED", "APPROVE", "ACCEPT", "ACCEPTABLE", "GOOD ENOUGH"];

/// Keywords that signal rejection. These win over approval keywords.
pub const REJECTION_KEYWORDS: &[&str] = &["REJECTED", "REJECT", "NEEDS IMPROVEMENT", "NOT ACCEPTABLE", "REVISE"];

/// Classified validator decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approved,
    Rejected,
    /// Neither keyword set matched. Handled like `Rejected`.
    Ambiguous,
}

impl Verdict {
    pub fn is_approved(&self) -> bool {
        matches!(self, Verdict::Approved)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::Approved => "approved",
            Verdict::Rejected => "rejected",
            Verdict::Ambiguous => "ambiguous",
        };
        write!(f, "{}", s)
    }
}

/// Strip emphasis markers, uppercase, trim and keep the scan window.
pub fn normalize(text: &str) -> String {
    let cleaned: String = text.chars().filter(|c| *c != '*' && *c != '#').collect();
    cleaned.to_uppercase().trim().chars().take(SCAN_WINDOW).collect()
}

/// Classify raw validator text.
pub fn classify(text: &str) -> Verdict {
    let window = normalize(text);
    let approved = APPROVAL_KEYWORDS.iter().any(|k| window.contains(k));
    let rejected = REJECTION_KEYWORDS.iter().any(|k| window.contains(k));

    match (approved, rejected) {
        (true, false) => Verdict::Approved,
        (_, true) => Verdict::Rejected,
        (false, false) => Verdict::Ambiguous,
    }
}
