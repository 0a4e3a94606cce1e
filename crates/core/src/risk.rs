//! Patient risk scoring.
//!
//! Pure, deterministic scoring over the medical-history tags captured at
//! registration. The rule is additive and order-independent: every patient
//! starts at the base score and each recognised condition contributes a fixed
//! increment at most once, however many tags mention it. Unrecognised tags
//! contribute nothing and there is no upper bound.
//!
//! The score is computed exactly once, when the patient is registered.

/// Score every patient starts from.
pub const BASE_SCORE: i64 = 10;

/// Increment for a cardiac history.
pub const CARDIAC_INCREMENT: i64 = 50;

/// Increment for a diabetic condition.
pub const DIABETIC_INCREMENT: i64 = 20;

/// Increment for a respiratory condition.
pub const RESPIRATORY_INCREMENT: i64 = 30;

/// Compute the risk score for a sequence of medical-history tags.
///
/// Recognition is a case-insensitive keyword match so free-form labels such
/// as `"Cardiac History"` or `"Respiratory Issue"` score correctly.
pub fn score_medical_history<I, S>(tags: I) -> i64
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cardiac = false;
    let mut diabetic = false;
    let mut respiratory = false;

    for tag in tags {
        let tag = tag.as_ref().to_ascii_lowercase();
        cardiac |= tag.contains("cardiac");
        diabetic |= tag.contains("diabetic");
        respiratory |= tag.contains("respiratory");
    }

    let mut score = BASE_SCORE;
    if cardiac {
        score += CARDIAC_INCREMENT;
    }
    if diabetic {
        score += DIABETIC_INCREMENT;
    }
    if respiratory {
        score += RESPIRATORY_INCREMENT;
    }
    score
}
