// Candidate validation
// Gates early exit: a rejected candidate may still be kept as best-so-far.

use crate::models::InsightReport;
use crate::services::text_processor::char_len;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CandidateRejection {
    #[error("candidate is empty")]
    Empty,
    #[error("candidate too short: {candidate} chars vs minimum {minimum}")]
    TooShort { candidate: usize, minimum: usize },
    #[error("no structural improvement: {after} flagged sentences vs {before} before")]
    NoStructuralImprovement { before: usize, after: usize },
}

pub fn validate_candidate(
    original: &str,
    candidate: &str,
    insights_before: &InsightReport,
    insights_after: &InsightReport,
    min_length_ratio: f64,
) -> Result<(), CandidateRejection> {
    let candidate_len = char_len(candidate.trim());
    if candidate_len == 0 {
        return Err(CandidateRejection::Empty);
    }

    let minimum = (char_len(original.trim()) as f64 * min_length_ratio).ceil() as usize;
    if candidate_len < minimum {
        return Err(CandidateRejection::TooShort {
            candidate: candidate_len,
            minimum,
        });
    }

    let before = insights_before.sentences.len();
    let after = insights_after.sentences.len();
    if after >= before {
        return Err(CandidateRejection::NoStructuralImprovement { before, after });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::detection::insights::analyze_insights;

    const ORIGINAL: &str = "Automation plays a role in modern release pipelines everywhere. \
        Documentation helps new engineers ramp up quickly.";

    #[test]
    fn test_empty_candidate_rejected() {
        let before = analyze_insights(ORIGINAL);
        let after = analyze_insights("");
        assert_eq!(
            validate_candidate(ORIGINAL, "   ", &before, &after, 0.7),
            Err(CandidateRejection::Empty)
        );
    }

    #[test]
    fn test_short_candidate_rejected() {
        let before = analyze_insights(ORIGINAL);
        let candidate = "Release automation matters.";
        let after = analyze_insights(candidate);
        assert!(matches!(
            validate_candidate(ORIGINAL, candidate, &before, &after, 0.7),
            Err(CandidateRejection::TooShort { .. })
        ));
    }

    #[test]
    fn test_equal_flag_count_rejected() {
        let before = analyze_insights(ORIGINAL);
        let after = analyze_insights(ORIGINAL);
        assert_eq!(
            validate_candidate(ORIGINAL, ORIGINAL, &before, &after, 0.7),
            Err(CandidateRejection::NoStructuralImprovement { before: 2, after: 2 })
        );
    }

    #[test]
    fn test_improved_candidate_accepted() {
        let before = analyze_insights(ORIGINAL);
        let candidate = "Our release pipeline runs itself now, and since we wrote 12 short guides \
                         the new engineers ship in their first week.";
        let after = analyze_insights(candidate);
        assert!(after.sentences.len() < before.sentences.len());
        assert_eq!(validate_candidate(ORIGINAL, candidate, &before, &after, 0.7), Ok(()));
    }
}
