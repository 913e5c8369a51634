//! Answer judging. Every question kind goes through the same exact-set comparison.

use std::collections::BTreeSet;

use crate::state::session::{OptionId, Question};

/// Outcome of judging one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    /// Whether the submission matched the correct set exactly.
    pub correct: bool,
    /// Points awarded: the question's points when correct, zero otherwise.
    pub points: u32,
}

/// Judge `chosen` against the question's correct options.
///
/// No partial credit: a subset or superset of the correct set scores zero.
pub fn score(question: &Question, chosen: &BTreeSet<OptionId>) -> Score {
    let expected = question.correct_ids();
    let correct =
        chosen.len() == expected.len() && chosen.iter().all(|id| expected.contains(id.as_str()));

    Score {
        correct,
        points: if correct { question.points } else { 0 },
    }
}
