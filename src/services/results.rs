//! Leaderboard and per-question statistics computed from a session and its roster.

use std::{
    cmp::Ordering,
    time::{Duration, SystemTime},
};

use crate::state::{
    player::{AnswerRecord, Player, PlayerId},
    session::{OptionId, Question, QuestionId, Session},
    store::SessionRecord,
};

/// What one player did on one question.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    /// Index of the question in the session.
    pub question_index: usize,
    /// Identifier of the question.
    pub question_id: QuestionId,
    /// Whether a submission was recorded.
    pub answered: bool,
    /// Whether the window is closed so correctness may be shown.
    pub revealed: bool,
    /// Submitted option ids, empty when unanswered.
    pub option_ids: Vec<OptionId>,
    /// Judged correctness; always `false` while unrevealed.
    pub correct: bool,
    /// Awarded points; always `0` while unrevealed.
    pub points_awarded: u32,
    /// Submission timestamp.
    pub submitted_at: Option<SystemTime>,
    /// Time from window opening to submission.
    pub response_time: Option<Duration>,
}

impl AnswerOutcome {
    fn new(index: usize, question: &Question, slot: Option<&AnswerRecord>, revealed: bool) -> Self {
        let (correct, points_awarded) = match slot {
            Some(record) if revealed => (record.correct, record.points_awarded),
            _ => (false, 0),
        };

        Self {
            question_index: index,
            question_id: question.id,
            answered: slot.is_some(),
            revealed,
            option_ids: slot
                .map(|record| record.option_ids.iter().cloned().collect())
                .unwrap_or_default(),
            correct,
            points_awarded,
            submitted_at: slot.map(|record| record.submitted_at),
            response_time: slot.map(AnswerRecord::response_time),
        }
    }
}

/// A player's ranked line in the leaderboard.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStanding {
    /// One-based rank; ties are broken so ranks are unique.
    pub rank: usize,
    /// Player identifier.
    pub player_id: PlayerId,
    /// Display name.
    pub name: String,
    /// Sum of awarded points.
    pub score: u32,
    /// Number of correct answers.
    pub correct_count: usize,
    /// Number of submitted answers.
    pub answered_count: usize,
    /// Mean response time over submitted answers.
    pub average_response_time: Option<Duration>,
    /// Per-question outcomes in question order.
    pub outcomes: Vec<AnswerOutcome>,
}

/// Aggregates of one question across all players.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionStats {
    /// Index of the question in the session.
    pub question_index: usize,
    /// Identifier of the question.
    pub question_id: QuestionId,
    /// Question prompt.
    pub text: String,
    /// Number of submitted answers.
    pub total_responses: usize,
    /// Number of correct answers.
    pub correct_responses: usize,
    /// `correct / total`, `0` without responses.
    pub accuracy: f64,
    /// Mean response time over submitted answers.
    pub average_response_time: Option<Duration>,
}

/// Full results of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResults {
    /// Players ordered by rank.
    pub leaderboard: Vec<PlayerStanding>,
    /// Statistics per question, in question order.
    pub questions: Vec<QuestionStats>,
    /// Mean score, `0` without players.
    pub average_score: f64,
    /// Best score, `0` without players.
    pub highest_score: u32,
    /// Worst score, `0` without players.
    pub lowest_score: u32,
    /// Mean question accuracy, `0` without questions.
    pub average_accuracy: f64,
}

/// One player's view of their own answers.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSummary {
    /// Per-question outcomes in question order.
    pub outcomes: Vec<AnswerOutcome>,
    /// Sum of revealed awarded points.
    pub total_score: u32,
}

struct Ranked {
    standing: PlayerStanding,
    correct_time: Duration,
    join_order: usize,
}

fn rank_order(left: &Ranked, right: &Ranked) -> Ordering {
    right
        .standing
        .score
        .cmp(&left.standing.score)
        .then(left.correct_time.cmp(&right.correct_time))
        .then(left.join_order.cmp(&right.join_order))
}

fn mean_duration(durations: impl IntoIterator<Item = Duration>) -> Option<Duration> {
    let (total, count) = durations
        .into_iter()
        .fold((Duration::ZERO, 0u32), |(total, count), value| {
            (total.saturating_add(value), count + 1)
        });
    (count > 0).then(|| total / count)
}

fn slot(player: &Player, index: usize) -> Option<&AnswerRecord> {
    player.answers.get(index).and_then(Option::as_ref)
}

/// Compute the leaderboard and statistics of a session.
///
/// Every recorded answer counts, so this is meant for the owner once the
/// session has ended or for an in-progress overview.
pub fn compute<'a>(
    session: &Session,
    players: impl IntoIterator<Item = &'a Player>,
) -> SessionResults {
    let players: Vec<&Player> = players.into_iter().collect();

    let mut ranked: Vec<Ranked> = players
        .iter()
        .map(|player| {
            let outcomes: Vec<AnswerOutcome> = session
                .questions
                .iter()
                .enumerate()
                .map(|(index, question)| {
                    AnswerOutcome::new(index, question, slot(player, index), true)
                })
                .collect();
            let correct_time = player
                .answered()
                .filter(|record| record.correct)
                .map(AnswerRecord::response_time)
                .fold(Duration::ZERO, Duration::saturating_add);

            Ranked {
                standing: PlayerStanding {
                    rank: 0,
                    player_id: player.id,
                    name: player.name.clone(),
                    score: player.score(),
                    correct_count: player.answered().filter(|record| record.correct).count(),
                    answered_count: player.answered().count(),
                    average_response_time: mean_duration(
                        player.answered().map(AnswerRecord::response_time),
                    ),
                    outcomes,
                },
                correct_time,
                join_order: player.join_order,
            }
        })
        .collect();
    ranked.sort_by(rank_order);

    let leaderboard: Vec<PlayerStanding> = ranked
        .into_iter()
        .enumerate()
        .map(|(index, entry)| PlayerStanding {
            rank: index + 1,
            ..entry.standing
        })
        .collect();

    let questions: Vec<QuestionStats> = session
        .questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let records: Vec<&AnswerRecord> =
                players.iter().filter_map(|player| slot(player, index)).collect();
            let total_responses = records.len();
            let correct_responses = records.iter().filter(|record| record.correct).count();
            let accuracy = if total_responses == 0 {
                0.0
            } else {
                correct_responses as f64 / total_responses as f64
            };

            QuestionStats {
                question_index: index,
                question_id: question.id,
                text: question.text.clone(),
                total_responses,
                correct_responses,
                accuracy,
                average_response_time: mean_duration(
                    records.iter().map(|record| record.response_time()),
                ),
            }
        })
        .collect();

    let scores: Vec<u32> = leaderboard.iter().map(|standing| standing.score).collect();
    let average_score = if scores.is_empty() {
        0.0
    } else {
        scores.iter().map(|score| f64::from(*score)).sum::<f64>() / scores.len() as f64
    };
    let average_accuracy = if questions.is_empty() {
        0.0
    } else {
        questions.iter().map(|stats| stats.accuracy).sum::<f64>() / questions.len() as f64
    };

    SessionResults {
        highest_score: scores.iter().copied().max().unwrap_or(0),
        lowest_score: scores.iter().copied().min().unwrap_or(0),
        leaderboard,
        questions,
        average_score,
        average_accuracy,
    }
}

/// Outcomes of one player, hiding correctness of questions still open for answers.
pub fn player_summary(record: &SessionRecord, player: &Player, now: SystemTime) -> PlayerSummary {
    let outcomes: Vec<AnswerOutcome> = record
        .session
        .questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            AnswerOutcome::new(
                index,
                question,
                slot(player, index),
                record.is_revealed(index, now),
            )
        })
        .collect();
    let total_score = outcomes.iter().map(|outcome| outcome.points_awarded).sum();

    PlayerSummary {
        outcomes,
        total_score,
    }
}
