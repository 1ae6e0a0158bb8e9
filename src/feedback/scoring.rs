use serde::Serialize;

use crate::models::{
    net_score, DiagnosisResult, ScoreBreakdown, HINT_PENALTY_PER_HINT, MAX_KEY_QUESTION_POINTS,
};

/// Points per student turn for the key-questions part.
const POINTS_PER_QUESTION: u32 = 4;

/// Turn counts up to which time efficiency is full / reduced.
const EFFICIENT_TURNS: usize = 8;
const ACCEPTABLE_TURNS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Score {
    pub breakdown: ScoreBreakdown,
    pub hints_used: u32,
    pub hint_penalty: u32,
    pub total: u32,
}

/// Rubric score for the deterministic path.
pub fn score_interview(result: DiagnosisResult, student_turns: usize, hints_used: u32) -> Score {
    let turns = u32::try_from(student_turns).unwrap_or(u32::MAX);

    let breakdown = ScoreBreakdown {
        correct_diagnosis: match result {
            DiagnosisResult::Correct => 40,
            DiagnosisResult::Partial => 20,
            DiagnosisResult::Wrong => 0,
        },
        key_questions: turns
            .saturating_mul(POINTS_PER_QUESTION)
            .min(MAX_KEY_QUESTION_POINTS),
        right_tests: match result {
            DiagnosisResult::Correct => 20,
            DiagnosisResult::Partial => 10,
            DiagnosisResult::Wrong => 5,
        },
        time_efficiency: time_efficiency(student_turns),
        ruled_out_differentials: match result {
            DiagnosisResult::Correct => 10,
            DiagnosisResult::Partial => 5,
            DiagnosisResult::Wrong => 2,
        },
    };

    let hint_penalty = hint_penalty(hints_used);
    Score {
        breakdown,
        hints_used,
        hint_penalty,
        total: net_score(&breakdown, hint_penalty),
    }
}

pub fn hint_penalty(hints_used: u32) -> u32 {
    hints_used.saturating_mul(HINT_PENALTY_PER_HINT)
}

fn time_efficiency(student_turns: usize) -> u32 {
    if student_turns <= EFFICIENT_TURNS {
        10
    } else if student_turns <= ACCEPTABLE_TURNS {
        7
    } else {
        3
    }
}
