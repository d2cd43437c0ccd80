//! Request and response bodies of the local HTTP API.
//! Kept separate from the session types so the SPA contract can evolve on its own.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::checker::{self, SentenceCheck, WordAlignment};
use crate::config::Topic;
use crate::domain::{DrillSentence, ExerciseType, Grading, QuestionKind, Score};
use crate::questions;
use crate::session::{CompletedSentence, DrillSummary, ExerciseSession, Phase, RetryAction};

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ExerciseInfo {
    #[serde(rename = "type")]
    pub exercise: ExerciseType,
    pub storage_key: &'static str,
    pub grading: Grading,
    pub requires_generation: bool,
    pub accepts_question_type: bool,
}

impl From<ExerciseType> for ExerciseInfo {
    fn from(t: ExerciseType) -> Self {
        Self {
            exercise: t,
            storage_key: t.storage_key(),
            grading: t.grading(),
            requires_generation: t.requires_generation(),
            accepts_question_type: t.accepts_question_type(),
        }
    }
}

#[derive(Serialize)]
pub struct TopicsOut {
    pub topics: Vec<Topic>,
}

#[derive(Serialize)]
pub struct ScoreOut {
    pub correct: usize,
    pub total: usize,
    pub accuracy: u32,
}

impl From<Score> for ScoreOut {
    fn from(s: Score) -> Self {
        Self { correct: s.correct, total: s.total, accuracy: s.accuracy() }
    }
}

/// A locally graded question as the SPA renders it.
#[derive(Serialize)]
pub struct QuestionView {
    pub id: String,
    pub prompt: String,
    pub kind: QuestionKind,
    pub user_answer: Option<String>,
    /// `null` until submitted.
    pub is_correct: Option<bool>,
    /// Only present once submitted with "show answers" on.
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
}

#[derive(Serialize)]
pub struct DrillView {
    pub current_index: usize,
    pub total: usize,
    pub current: Option<DrillSentence>,
    pub completed: Vec<CompletedSentence>,
    pub review_mode: bool,
    pub summary: Option<DrillSummary>,
}

#[derive(Serialize)]
pub struct SessionView {
    #[serde(rename = "type")]
    pub exercise: ExerciseType,
    pub session_id: Uuid,
    pub phase: Phase,
    pub busy: bool,
    pub selected_topic: Option<String>,
    pub question_type: Option<String>,
    /// Reading content has its answer keys removed until they are revealed.
    pub content: Option<Value>,
    pub answers: BTreeMap<String, String>,
    pub submitted: bool,
    pub show_answers: bool,
    pub feedback: Option<Value>,
    pub last_error: Option<String>,
    pub retry: Option<RetryAction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<QuestionView>,
    pub score: Option<ScoreOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drill: Option<DrillView>,
}

impl From<&ExerciseSession> for SessionView {
    fn from(s: &ExerciseSession) -> Self {
        let exercise = s.exercise();
        let content = s.generated_content();

        let mut questions_out = Vec::new();
        let mut score = None;
        let mut drill = None;
        match exercise.grading() {
            Grading::Local => {
                let qs = content
                    .and_then(|c| questions::extract_questions(exercise, c).ok())
                    .unwrap_or_default();
                score = s.score(&qs).map(ScoreOut::from);
                questions_out = qs
                    .iter()
                    .map(|q| QuestionView {
                        id: q.id.clone(),
                        prompt: q.prompt.clone(),
                        kind: q.kind,
                        user_answer: s.answers().get(&q.id).cloned(),
                        is_correct: s.is_correct(q),
                        correct_answer: s.revealed_answer(q).map(str::to_string),
                        explanation: s.revealed_answer(q).map(|_| q.explanation.clone()),
                    })
                    .collect();
            }
            Grading::Remote => {
                score = s.feedback().and_then(checker::feedback_score).map(ScoreOut::from);
            }
            Grading::Drill => {
                let sentences = content
                    .and_then(|c| questions::drill_sentences(exercise, c).ok())
                    .unwrap_or_default();
                let progress = s.drill();
                drill = Some(DrillView {
                    current_index: progress.current_index,
                    total: sentences.len(),
                    current: sentences.get(progress.current_index).cloned(),
                    completed: progress.completed.clone(),
                    review_mode: progress.review_mode,
                    summary: progress.review_mode.then(|| progress.summary()),
                });
            }
        }

        Self {
            exercise,
            session_id: s.session_id(),
            phase: s.phase(),
            busy: s.is_busy(),
            selected_topic: s.selected_topic().map(str::to_string),
            question_type: s.question_type().map(str::to_string),
            content: content.map(|c| {
                let reveal = s.submitted() && s.show_answers();
                if exercise.grading() == Grading::Local && !reveal {
                    questions::redact_answers(c)
                } else {
                    c.clone()
                }
            }),
            answers: s.answers().clone(),
            submitted: s.submitted(),
            show_answers: s.show_answers(),
            feedback: s.feedback().cloned(),
            last_error: s.last_error().map(str::to_string),
            retry: s.retry_action().ok(),
            questions: questions_out,
            score,
            drill,
        }
    }
}

//
// HTTP request bodies
//

#[derive(Debug, Deserialize)]
pub struct TopicIn {
    pub topic: String,
    #[serde(default)]
    pub question_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateIn {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub subdomain: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswersIn {
    pub answers: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct ShowAnswersIn {
    pub show: bool,
}

#[derive(Debug, Deserialize)]
pub struct WordsIn {
    pub words: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SkipIn {
    #[serde(default)]
    pub partial: String,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptIn {
    pub transcript: String,
}

#[derive(Deserialize)]
pub struct SettingsSaveIn {
    pub openai_api_key: String,
    pub base_url: String,
}

//
// HTTP response bodies for drill actions
//

#[derive(Serialize)]
pub struct CheckOut {
    pub check: SentenceCheck,
    pub session: SessionView,
}

#[derive(Serialize)]
pub struct CompareOut {
    pub alignment: WordAlignment,
    pub session: SessionView,
}
