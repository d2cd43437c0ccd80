//! Exercise session state machine.
//!
//! `idle → topic_selected → generating → ready → answering → submitting → graded`
//!
//! Network calls happen outside this type. Each call is bracketed by a
//! `begin_*` that hands out a [`Ticket`] and a `finish_*`/`fail_*` that must
//! present the same ticket; a response carrying any other ticket is stale and
//! is rejected without touching state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::checker::{self, SentenceCheck, WordAlignment};
use crate::domain::{percent, DrillSentence, ExerciseType, Grading, Question, Score};
use crate::error::SessionError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    TopicSelected,
    Generating,
    Ready,
    Answering,
    Submitting,
    Graded,
}

/// Identifies one in-flight request of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub session: Uuid,
    pub seq: u64,
}

/// Action a `retry` re-issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryAction {
    Generate,
    Submit,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletedSentence {
    pub sentence: DrillSentence,
    pub user_answer: String,
    pub is_correct: bool,
    pub skipped: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DrillProgress {
    #[serde(default)]
    pub current_index: usize,
    #[serde(default)]
    pub completed: Vec<CompletedSentence>,
    #[serde(default)]
    pub review_mode: bool,
}

/// Counts shown once a drill reaches review mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DrillSummary {
    pub correct: usize,
    pub skipped: usize,
    pub total: usize,
    pub accuracy: u32,
}

impl DrillProgress {
    pub fn summary(&self) -> DrillSummary {
        let correct = self.completed.iter().filter(|c| c.is_correct).count();
        let skipped = self.completed.iter().filter(|c| c.skipped).count();
        let total = self.completed.len();
        DrillSummary { correct, skipped, total, accuracy: percent(correct, total) }
    }
}

/// What gets written to the task cache.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedSession {
    #[serde(default)]
    pub selected_topic: Option<String>,
    #[serde(default)]
    pub question_type: Option<String>,
    #[serde(default)]
    pub generated_content: Option<Value>,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    #[serde(default)]
    pub submitted: bool,
    #[serde(default)]
    pub feedback: Option<Value>,
    #[serde(default)]
    pub drill: DrillProgress,
}

#[derive(Clone, Debug)]
pub struct ExerciseSession {
    exercise: ExerciseType,
    session_id: Uuid,
    seq: u64,
    pending: Option<(Ticket, RetryAction)>,
    phase: Phase,
    selected_topic: Option<String>,
    question_type: Option<String>,
    generated_content: Option<Value>,
    answers: BTreeMap<String, String>,
    submitted: bool,
    feedback: Option<Value>,
    show_answers: bool,
    last_error: Option<String>,
    failed: Option<RetryAction>,
    drill: DrillProgress,
}

impl ExerciseSession {
    pub fn new(exercise: ExerciseType) -> Self {
        Self {
            exercise,
            session_id: Uuid::new_v4(),
            seq: 0,
            pending: None,
            phase: Phase::Idle,
            selected_topic: None,
            question_type: None,
            generated_content: None,
            answers: BTreeMap::new(),
            submitted: false,
            feedback: None,
            show_answers: false,
            last_error: None,
            failed: None,
            drill: DrillProgress::default(),
        }
    }

    /// Rebuild a session from a cache snapshot; the phase is inferred from its contents.
    pub fn restore(exercise: ExerciseType, snap: CachedSession) -> Self {
        let mut s = Self::new(exercise);
        s.phase = if snap.submitted {
            Phase::Graded
        } else if snap.generated_content.is_some() && !snap.answers.is_empty() {
            Phase::Answering
        } else if snap.generated_content.is_some() {
            Phase::Ready
        } else if !exercise.requires_generation() && !snap.answers.is_empty() {
            Phase::Answering
        } else if snap.selected_topic.is_some() {
            Phase::TopicSelected
        } else {
            Phase::Idle
        };
        s.show_answers = snap.submitted;
        s.selected_topic = snap.selected_topic;
        s.question_type = snap.question_type;
        s.generated_content = snap.generated_content;
        s.answers = snap.answers;
        s.submitted = snap.submitted;
        s.feedback = snap.feedback;
        s.drill = snap.drill;
        s
    }

    pub fn snapshot(&self) -> CachedSession {
        CachedSession {
            selected_topic: self.selected_topic.clone(),
            question_type: self.question_type.clone(),
            generated_content: self.generated_content.clone(),
            answers: self.answers.clone(),
            submitted: self.submitted,
            feedback: self.feedback.clone(),
            drill: self.drill.clone(),
        }
    }

    /// Whether the current state belongs in the cache.
    pub fn should_persist(&self) -> bool {
        self.generated_content.is_some()
            || (!self.exercise.requires_generation() && (!self.answers.is_empty() || self.submitted))
    }

    pub fn exercise(&self) -> ExerciseType {
        self.exercise
    }
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn selected_topic(&self) -> Option<&str> {
        self.selected_topic.as_deref()
    }
    pub fn question_type(&self) -> Option<&str> {
        self.question_type.as_deref()
    }
    pub fn generated_content(&self) -> Option<&Value> {
        self.generated_content.as_ref()
    }
    pub fn answers(&self) -> &BTreeMap<String, String> {
        &self.answers
    }
    pub fn submitted(&self) -> bool {
        self.submitted
    }
    pub fn feedback(&self) -> Option<&Value> {
        self.feedback.as_ref()
    }
    pub fn show_answers(&self) -> bool {
        self.show_answers
    }
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
    pub fn drill(&self) -> &DrillProgress {
        &self.drill
    }
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    fn next_ticket(&mut self, action: RetryAction) -> Ticket {
        self.seq += 1;
        let ticket = Ticket { session: self.session_id, seq: self.seq };
        self.pending = Some((ticket, action));
        ticket
    }

    fn take_pending(&mut self, ticket: Ticket, action: RetryAction) -> Result<(), SessionError> {
        match self.pending {
            Some((t, a)) if t == ticket && a == action => {
                self.pending = None;
                Ok(())
            }
            _ => Err(SessionError::Stale),
        }
    }

    /// Drop everything tied to the current content under a fresh session id.
    fn discard_exercise(&mut self) {
        self.session_id = Uuid::new_v4();
        self.generated_content = None;
        self.answers.clear();
        self.submitted = false;
        self.feedback = None;
        self.show_answers = false;
        self.last_error = None;
        self.failed = None;
        self.drill = DrillProgress::default();
    }

    fn submit_in_flight(&self) -> bool {
        matches!(self.pending, Some((_, RetryAction::Submit)))
    }

    pub fn select_topic(&mut self, topic: &str) -> Result<(), SessionError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(SessionError::EmptyTopic);
        }
        if self.submit_in_flight() {
            return Err(SessionError::Busy);
        }
        let changed = self.selected_topic.as_deref() != Some(topic);
        self.selected_topic = Some(topic.to_string());
        if changed && self.exercise.requires_generation() && self.phase != Phase::Idle {
            // content, answers and any in-flight generate belong to the old topic
            self.discard_exercise();
            self.pending = None;
            self.phase = Phase::TopicSelected;
        } else if self.phase == Phase::Idle {
            self.phase = Phase::TopicSelected;
        }
        Ok(())
    }

    pub fn set_question_type(&mut self, question_type: Option<String>) {
        self.question_type = question_type.filter(|q| !q.trim().is_empty());
    }

    /// Start a (re)generation: wipes content, answers, feedback and drill progress.
    /// Supersedes whatever request was in flight.
    pub fn begin_generate(&mut self) -> Result<Ticket, SessionError> {
        if !self.exercise.requires_generation() {
            return Err(SessionError::NothingToGenerate(self.exercise));
        }
        if self.selected_topic.is_none() {
            return Err(SessionError::NoTopic);
        }
        self.discard_exercise();
        self.phase = Phase::Generating;
        Ok(self.next_ticket(RetryAction::Generate))
    }

    pub fn finish_generate(&mut self, ticket: Ticket, content: Value) -> Result<(), SessionError> {
        self.take_pending(ticket, RetryAction::Generate)?;
        self.generated_content = Some(content);
        self.phase = Phase::Ready;
        Ok(())
    }

    pub fn fail_generate(&mut self, ticket: Ticket, message: impl Into<String>) -> Result<(), SessionError> {
        self.take_pending(ticket, RetryAction::Generate)?;
        self.last_error = Some(message.into());
        self.failed = Some(RetryAction::Generate);
        self.phase = Phase::TopicSelected;
        Ok(())
    }

    fn ensure_editable(&self) -> Result<(), SessionError> {
        if self.submitted {
            return Err(SessionError::AlreadySubmitted);
        }
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        if self.exercise.requires_generation() && self.generated_content.is_none() {
            return Err(SessionError::NotReady);
        }
        Ok(())
    }

    pub fn set_answer(&mut self, id: &str, value: &str) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.answers.insert(id.to_string(), value.to_string());
        if matches!(self.phase, Phase::Ready | Phase::Idle | Phase::TopicSelected) {
            self.phase = Phase::Answering;
        }
        Ok(())
    }

    pub fn set_answers(&mut self, answers: BTreeMap<String, String>) -> Result<(), SessionError> {
        self.ensure_editable()?;
        for (id, value) in answers {
            self.answers.insert(id, value);
        }
        if matches!(self.phase, Phase::Ready | Phase::Idle | Phase::TopicSelected) {
            self.phase = Phase::Answering;
        }
        Ok(())
    }

    /// Guarded by the "all filled" check; a rejected submit changes nothing but the error.
    pub fn begin_submit(&mut self, required_ids: &[String]) -> Result<Ticket, SessionError> {
        if self.exercise.grading() == Grading::Drill {
            return Err(SessionError::NotSubmittable(self.exercise));
        }
        self.ensure_editable()?;
        let missing: Vec<String> = required_ids
            .iter()
            .filter(|id| self.answers.get(*id).map_or(true, |v| v.trim().is_empty()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            let err = SessionError::MissingAnswers(missing);
            self.last_error = Some(err.to_string());
            return Err(err);
        }
        self.last_error = None;
        self.phase = Phase::Submitting;
        Ok(self.next_ticket(RetryAction::Submit))
    }

    pub fn finish_submit(&mut self, ticket: Ticket, feedback: Option<Value>) -> Result<(), SessionError> {
        self.take_pending(ticket, RetryAction::Submit)?;
        self.submitted = true;
        self.feedback = feedback;
        self.show_answers = true;
        self.failed = None;
        self.phase = Phase::Graded;
        Ok(())
    }

    pub fn fail_submit(&mut self, ticket: Ticket, message: impl Into<String>) -> Result<(), SessionError> {
        self.take_pending(ticket, RetryAction::Submit)?;
        self.last_error = Some(message.into());
        self.failed = Some(RetryAction::Submit);
        self.phase = Phase::Answering;
        Ok(())
    }

    /// The action a retry would re-issue, if the last one failed.
    pub fn retry_action(&self) -> Result<RetryAction, SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        self.failed.ok_or(SessionError::NothingToRetry)
    }

    pub fn set_show_answers(&mut self, show: bool) {
        self.show_answers = show;
    }

    /// Back to idle; any in-flight response becomes stale.
    pub fn reset(&mut self) {
        *self = Self::new(self.exercise);
    }

    /// `None` until submitted.
    pub fn is_correct(&self, question: &Question) -> Option<bool> {
        checker::check_question(question, self.answers.get(&question.id).map(String::as_str), self.submitted)
    }

    /// Correct answer, only once submitted and with "show answers" on.
    pub fn revealed_answer<'q>(&self, question: &'q Question) -> Option<&'q str> {
        (self.submitted && self.show_answers).then_some(question.correct_answer.as_str())
    }

    /// `None` until submitted.
    pub fn score(&self, questions: &[Question]) -> Option<Score> {
        checker::score(questions, &self.answers, self.submitted)
    }

    fn ensure_drill(&self) -> Result<(), SessionError> {
        if self.exercise.grading() != Grading::Drill {
            return Err(SessionError::NotADrill(self.exercise));
        }
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        if self.generated_content.is_none() {
            return Err(SessionError::NotReady);
        }
        if self.drill.review_mode {
            return Err(SessionError::DrillFinished);
        }
        Ok(())
    }

    fn advance(&mut self, total: usize) {
        if self.drill.current_index + 1 < total {
            self.drill.current_index += 1;
        } else {
            self.drill.review_mode = true;
            self.submitted = true;
            self.show_answers = true;
            self.phase = Phase::Graded;
        }
    }

    /// Check the typed words of the current translation sentence. A correct
    /// attempt is recorded and the drill moves on; a wrong one only reports errors.
    pub fn check_sentence(&mut self, sentences: &[DrillSentence], words: &[String]) -> Result<SentenceCheck, SessionError> {
        self.ensure_drill()?;
        let current = sentences.get(self.drill.current_index).ok_or(SessionError::NotReady)?.clone();
        let check = checker::check_sentence(&current.en, words);
        self.phase = Phase::Answering;
        if check.correct {
            let user_answer = words.iter().map(|w| w.trim()).collect::<Vec<_>>().join(" ");
            self.drill.completed.push(CompletedSentence {
                sentence: current,
                user_answer: user_answer.trim().to_string(),
                is_correct: true,
                skipped: false,
            });
            self.advance(sentences.len());
        }
        Ok(check)
    }

    pub fn skip_sentence(&mut self, sentences: &[DrillSentence], partial: &str) -> Result<(), SessionError> {
        self.ensure_drill()?;
        let current = sentences.get(self.drill.current_index).ok_or(SessionError::NotReady)?.clone();
        self.drill.completed.push(CompletedSentence {
            sentence: current,
            user_answer: partial.trim().to_string(),
            is_correct: false,
            skipped: true,
        });
        self.advance(sentences.len());
        Ok(())
    }

    /// Compare a speech transcript with the current sentence; nothing is recorded.
    pub fn compare_transcript(&mut self, sentences: &[DrillSentence], transcript: &str) -> Result<WordAlignment, SessionError> {
        self.ensure_drill()?;
        let current = sentences.get(self.drill.current_index).ok_or(SessionError::NotReady)?;
        self.phase = Phase::Answering;
        Ok(checker::align_words(&current.en, transcript))
    }

    /// Move to the next speaking sentence without recording a result.
    pub fn next_sentence(&mut self, sentences: &[DrillSentence]) -> Result<(), SessionError> {
        self.ensure_drill()?;
        if self.drill.current_index + 1 >= sentences.len() {
            return Err(SessionError::DrillFinished);
        }
        self.drill.current_index += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QuestionKind;
    use serde_json::json;

    fn ready(exercise: ExerciseType, content: Value) -> ExerciseSession {
        let mut s = ExerciseSession::new(exercise);
        s.select_topic("daily-life").unwrap();
        let t = s.begin_generate().unwrap();
        s.finish_generate(t, content).unwrap();
        s
    }

    fn tfng(id: &str, answer: &str) -> Question {
        Question {
            id: id.into(),
            prompt: "The author agrees".into(),
            correct_answer: answer.into(),
            explanation: String::new(),
            kind: QuestionKind::TrueFalseNotGiven,
        }
    }

    fn sentences() -> Vec<DrillSentence> {
        vec![
            DrillSentence { en: "I go to school.".into(), cn: "我去上学。".into(), difficulty: None },
            DrillSentence { en: "It is sunny.".into(), cn: "天气晴朗。".into(), difficulty: None },
        ]
    }

    #[test]
    fn walks_the_happy_path() {
        let mut s = ExerciseSession::new(ExerciseType::Reading1);
        assert_eq!(s.phase(), Phase::Idle);
        s.select_topic("daily-life").unwrap();
        assert_eq!(s.phase(), Phase::TopicSelected);
        let t = s.begin_generate().unwrap();
        assert_eq!(s.phase(), Phase::Generating);
        s.finish_generate(t, json!({"questions": {}})).unwrap();
        assert_eq!(s.phase(), Phase::Ready);
        s.set_answer("1", "TRUE").unwrap();
        assert_eq!(s.phase(), Phase::Answering);
        let t = s.begin_submit(&["1".to_string()]).unwrap();
        assert_eq!(s.phase(), Phase::Submitting);
        assert!(!s.submitted());
        s.finish_submit(t, None).unwrap();
        assert_eq!(s.phase(), Phase::Graded);
        assert!(s.submitted());
    }

    #[test]
    fn generate_requires_a_topic() {
        let mut s = ExerciseSession::new(ExerciseType::Reading1);
        assert_eq!(s.begin_generate(), Err(SessionError::NoTopic));
        assert_eq!(s.select_topic("  "), Err(SessionError::EmptyTopic));
    }

    #[test]
    fn failed_generate_returns_to_topic_selected_and_can_be_retried() {
        let mut s = ExerciseSession::new(ExerciseType::Reading2);
        s.select_topic("science").unwrap();
        let t = s.begin_generate().unwrap();
        s.fail_generate(t, "HTTP 502").unwrap();
        assert_eq!(s.phase(), Phase::TopicSelected);
        assert_eq!(s.last_error(), Some("HTTP 502"));
        assert_eq!(s.retry_action(), Ok(RetryAction::Generate));
    }

    #[test]
    fn stale_generate_response_is_ignored() {
        let mut s = ExerciseSession::new(ExerciseType::Reading1);
        s.select_topic("daily-life").unwrap();
        let first = s.begin_generate().unwrap();
        s.select_topic("technology").unwrap();
        let second = s.begin_generate().unwrap();

        s.finish_generate(second, json!({"passage": "new"})).unwrap();
        assert_eq!(s.finish_generate(first, json!({"passage": "old"})), Err(SessionError::Stale));
        assert_eq!(s.generated_content(), Some(&json!({"passage": "new"})));
    }

    #[test]
    fn topic_change_makes_in_flight_generate_stale() {
        let mut s = ExerciseSession::new(ExerciseType::Reading2);
        s.select_topic("health").unwrap();
        let t = s.begin_generate().unwrap();
        s.select_topic("travel").unwrap();
        assert_eq!(s.phase(), Phase::TopicSelected);
        assert!(!s.is_busy());
        assert_eq!(s.finish_generate(t, json!({"passage": "old"})), Err(SessionError::Stale));
        assert!(s.generated_content().is_none());
    }

    #[test]
    fn topic_change_drops_content_of_the_old_topic() {
        let mut s = ready(ExerciseType::Reading1, json!({"passage": "p"}));
        s.set_answer("1", "TRUE").unwrap();
        s.select_topic("daily-life").unwrap();
        assert_eq!(s.phase(), Phase::Answering);

        s.select_topic("science").unwrap();
        assert_eq!(s.phase(), Phase::TopicSelected);
        assert!(s.generated_content().is_none());
        assert!(s.answers().is_empty());
        assert!(!s.should_persist());
    }

    #[test]
    fn reset_makes_in_flight_responses_stale() {
        let mut s = ExerciseSession::new(ExerciseType::Writing1);
        s.select_topic("education").unwrap();
        let t = s.begin_generate().unwrap();
        s.reset();
        assert_eq!(s.finish_generate(t, json!({})), Err(SessionError::Stale));
        assert_eq!(s.phase(), Phase::Idle);
        assert!(s.generated_content().is_none());
    }

    #[test]
    fn submit_with_blank_answer_is_rejected_without_state_change() {
        let mut s = ready(ExerciseType::Sentence, json!({"sentence": "x"}));
        s.set_answer("A", "An answer").unwrap();
        s.set_answer("B", "   ").unwrap();
        let err = s.begin_submit(&["A".to_string(), "B".to_string()]).unwrap_err();
        assert_eq!(err, SessionError::MissingAnswers(vec!["B".to_string()]));
        assert_eq!(s.phase(), Phase::Answering);
        assert!(!s.is_busy());
        assert!(s.last_error().unwrap().contains("missing B"));
    }

    #[test]
    fn failed_submit_keeps_answers() {
        let mut s = ready(ExerciseType::Writing2, json!({"prompt": "x"}));
        s.set_answer("text", "essay").unwrap();
        let t = s.begin_submit(&["text".to_string()]).unwrap();
        s.fail_submit(t, "timeout").unwrap();
        assert_eq!(s.phase(), Phase::Answering);
        assert_eq!(s.answers().get("text").map(String::as_str), Some("essay"));
        assert_eq!(s.retry_action(), Ok(RetryAction::Submit));
    }

    #[test]
    fn answers_are_read_only_after_grading() {
        let mut s = ready(ExerciseType::Reading1, json!({}));
        s.set_answer("1", "TRUE").unwrap();
        let t = s.begin_submit(&[]).unwrap();
        s.finish_submit(t, None).unwrap();
        assert_eq!(s.set_answer("1", "FALSE"), Err(SessionError::AlreadySubmitted));
        assert_eq!(s.begin_submit(&[]), Err(SessionError::AlreadySubmitted));
    }

    #[test]
    fn answers_are_locked_while_submitting() {
        let mut s = ready(ExerciseType::Writing1, json!({}));
        s.set_answer("text", "essay").unwrap();
        let _t = s.begin_submit(&["text".to_string()]).unwrap();
        assert_eq!(s.set_answer("text", "other"), Err(SessionError::Busy));
        assert_eq!(s.select_topic("x"), Err(SessionError::Busy));
    }

    #[test]
    fn tfng_correct_answer_is_revealed_only_when_toggled() {
        let q = tfng("1", "TRUE");
        let mut s = ready(ExerciseType::Reading1, json!({}));
        s.set_answer("1", "FALSE").unwrap();
        assert_eq!(s.is_correct(&q), None);
        assert_eq!(s.score(&[q.clone()]), None);

        let t = s.begin_submit(&["1".to_string()]).unwrap();
        s.finish_submit(t, None).unwrap();
        assert_eq!(s.is_correct(&q), Some(false));

        s.set_show_answers(false);
        assert_eq!(s.revealed_answer(&q), None);
        s.set_show_answers(true);
        assert_eq!(s.revealed_answer(&q), Some("TRUE"));
        assert_eq!(s.score(&[q]), Some(Score { correct: 0, total: 1 }));
    }

    #[test]
    fn snapshot_round_trips_through_restore() {
        let mut s = ready(ExerciseType::Reading1, json!({"passage": "p"}));
        s.set_answer("1", "TRUE").unwrap();
        let snap = s.snapshot();
        let restored = ExerciseSession::restore(ExerciseType::Reading1, snap.clone());
        assert_eq!(restored.snapshot(), snap);
        assert_eq!(restored.phase(), Phase::Answering);
        assert_eq!(restored.selected_topic(), Some("daily-life"));
    }

    #[test]
    fn sentence_upgrade_skips_generation() {
        let mut s = ExerciseSession::new(ExerciseType::SentenceUpgrade);
        assert_eq!(
            s.begin_generate(),
            Err(SessionError::NothingToGenerate(ExerciseType::SentenceUpgrade))
        );
        s.set_answer("text", "I like it.").unwrap();
        assert!(s.should_persist());
        let t = s.begin_submit(&["text".to_string()]).unwrap();
        s.finish_submit(t, Some(json!({"band6": "..."}))).unwrap();
        assert_eq!(s.phase(), Phase::Graded);
    }

    #[test]
    fn translation_drill_advances_on_correct_attempt_and_enters_review() {
        let list = sentences();
        let mut s = ready(ExerciseType::SentenceTranslation, serde_json::to_value(&list).unwrap());

        let words: Vec<String> = ["I ", "go ", "to ", "school "].iter().map(|w| w.to_string()).collect();
        let check = s.check_sentence(&list, &words).unwrap();
        assert!(check.correct);
        assert_eq!(s.drill().current_index, 1);
        assert_eq!(s.drill().completed[0].user_answer, "I go to school");

        let wrong: Vec<String> = ["It", "is", "rainy"].iter().map(|w| w.to_string()).collect();
        assert!(!s.check_sentence(&list, &wrong).unwrap().correct);
        assert_eq!(s.drill().current_index, 1);

        s.skip_sentence(&list, "It is").unwrap();
        assert!(s.drill().review_mode);
        assert_eq!(s.phase(), Phase::Graded);
        assert_eq!(
            s.drill().summary(),
            DrillSummary { correct: 1, skipped: 1, total: 2, accuracy: 50 }
        );
        assert_eq!(s.skip_sentence(&list, ""), Err(SessionError::DrillFinished));
    }

    #[test]
    fn drill_operations_reject_other_exercises() {
        let mut s = ready(ExerciseType::Reading1, json!({}));
        assert_eq!(
            s.compare_transcript(&sentences(), "hi"),
            Err(SessionError::NotADrill(ExerciseType::Reading1))
        );

        let mut drill = ready(ExerciseType::Speaking, serde_json::to_value(sentences()).unwrap());
        assert_eq!(
            drill.begin_submit(&[]),
            Err(SessionError::NotSubmittable(ExerciseType::Speaking))
        );
    }

    #[test]
    fn speaking_compares_transcripts_and_moves_on() {
        let list = sentences();
        let mut s = ready(ExerciseType::Speaking, serde_json::to_value(&list).unwrap());
        let a = s.compare_transcript(&list, "i go to the school").unwrap();
        assert_eq!(a.matched, 3);
        assert_eq!(a.accuracy, 75);
        s.next_sentence(&list).unwrap();
        assert_eq!(s.drill().current_index, 1);
        assert_eq!(s.next_sentence(&list), Err(SessionError::DrillFinished));
    }
}
