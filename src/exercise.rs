//! Exercise orchestrator: one session per exercise type, driven through the
//! task service and mirrored into the task cache.
//!
//! Each session sits behind its own mutex. The lock is dropped while an
//! upstream call is in flight and re-taken to apply the response, which the
//! session accepts only if its ticket is still the pending one.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::cache::TaskCache;
use crate::checker::{SentenceCheck, WordAlignment};
use crate::domain::{ExerciseType, Grading};
use crate::error::{ExerciseError, SessionError, TaskError};
use crate::questions;
use crate::session::{CachedSession, ExerciseSession, RetryAction};
use crate::task_service::{StartParams, SubmitParams, TaskService};

/// Per-request knobs of a generate call. Remembered for `retry`.
#[derive(Clone, Debug, Default)]
pub struct GenerateOptions {
  pub language: Option<String>,
  pub subdomain: Option<String>,
}

struct Slot {
  session: ExerciseSession,
  generate: GenerateOptions,
}

pub struct Exercises {
  tasks: TaskService,
  cache: TaskCache,
  language: String,
  slots: HashMap<ExerciseType, Arc<Mutex<Slot>>>,
}

impl Exercises {
  pub fn new(tasks: TaskService, cache: TaskCache, language: impl Into<String>) -> Self {
    let slots = ExerciseType::ALL
      .into_iter()
      .map(|t| {
        let slot = Slot { session: ExerciseSession::new(t), generate: GenerateOptions::default() };
        (t, Arc::new(Mutex::new(slot)))
      })
      .collect();
    Self { tasks, cache, language: language.into(), slots }
  }

  pub fn tasks(&self) -> &TaskService {
    &self.tasks
  }

  pub fn language(&self) -> &str {
    &self.language
  }

  fn slot(&self, exercise: ExerciseType) -> Arc<Mutex<Slot>> {
    // every type is inserted in `new`
    Arc::clone(&self.slots[&exercise])
  }

  async fn persist(&self, session: &ExerciseSession) {
    if session.should_persist() {
      self.cache.save_guarded(session.exercise().storage_key(), &session.snapshot()).await;
    }
  }

  /// Load every cached session. Missing or corrupt entries leave a fresh session.
  #[instrument(level = "info", skip(self))]
  pub async fn restore_all(&self) -> usize {
    let mut restored = 0;
    for exercise in ExerciseType::ALL {
      let Some(snap) = self.cache.load::<CachedSession>(exercise.storage_key()).await else {
        continue;
      };
      let slot = self.slot(exercise);
      let mut slot = slot.lock().await;
      slot.session = ExerciseSession::restore(exercise, snap);
      debug!(target: "exercise", %exercise, phase = ?slot.session.phase(), "Restored cached session");
      restored += 1;
    }
    info!(target: "exercise", restored, "Cached sessions restored");
    restored
  }

  /// Current state of one exercise.
  pub async fn view(&self, exercise: ExerciseType) -> ExerciseSession {
    self.slot(exercise).lock().await.session.clone()
  }

  #[instrument(level = "info", skip(self))]
  pub async fn select_topic(
    &self,
    exercise: ExerciseType,
    topic: &str,
    question_type: Option<String>,
  ) -> Result<ExerciseSession, ExerciseError> {
    let slot = self.slot(exercise);
    let mut slot = slot.lock().await;
    slot.session.select_topic(topic)?;
    if exercise.accepts_question_type() {
      slot.session.set_question_type(question_type);
    }
    if slot.session.should_persist() {
      self.persist(&slot.session).await;
    } else {
      self.cache.clear_guarded(exercise.storage_key()).await;
    }
    Ok(slot.session.clone())
  }

  /// Generate new content for the selected topic, discarding the previous exercise.
  #[instrument(level = "info", skip(self, opts))]
  pub async fn generate(&self, exercise: ExerciseType, opts: GenerateOptions) -> Result<ExerciseSession, ExerciseError> {
    let slot = self.slot(exercise);
    let (ticket, params) = {
      let mut guard = slot.lock().await;
      let ticket = guard.session.begin_generate()?;
      let params = StartParams {
        exercise,
        language: opts.language.clone().unwrap_or_else(|| self.language.clone()),
        topic: guard.session.selected_topic().unwrap_or_default().to_string(),
        subdomain: opts.subdomain.clone(),
        question_type: guard.session.question_type().map(str::to_string),
      };
      guard.generate = opts;
      self.cache.clear_guarded(exercise.storage_key()).await;
      (ticket, params)
    };

    let result = self.tasks.start(&params).await;

    let mut guard = slot.lock().await;
    let content = match result {
      Ok(content) => content,
      Err(e) => {
        warn_if_stale(exercise, guard.session.fail_generate(ticket, e.to_string()))?;
        return Err(e.into());
      }
    };

    if let Err(e) = validate_content(exercise, &content) {
      warn_if_stale(exercise, guard.session.fail_generate(ticket, e.to_string()))?;
      return Err(e);
    }

    warn_if_stale(exercise, guard.session.finish_generate(ticket, content))?;
    info!(target: "exercise", %exercise, seq = ticket.seq, "Exercise ready");
    self.persist(&guard.session).await;
    Ok(guard.session.clone())
  }

  /// Merge answers into the session.
  #[instrument(level = "debug", skip(self, answers), fields(count = answers.len()))]
  pub async fn set_answers(
    &self,
    exercise: ExerciseType,
    answers: BTreeMap<String, String>,
  ) -> Result<ExerciseSession, ExerciseError> {
    let slot = self.slot(exercise);
    let mut slot = slot.lock().await;
    slot.session.set_answers(answers)?;
    self.persist(&slot.session).await;
    Ok(slot.session.clone())
  }

  /// Grade the answers: locally for reading, upstream for everything else.
  #[instrument(level = "info", skip(self))]
  pub async fn submit(&self, exercise: ExerciseType) -> Result<ExerciseSession, ExerciseError> {
    let slot = self.slot(exercise);
    let (ticket, params) = {
      let mut guard = slot.lock().await;
      let Slot { session, generate } = &mut *guard;
      let required = questions::required_answer_ids(exercise, session.generated_content(), session.answers())?;
      let ticket = session.begin_submit(&required)?;

      if exercise.grading() == Grading::Local {
        session.finish_submit(ticket, None)?;
        let graded = session
          .generated_content()
          .and_then(|c| questions::extract_questions(exercise, c).ok())
          .unwrap_or_default();
        if let Some(score) = session.score(&graded) {
          info!(target: "exercise", %exercise, correct = score.correct, total = score.total, "Graded locally");
        }
        self.persist(session).await;
        return Ok(session.clone());
      }

      let article = match questions::original_article(exercise, session.generated_content()) {
        Ok(a) => a,
        Err(e) => {
          session.fail_submit(ticket, e.to_string())?;
          return Err(e.into());
        }
      };
      let params = SubmitParams {
        exercise,
        language: generate.language.clone().unwrap_or_else(|| self.language.clone()),
        original_article: article,
        answers: session.answers().clone(),
        question_type: session.question_type().map(str::to_string),
      };
      (ticket, params)
    };

    let result = self.tasks.submit(&params).await;

    let mut guard = slot.lock().await;
    match result {
      Ok(feedback) => {
        warn_if_stale(exercise, guard.session.finish_submit(ticket, Some(feedback)))?;
        info!(target: "exercise", %exercise, "Feedback received");
        self.persist(&guard.session).await;
        Ok(guard.session.clone())
      }
      Err(e) => {
        warn_if_stale(exercise, guard.session.fail_submit(ticket, e.to_string()))?;
        Err(e.into())
      }
    }
  }

  /// Re-issue whichever of generate or submit failed last.
  #[instrument(level = "info", skip(self))]
  pub async fn retry(&self, exercise: ExerciseType) -> Result<ExerciseSession, ExerciseError> {
    let (action, opts) = {
      let slot = self.slot(exercise);
      let guard = slot.lock().await;
      (guard.session.retry_action()?, guard.generate.clone())
    };
    info!(target: "exercise", %exercise, ?action, "Retrying failed action");
    match action {
      RetryAction::Generate => self.generate(exercise, opts).await,
      RetryAction::Submit => self.submit(exercise).await,
    }
  }

  /// Back to idle; the cache entry is removed.
  #[instrument(level = "info", skip(self))]
  pub async fn reset(&self, exercise: ExerciseType) -> ExerciseSession {
    let slot = self.slot(exercise);
    let mut guard = slot.lock().await;
    guard.session.reset();
    guard.generate = GenerateOptions::default();
    self.cache.clear_guarded(exercise.storage_key()).await;
    guard.session.clone()
  }

  pub async fn set_show_answers(&self, exercise: ExerciseType, show: bool) -> ExerciseSession {
    let slot = self.slot(exercise);
    let mut guard = slot.lock().await;
    guard.session.set_show_answers(show);
    guard.session.clone()
  }

  #[instrument(level = "debug", skip(self, words), fields(words = words.len()))]
  pub async fn check_sentence(
    &self,
    exercise: ExerciseType,
    words: &[String],
  ) -> Result<(SentenceCheck, ExerciseSession), ExerciseError> {
    let slot = self.slot(exercise);
    let mut guard = slot.lock().await;
    let sentences = drill_of(&guard.session)?;
    let check = guard.session.check_sentence(&sentences, words)?;
    self.persist(&guard.session).await;
    Ok((check, guard.session.clone()))
  }

  #[instrument(level = "debug", skip(self, partial))]
  pub async fn skip_sentence(&self, exercise: ExerciseType, partial: &str) -> Result<ExerciseSession, ExerciseError> {
    let slot = self.slot(exercise);
    let mut guard = slot.lock().await;
    let sentences = drill_of(&guard.session)?;
    guard.session.skip_sentence(&sentences, partial)?;
    self.persist(&guard.session).await;
    Ok(guard.session.clone())
  }

  #[instrument(level = "debug", skip(self, transcript), fields(transcript_len = transcript.len()))]
  pub async fn compare_transcript(
    &self,
    exercise: ExerciseType,
    transcript: &str,
  ) -> Result<(WordAlignment, ExerciseSession), ExerciseError> {
    let slot = self.slot(exercise);
    let mut guard = slot.lock().await;
    let sentences = drill_of(&guard.session)?;
    let alignment = guard.session.compare_transcript(&sentences, transcript)?;
    Ok((alignment, guard.session.clone()))
  }

  #[instrument(level = "debug", skip(self))]
  pub async fn next_sentence(&self, exercise: ExerciseType) -> Result<ExerciseSession, ExerciseError> {
    let slot = self.slot(exercise);
    let mut guard = slot.lock().await;
    let sentences = drill_of(&guard.session)?;
    guard.session.next_sentence(&sentences)?;
    self.persist(&guard.session).await;
    Ok(guard.session.clone())
  }

  /// Fetch a stored task document upstream on behalf of the caller.
  pub async fn task_detail(&self, task_id: &str, token: &str) -> Result<serde_json::Value, TaskError> {
    self.tasks.get_task_data_detail(task_id, token).await
  }
}

/// A stale response is dropped: logged, reported, state untouched.
fn warn_if_stale(exercise: ExerciseType, r: Result<(), SessionError>) -> Result<(), SessionError> {
  if let Err(SessionError::Stale) = &r {
    warn!(target: "exercise", %exercise, "Discarding response of a superseded request");
  }
  r
}

/// Reject generated content the session could not work with.
fn validate_content(exercise: ExerciseType, content: &serde_json::Value) -> Result<(), ExerciseError> {
  match exercise.grading() {
    Grading::Local => {
      questions::extract_questions(exercise, content)?;
    }
    Grading::Drill => {
      questions::drill_sentences(exercise, content)?;
    }
    Grading::Remote => {}
  }
  Ok(())
}

fn drill_of(session: &ExerciseSession) -> Result<Vec<crate::domain::DrillSentence>, ExerciseError> {
  if session.exercise().grading() != Grading::Drill {
    return Err(SessionError::NotADrill(session.exercise()).into());
  }
  let content = session.generated_content().ok_or(SessionError::NotReady)?;
  Ok(questions::drill_sentences(session.exercise(), content)?)
}
