//! Domain models: exercise types, request subtypes, questions and scores.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every exercise the practice service knows how to run.
/// The wire name (`as_str`) is what the upstream task API expects in `type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
  Writing1,
  Writing2,
  Reading1,
  Reading2,
  Reading3,
  Speaking,
  SentenceTranslation,
  Synonym,
  SentenceUpgrade,
  Sentence,
  Paragraph,
  Summary,
}

/// How answers for an exercise are graded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grading {
  /// Checked here against the answers shipped with the generated content.
  Local,
  /// Sent to the upstream `correction` endpoint.
  Remote,
  /// Sentence-by-sentence word alignment (translation and speaking drills).
  Drill,
}

impl ExerciseType {
  pub const ALL: [ExerciseType; 12] = [
    ExerciseType::Writing1,
    ExerciseType::Writing2,
    ExerciseType::Reading1,
    ExerciseType::Reading2,
    ExerciseType::Reading3,
    ExerciseType::Speaking,
    ExerciseType::SentenceTranslation,
    ExerciseType::Synonym,
    ExerciseType::SentenceUpgrade,
    ExerciseType::Sentence,
    ExerciseType::Paragraph,
    ExerciseType::Summary,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      ExerciseType::Writing1 => "writing1",
      ExerciseType::Writing2 => "writing2",
      ExerciseType::Reading1 => "reading1",
      ExerciseType::Reading2 => "reading2",
      ExerciseType::Reading3 => "reading3",
      ExerciseType::Speaking => "speaking",
      ExerciseType::SentenceTranslation => "sentence_translation",
      ExerciseType::Synonym => "synonym",
      ExerciseType::SentenceUpgrade => "sentence_upgrade",
      ExerciseType::Sentence => "sentence",
      ExerciseType::Paragraph => "paragraph",
      ExerciseType::Summary => "summary",
    }
  }

  /// Fixed cache key holding this exercise's in-progress session.
  pub fn storage_key(self) -> &'static str {
    match self {
      ExerciseType::Writing1 => "ieltsWriting1Task",
      ExerciseType::Writing2 => "ieltsWriting2Task",
      ExerciseType::Reading1 => "ieltsReading1Task",
      ExerciseType::Reading2 => "ieltsReading2Task",
      ExerciseType::Reading3 => "ieltsReading3Task",
      ExerciseType::Speaking => "speakingPracticeTask",
      ExerciseType::SentenceTranslation => "translationPracticeTask",
      ExerciseType::Synonym => "synonymTask",
      ExerciseType::SentenceUpgrade => "sentenceUpgradeTask",
      ExerciseType::Sentence => "sentenceVariationTask",
      ExerciseType::Paragraph => "paragraphVariationTask",
      ExerciseType::Summary => "summaryVariationTask",
    }
  }

  pub fn grading(self) -> Grading {
    match self {
      ExerciseType::Reading1 | ExerciseType::Reading2 | ExerciseType::Reading3 => Grading::Local,
      ExerciseType::Speaking | ExerciseType::SentenceTranslation => Grading::Drill,
      _ => Grading::Remote,
    }
  }

  /// `sentence_upgrade` works on a sentence the user types in; nothing is generated.
  pub fn requires_generation(self) -> bool {
    !matches!(self, ExerciseType::SentenceUpgrade)
  }

  /// Writing tasks take a chart / essay type alongside the topic.
  pub fn accepts_question_type(self) -> bool {
    matches!(self, ExerciseType::Writing1 | ExerciseType::Writing2)
  }
}

impl fmt::Display for ExerciseType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown exercise type '{0}'")]
pub struct UnknownExercise(pub String);

impl FromStr for ExerciseType {
  type Err = UnknownExercise;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ExerciseType::ALL
      .into_iter()
      .find(|t| t.as_str() == s)
      .ok_or_else(|| UnknownExercise(s.to_string()))
  }
}

/// Marks whether an upstream request generates (`start`) or grades (`correction`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Subtype {
  Start,
  Correction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
  FillBlank,
  TrueFalseNotGiven,
  Matching,
  MultipleChoice,
}

/// A gradable question extracted from generated content. Immutable once generated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
  pub id: String,
  pub prompt: String,
  pub correct_answer: String,
  #[serde(default)] pub explanation: String,
  pub kind: QuestionKind,
}

/// Derived score; never stored on its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Score {
  pub correct: usize,
  pub total: usize,
}

impl Score {
  /// Rounded percentage; 0 when there is nothing to score.
  pub fn accuracy(&self) -> u32 {
    percent(self.correct, self.total)
  }
}

pub(crate) fn percent(part: usize, total: usize) -> u32 {
  if total == 0 {
    return 0;
  }
  ((part as f64 / total as f64) * 100.0).round() as u32
}

/// One sentence pair of a translation or speaking drill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrillSentence {
  pub en: String,
  #[serde(default)] pub cn: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub difficulty: Option<serde_json::Value>,
}
