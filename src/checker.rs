//! Answer checking: normalization, per-question grading, word alignment and scores.
//!
//! Everything here is pure. Grading functions return `None` ("undetermined")
//! until the caller says the answers were submitted.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::domain::{percent, Question, QuestionKind, Score};

/// Punctuation removed by the loose normalizer (ASCII and full-width forms).
const PUNCTUATION: &[char] = &[
  '.', ',', '!', '?', ';', ':', '\'', '"', '。', '，', '！', '？', '；', '：', '“', '”', '‘', '’',
];

/// Lowercase and trim surrounding whitespace.
pub fn normalize(s: &str) -> String {
  s.trim().to_lowercase()
}

/// `normalize` plus punctuation stripping.
pub fn normalize_loose(s: &str) -> String {
  s.to_lowercase()
    .chars()
    .filter(|c| !PUNCTUATION.contains(c))
    .collect::<String>()
    .trim()
    .to_string()
}

/// Case-sensitive symbol compare (multiple choice, TFNG, matching).
pub fn exact_match(user: &str, correct: &str) -> bool {
  !user.is_empty() && user == correct
}

/// Case- and surrounding-whitespace-insensitive compare (fill in the blank).
pub fn normalized_match(user: &str, correct: &str) -> bool {
  let user = normalize(user);
  !user.is_empty() && user == normalize(correct)
}

/// Grade one question. `None` until the session is submitted.
pub fn check_question(question: &Question, answer: Option<&str>, submitted: bool) -> Option<bool> {
  if !submitted {
    return None;
  }
  let answer = answer.unwrap_or("");
  let ok = match question.kind {
    QuestionKind::FillBlank => normalized_match(answer, &question.correct_answer),
    QuestionKind::TrueFalseNotGiven | QuestionKind::Matching | QuestionKind::MultipleChoice => {
      exact_match(answer, &question.correct_answer)
    }
  };
  Some(ok)
}

/// Tally correct answers over a question set. `None` until submitted.
pub fn score(questions: &[Question], answers: &BTreeMap<String, String>, submitted: bool) -> Option<Score> {
  if !submitted {
    return None;
  }
  let correct = questions
    .iter()
    .filter(|q| check_question(q, answers.get(&q.id).map(String::as_str), true) == Some(true))
    .count();
  Some(Score { correct, total: questions.len() })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WordMatch {
  pub target: String,
  pub user: String,
  pub matched: bool,
}

/// Position-by-position comparison of a target sentence and a user attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WordAlignment {
  pub words: Vec<WordMatch>,
  pub matched: usize,
  pub total: usize,
  pub accuracy: u32,
}

fn tokens(s: &str) -> Vec<String> {
  s.split_whitespace()
    .map(normalize_loose)
    .filter(|w| !w.is_empty())
    .collect()
}

/// Align `user` against `target` word by word. A word counts only when both
/// text and position agree; user words past the end of the target are ignored
/// and target words past the end of the user input are unmatched.
pub fn align_words(target: &str, user: &str) -> WordAlignment {
  let target_words = tokens(target);
  let user_words = tokens(user);

  let words: Vec<WordMatch> = target_words
    .iter()
    .enumerate()
    .map(|(i, t)| {
      let u = user_words.get(i).cloned().unwrap_or_default();
      WordMatch { matched: !u.is_empty() && *t == u, target: t.clone(), user: u }
    })
    .collect();

  let matched = words.iter().filter(|w| w.matched).count();
  let total = words.len();
  WordAlignment { words, matched, total, accuracy: percent(matched, total) }
}

/// Result of checking one translation-drill attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SentenceCheck {
  pub correct: bool,
  /// One flag per target word (split on single spaces); `true` marks a wrong slot.
  pub errors: Vec<bool>,
  pub alignment: WordAlignment,
}

/// Check a drill attempt typed into one box per target word.
pub fn check_sentence(target: &str, user_words: &[String]) -> SentenceCheck {
  let joined = user_words
    .iter()
    .map(|w| w.trim())
    .collect::<Vec<_>>()
    .join(" ");
  let joined = joined.trim();

  let expected = normalize_loose(target);
  let correct = !expected.is_empty() && normalize_loose(joined) == expected;

  let errors = target
    .split_whitespace()
    .enumerate()
    .map(|(i, word)| {
      let typed = user_words.get(i).map(String::as_str).unwrap_or("");
      normalize_loose(typed) != normalize_loose(word)
    })
    .collect();

  SentenceCheck { correct, errors, alignment: align_words(target, joined) }
}

/// Upstream flags may arrive as booleans or as strings like `"True"`.
pub fn is_true_flag(v: &Value) -> bool {
  match v {
    Value::Bool(b) => *b,
    Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
    other => other.to_string().trim().eq_ignore_ascii_case("true"),
  }
}

/// Per-item correctness from remote feedback shaped as `{details: {id: {flag}}}`.
pub fn feedback_flags(feedback: &Value) -> Option<BTreeMap<String, bool>> {
  let details = feedback.get("details")?.as_object()?;
  Some(
    details
      .iter()
      .map(|(id, entry)| (id.clone(), entry.get("flag").map(is_true_flag).unwrap_or(false)))
      .collect(),
  )
}

/// Score computed from remote feedback flags, when the feedback carries them.
pub fn feedback_score(feedback: &Value) -> Option<Score> {
  let flags = feedback_flags(feedback)?;
  Some(Score { correct: flags.values().filter(|f| **f).count(), total: flags.len() })
}
