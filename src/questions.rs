//! Typed views over generated content.
//!
//! Upstream payloads stay opaque JSON inside a session; these helpers decode
//! the parts the service needs to grade or validate (question lists, marker
//! ids, the article sent back for correction).

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::domain::{DrillSentence, ExerciseType, Question, QuestionKind};
use crate::error::ContentError;
use crate::util::replace_ignore_ascii_case;

/// Ids arrive as numbers or strings depending on the generator.
fn id_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
  let v = Value::deserialize(d)?;
  Ok(match v {
    Value::String(s) => s,
    other => other.to_string(),
  })
}

#[derive(Deserialize)]
struct FillBlank {
  #[serde(deserialize_with = "id_string")] id: String,
  #[serde(default)] question: String,
  answer: String,
  #[serde(default)] explanation: String,
}

#[derive(Deserialize)]
struct Statement {
  #[serde(deserialize_with = "id_string")] id: String,
  #[serde(default)] statement: String,
  #[serde(alias = "correct_answer")] answer: String,
  #[serde(default)] explanation: String,
}

#[derive(Deserialize)]
struct Choice {
  #[serde(deserialize_with = "id_string")] id: String,
  #[serde(default)] question: String,
  correct_answer: String,
  #[serde(default)] explanation: String,
}

#[derive(Deserialize, Default)]
struct Reading1Questions {
  #[serde(default)] fill_in_the_blanks: Vec<FillBlank>,
  #[serde(default)] true_false_not_given: Vec<Statement>,
}

#[derive(Deserialize, Default)]
struct Reading2Questions {
  #[serde(default)] matching_information: Vec<Statement>,
}

#[derive(Deserialize)]
struct Passage<Q> {
  questions: Q,
}

#[derive(Deserialize, Default)]
struct McqBlock {
  #[serde(default)] questions: Vec<Choice>,
}

#[derive(Deserialize)]
struct Reading3 {
  #[serde(default)] mcq: McqBlock,
  #[serde(default)] true_false_not_given: Vec<Statement>,
}

#[derive(Deserialize)]
struct SynonymArticle {
  #[serde(default)] article: String,
  #[serde(default)] markers: BTreeMap<String, String>,
}

fn decode<T: for<'de> Deserialize<'de>>(exercise: ExerciseType, content: &Value) -> Result<T, ContentError> {
  T::deserialize(content).map_err(|source| ContentError { exercise, source })
}

/// Questions graded locally. Empty for exercises graded elsewhere.
pub fn extract_questions(exercise: ExerciseType, content: &Value) -> Result<Vec<Question>, ContentError> {
  let questions = match exercise {
    ExerciseType::Reading1 => {
      let p: Passage<Reading1Questions> = decode(exercise, content)?;
      let fill = p.questions.fill_in_the_blanks.into_iter().map(|q| Question {
        id: q.id,
        prompt: q.question.replace("[]", "_____"),
        correct_answer: q.answer,
        explanation: q.explanation,
        kind: QuestionKind::FillBlank,
      });
      let tfng = p.questions.true_false_not_given.into_iter().map(|q| Question {
        id: q.id,
        prompt: q.statement,
        correct_answer: q.answer,
        explanation: q.explanation,
        kind: QuestionKind::TrueFalseNotGiven,
      });
      fill.chain(tfng).collect()
    }
    ExerciseType::Reading2 => {
      let p: Passage<Reading2Questions> = decode(exercise, content)?;
      p.questions
        .matching_information
        .into_iter()
        .map(|q| Question {
          id: q.id,
          prompt: q.statement,
          correct_answer: q.answer,
          explanation: q.explanation,
          kind: QuestionKind::Matching,
        })
        .collect()
    }
    ExerciseType::Reading3 => {
      let r: Reading3 = decode(exercise, content)?;
      // Both blocks number from 1, so ids are namespaced.
      let mcq = r.mcq.questions.into_iter().map(|q| Question {
        id: format!("mcq-{}", q.id),
        prompt: q.question,
        correct_answer: q.correct_answer,
        explanation: q.explanation,
        kind: QuestionKind::MultipleChoice,
      });
      let tfng = r.true_false_not_given.into_iter().map(|q| Question {
        id: format!("tfng-{}", q.id),
        prompt: q.statement,
        correct_answer: q.answer,
        explanation: q.explanation,
        kind: QuestionKind::TrueFalseNotGiven,
      });
      mcq.chain(tfng).collect()
    }
    _ => Vec::new(),
  };
  Ok(questions)
}

/// Sentences of a translation or speaking drill.
pub fn drill_sentences(exercise: ExerciseType, content: &Value) -> Result<Vec<DrillSentence>, ContentError> {
  decode(exercise, content)
}

/// Ids that must be non-blank before a submit is sent.
pub fn required_answer_ids(
  exercise: ExerciseType,
  content: Option<&Value>,
  answers: &BTreeMap<String, String>,
) -> Result<Vec<String>, ContentError> {
  let ids = match exercise {
    ExerciseType::Reading1 | ExerciseType::Reading2 | ExerciseType::Reading3 => match content {
      Some(c) => extract_questions(exercise, c)?.into_iter().map(|q| q.id).collect(),
      None => Vec::new(),
    },
    ExerciseType::Synonym => match content {
      Some(c) => {
        let a: SynonymArticle = decode(exercise, c)?;
        a.markers.keys().map(|k| k.to_uppercase()).collect()
      }
      None => Vec::new(),
    },
    ExerciseType::Writing1 | ExerciseType::Writing2 | ExerciseType::SentenceUpgrade => vec!["text".to_string()],
    ExerciseType::Sentence | ExerciseType::Paragraph | ExerciseType::Summary => {
      let mut ids: Vec<String> = answers.keys().cloned().collect();
      if !ids.iter().any(|k| k == "A") {
        ids.insert(0, "A".to_string());
      }
      ids
    }
    ExerciseType::Speaking | ExerciseType::SentenceTranslation => Vec::new(),
  };
  Ok(ids)
}

/// The text sent back as `original_article` when asking upstream to grade.
pub fn original_article(exercise: ExerciseType, content: Option<&Value>) -> Result<Option<String>, ContentError> {
  let Some(content) = content else {
    return Ok(None);
  };
  let field = |name: &str| content.get(name).and_then(Value::as_str).map(str::to_string);
  let article = match exercise {
    ExerciseType::Writing1 | ExerciseType::Writing2 => {
      Some(serde_json::to_string(content).map_err(|source| ContentError { exercise, source })?)
    }
    ExerciseType::Sentence => field("sentence"),
    ExerciseType::Paragraph => field("paragraph"),
    ExerciseType::Summary => field("article"),
    ExerciseType::Synonym => {
      let a: SynonymArticle = decode(exercise, content)?;
      let mut text = a.article;
      for (key, word) in &a.markers {
        let upper = key.to_uppercase();
        text = replace_ignore_ascii_case(&text, &format!("[{}]", key), &format!("({}){}", upper, word));
      }
      Some(text)
    }
    _ => None,
  };
  Ok(article)
}

/// Fields of locally graded content that give the answers away.
const ANSWER_KEYS: [&str; 3] = ["answer", "correct_answer", "explanation"];

/// Copy of `content` with answer keys removed at every depth.
pub fn redact_answers(content: &Value) -> Value {
  match content {
    Value::Object(map) => Value::Object(
      map
        .iter()
        .filter(|(k, _)| !ANSWER_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), redact_answers(v)))
        .collect(),
    ),
    Value::Array(items) => Value::Array(items.iter().map(redact_answers).collect()),
    other => other.clone(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn reading1_yields_fill_and_tfng_questions() {
    let content = json!({
      "passage": "...",
      "passage_title": "Bees",
      "questions": {
        "fill_in_the_blanks": [{"id": 1, "question": "Bees make []", "answer": "honey", "explanation": "para 2"}],
        "true_false_not_given": [{"id": "2", "statement": "Bees sleep", "answer": "NOT GIVEN"}]
      }
    });
    let qs = extract_questions(ExerciseType::Reading1, &content).unwrap();
    assert_eq!(qs.len(), 2);
    assert_eq!(qs[0].id, "1");
    assert_eq!(qs[0].prompt, "Bees make _____");
    assert_eq!(qs[0].kind, QuestionKind::FillBlank);
    assert_eq!(qs[1].id, "2");
    assert_eq!(qs[1].correct_answer, "NOT GIVEN");
  }

  #[test]
  fn reading3_namespaces_ids() {
    let content = json!({
      "mcq": {"questions": [{"id": 1, "question": "Q?", "options": {"A": "x"}, "correct_answer": "A"}]},
      "true_false_not_given": [{"id": 1, "statement": "S", "correct_answer": "TRUE"}]
    });
    let ids: Vec<_> = extract_questions(ExerciseType::Reading3, &content)
      .unwrap()
      .into_iter()
      .map(|q| q.id)
      .collect();
    assert_eq!(ids, vec!["mcq-1", "tfng-1"]);
  }

  #[test]
  fn malformed_content_is_a_content_error() {
    let err = extract_questions(ExerciseType::Reading2, &json!({"passage": "x"})).unwrap_err();
    assert_eq!(err.exercise, ExerciseType::Reading2);
  }

  #[test]
  fn synonym_markers_become_required_ids_and_article() {
    let content = json!({"article": "A [a] plan and a [b] idea.", "markers": {"a": "big", "b": "new"}});
    let ids = required_answer_ids(ExerciseType::Synonym, Some(&content), &BTreeMap::new()).unwrap();
    assert_eq!(ids, vec!["A", "B"]);
    let article = original_article(ExerciseType::Synonym, Some(&content)).unwrap();
    assert_eq!(article.as_deref(), Some("A (A)big plan and a (B)new idea."));
  }

  #[test]
  fn variation_exercises_require_answer_a_plus_extras() {
    let answers: BTreeMap<String, String> = [("B".to_string(), "x".to_string())].into();
    let ids = required_answer_ids(ExerciseType::Sentence, None, &answers).unwrap();
    assert_eq!(ids, vec!["A", "B"]);
  }

  #[test]
  fn drill_sentences_decode_pairs() {
    let content = json!([{"en": "I go to school.", "cn": "我去上学。", "difficulty": 1}]);
    let s = drill_sentences(ExerciseType::SentenceTranslation, &content).unwrap();
    assert_eq!(s[0].en, "I go to school.");
    assert_eq!(s[0].cn, "我去上学。");
  }

  #[test]
  fn redaction_strips_answers_but_keeps_the_passage() {
    let content = json!({
      "passage": "Bees make honey.",
      "questions": {
        "fill_in_the_blanks": [{"id": 1, "question": "Bees make []", "answer": "honey", "explanation": "line 1"}],
        "true_false_not_given": [{"id": 2, "statement": "Bees sleep", "answer": "NOT GIVEN"}]
      },
      "mcq": {"questions": [{"id": 1, "options": {"A": "x"}, "correct_answer": "A"}]}
    });
    let r = redact_answers(&content);
    assert_eq!(r["passage"], "Bees make honey.");
    assert_eq!(r["questions"]["fill_in_the_blanks"][0], json!({"id": 1, "question": "Bees make []"}));
    assert!(r["questions"]["true_false_not_given"][0].get("answer").is_none());
    assert!(r["mcq"]["questions"][0].get("correct_answer").is_none());
    assert_eq!(r["mcq"]["questions"][0]["options"]["A"], "x");
  }
}
