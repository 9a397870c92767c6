//! Report card: a summary over stored attempts.

use serde::{Deserialize, Serialize};

use crate::domain::QuizAttempt;
use crate::scoring::round2;

/// How many of the newest attempts feed `last5Average`.
pub const RECENT_WINDOW: usize = 5;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportCard {
  pub total_attempts: usize,
  pub average_score: f64,
  pub last5_average: f64,
  pub most_missed_topic: Option<String>,
}

/// Summarize `attempts`, which must be ordered newest first.
///
/// Averages are over `percent` and rounded to 2 decimals. The most missed topic is the
/// one with the most incorrect answers; ties go to the topic seen first.
pub fn report_card(attempts: &[QuizAttempt]) -> ReportCard {
  let mut misses: Vec<(&str, u32)> = Vec::new();
  for a in attempts {
    let missed = a.result.max_score.saturating_sub(a.result.score);
    let topic = a.spec.topic.trim();
    match misses.iter_mut().find(|(t, _)| *t == topic) {
      Some((_, n)) => *n += missed,
      None => misses.push((topic, missed)),
    }
  }

  let mut most_missed: Option<(&str, u32)> = None;
  for (topic, n) in misses {
    if n > 0 && most_missed.map_or(true, |(_, best)| n > best) {
      most_missed = Some((topic, n));
    }
  }

  ReportCard {
    total_attempts: attempts.len(),
    average_score: mean_percent(attempts),
    last5_average: mean_percent(&attempts[..attempts.len().min(RECENT_WINDOW)]),
    most_missed_topic: most_missed.map(|(t, _)| t.to_string()),
  }
}

fn mean_percent(attempts: &[QuizAttempt]) -> f64 {
  if attempts.is_empty() {
    return 0.0;
  }
  let total: f64 = attempts.iter().map(|a| a.result.percent).sum();
  round2(total / attempts.len() as f64)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::scoring::percent;
  use crate::store::testing::{at, attempt};

  fn scored(id: &str, topic: &str, score: u32, max: u32) -> QuizAttempt {
    let mut a = attempt(id, at(0));
    a.spec.topic = topic.into();
    a.result.score = score;
    a.result.max_score = max;
    a.result.percent = percent(score, max);
    a
  }

  #[test]
  fn empty_history() {
    let r = report_card(&[]);
    assert_eq!(r, ReportCard { total_attempts: 0, average_score: 0.0, last5_average: 0.0, most_missed_topic: None });
  }

  #[test]
  fn averages_and_recent_window() {
    let attempts: Vec<QuizAttempt> = (0..6)
      .map(|i| scored(&format!("a{i}"), "Tides", if i < 5 { 4 } else { 0 }, 4))
      .collect();
    let r = report_card(&attempts);
    assert_eq!(r.total_attempts, 6);
    assert_eq!(r.last5_average, 100.0);
    assert_eq!(r.average_score, 83.33);
  }

  #[test]
  fn most_missed_topic_counts_incorrect_answers() {
    let attempts = vec![
      scored("a1", "Tides", 3, 4),
      scored("a2", "Volcanoes", 2, 4),
      scored("a3", "Tides", 2, 4),
      scored("a4", "Rivers", 4, 4),
    ];
    assert_eq!(report_card(&attempts).most_missed_topic.as_deref(), Some("Tides"));
  }

  #[test]
  fn ties_go_to_the_newest_topic_and_perfect_runs_have_none() {
    let tie = vec![scored("a1", "Rivers", 2, 4), scored("a2", "Tides", 2, 4)];
    assert_eq!(report_card(&tie).most_missed_topic.as_deref(), Some("Rivers"));

    let perfect = vec![scored("a1", "Rivers", 4, 4)];
    assert_eq!(report_card(&perfect).most_missed_topic, None);
  }
}
