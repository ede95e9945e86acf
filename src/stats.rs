// Aggregates shown on the Cards and History tabs.

use crate::model::{DailyStats, Word};
use crate::session::percent;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSummary {
    pub total: u32,
    pub mastered: u32,
    pub correct: u32,
    pub wrong: u32,
}

impl ProgressSummary {
    pub fn of(words: &[Word]) -> Self {
        words.iter().fold(Self::default(), |mut acc, w| {
            acc.total += 1;
            acc.mastered += u32::from(w.mastered);
            acc.correct = acc.correct.saturating_add(w.correct_count);
            acc.wrong = acc.wrong.saturating_add(w.wrong_count);
            acc
        })
    }

    pub fn mastery_rate(&self) -> u32 {
        percent(self.mastered, self.total)
    }

    pub fn accuracy(&self) -> u32 {
        percent(self.correct, self.correct.saturating_add(self.wrong))
    }
}

/// History windows offered on the History tab.
pub const HISTORY_WINDOWS: [u32; 4] = [7, 14, 30, 90];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistorySummary {
    pub days_studied: usize,
    pub study_time_seconds: u64,
    pub words_studied: u32,
    pub average_accuracy: f64,
}

impl HistorySummary {
    pub fn of(days: &[DailyStats]) -> Self {
        if days.is_empty() {
            return Self::default();
        }
        let accuracy_sum: f64 = days.iter().map(|d| d.accuracy_rate).sum();
        Self {
            days_studied: days.len(),
            study_time_seconds: days.iter().map(|d| d.study_time_seconds).sum(),
            words_studied: days.iter().map(|d| d.words_studied).sum(),
            average_accuracy: accuracy_sum / days.len() as f64,
        }
    }
}

pub fn format_study_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn w(id: i64, mastered: bool, correct: u32, wrong: u32) -> Word {
        Word {
            id,
            word: format!("w{id}"),
            meaning: String::new(),
            notebook_id: 1,
            correct_count: correct,
            wrong_count: wrong,
            mastered,
            last_studied: None,
        }
    }

    #[test]
    fn progress_summary_rounds_rates() {
        let s = ProgressSummary::of(&[w(1, true, 3, 0), w(2, false, 1, 2), w(3, false, 0, 0)]);
        assert_eq!(s.total, 3);
        assert_eq!(s.mastered, 1);
        assert_eq!(s.mastery_rate(), 33);
        assert_eq!(s.accuracy(), 67);
    }

    #[test]
    fn empty_lists_give_zero_rates() {
        let s = ProgressSummary::of(&[]);
        assert_eq!(s.mastery_rate(), 0);
        assert_eq!(s.accuracy(), 0);
        assert_eq!(HistorySummary::of(&[]), HistorySummary::default());
    }

    #[test]
    fn history_totals() {
        let day = |d: u32, secs: u64, words: u32, acc: f64| DailyStats {
            date: NaiveDate::from_ymd_opt(2025, 3, d).unwrap(),
            study_time_seconds: secs,
            words_studied: words,
            correct_count: 0,
            wrong_count: 0,
            accuracy_rate: acc,
        };
        let h = HistorySummary::of(&[day(1, 600, 10, 80.0), day(2, 3000, 30, 60.0)]);
        assert_eq!(h.days_studied, 2);
        assert_eq!(h.study_time_seconds, 3600);
        assert_eq!(h.words_studied, 40);
        assert!((h.average_accuracy - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn study_time_format() {
        assert_eq!(format_study_time(59), "0m");
        assert_eq!(format_study_time(125 * 60), "2h 5m");
    }
}
