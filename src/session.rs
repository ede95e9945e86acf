// Study-session counters and the start/end lifecycle.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::SessionReport;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("a study session is already running")]
    AlreadyActive,
    #[error("no study session is running")]
    NotActive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCounters {
    pub correct: u32,
    pub wrong: u32,
    pub studied: u32,
}

impl SessionCounters {
    pub fn correct(&mut self) {
        self.correct = self.correct.saturating_add(1);
        self.studied = self.studied.saturating_add(1);
    }

    pub fn wrong(&mut self) {
        self.wrong = self.wrong.saturating_add(1);
        self.studied = self.studied.saturating_add(1);
    }

    /// Rounded percentage; 0 before any attempt.
    pub fn accuracy(&self) -> u32 {
        percent(self.correct, self.correct.saturating_add(self.wrong))
    }

    fn without(self, sent: SessionCounters) -> SessionCounters {
        SessionCounters {
            correct: self.correct.saturating_sub(sent.correct),
            wrong: self.wrong.saturating_sub(sent.wrong),
            studied: self.studied.saturating_sub(sent.studied),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Active {
        id: i64,
        started: Instant,
    },
}

#[derive(Debug)]
pub struct SessionTracker {
    phase: Phase,
    counters: SessionCounters,
    reported: Option<SessionCounters>,
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            counters: SessionCounters::default(),
            reported: None,
        }
    }
}

impl SessionTracker {
    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    pub fn counters_mut(&mut self) -> &mut SessionCounters {
        &mut self.counters
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Active { .. })
    }

    pub fn session_id(&self) -> Option<i64> {
        match self.phase {
            Phase::Active { id, .. } => Some(id),
            Phase::Idle => None,
        }
    }

    pub fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.is_active() {
            Err(SessionError::AlreadyActive)
        } else {
            Ok(())
        }
    }

    /// Records the session the backend just created.
    pub fn start(&mut self, id: i64, now: Instant) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.phase = Phase::Active { id, started: now };
        Ok(())
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.phase {
            Phase::Active { started, .. } => now.saturating_duration_since(started),
            Phase::Idle => Duration::ZERO,
        }
    }

    /// Final tally to send before the session is closed. The tally is
    /// remembered so `finish` only clears what was actually reported.
    pub fn report(
        &mut self,
        now: Instant,
        end_time: DateTime<Utc>,
    ) -> Result<(i64, SessionReport), SessionError> {
        let Phase::Active { id, started } = self.phase else {
            return Err(SessionError::NotActive);
        };
        self.reported = Some(self.counters);
        Ok((
            id,
            SessionReport {
                end_time,
                correct_count: self.counters.correct,
                wrong_count: self.counters.wrong,
                words_studied: self.counters.studied,
                duration_seconds: now.saturating_duration_since(started).as_secs(),
            },
        ))
    }

    /// Called once the backend has accepted the report. Judgments confirmed
    /// after the report went out stay on the counters.
    pub fn finish(&mut self) {
        self.phase = Phase::Idle;
        let sent = self.reported.take().unwrap_or(self.counters);
        self.counters = self.counters.without(sent);
    }
}

pub fn percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

pub fn format_clock(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
