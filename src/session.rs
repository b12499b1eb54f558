//src/session.rs
//! The live workout: warmup, then one exercise at a time, then a summary.
//!
//! Every mutating operation changes the in-memory session first and then writes
//! it to the [`SessionStore`] before returning. A failed write is reported as
//! [`SessionError::Persist`] but the in-memory change stays, so nothing the user
//! entered is lost.

use chrono::Utc;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::advisor;
use crate::calories;
use crate::history::{self, HistoryRecord, PersonalBest};
use crate::model::{ExerciseSlot, ExerciseTarget, SetLog, WorkoutSession};
use crate::session_store::{self, ActiveWorkout, Phase, SessionStore};
use crate::store::KeyValueStore;

/// Phase of a machine, including the terminal state reached after finishing
/// or abandoning. `Closed` is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachinePhase {
    Warmup,
    Active { index: usize },
    Summary,
    Closed,
}

impl From<Phase> for MachinePhase {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Warmup => Self::Warmup,
            Phase::Active { index } => Self::Active { index },
            Phase::Summary => Self::Summary,
        }
    }
}

impl fmt::Display for MachinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warmup => write!(f, "warmup"),
            Self::Active { index } => write!(f, "exercise {}", index + 1),
            Self::Summary => write!(f, "summary"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Cannot {operation} during {phase}")]
    Phase {
        operation: &'static str,
        phase: MachinePhase,
    },
    #[error("This session has no exercises; add at least one before starting")]
    EmptySession,
    #[error("Could not save the session (your progress is kept in memory): {0}")]
    Persist(session_store::Error),
    #[error("Could not read the stored session: {0}")]
    Load(session_store::Error),
}

/// Heaviest single set accepted by [`SessionMachine::log_set`], in kg.
pub const MAX_SET_WEIGHT_KG: f64 = 1000.0;

/// Tuning that varies per user, taken from the config by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub body_weight: f64,
    /// Accept 0 kg sets (bodyweight movements).
    pub allow_zero_weight: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            body_weight: calories::DEFAULT_BODY_WEIGHT_KG,
            allow_zero_weight: false,
        }
    }
}

pub struct SessionMachine<'a, S: KeyValueStore> {
    store: &'a mut SessionStore<S>,
    session: WorkoutSession,
    phase: MachinePhase,
    body_weight: f64,
    allow_zero_weight: bool,
    previous_best: Option<Option<PersonalBest>>,
}

impl<'a, S: KeyValueStore> SessionMachine<'a, S> {
    /// Begins a new session in the warmup phase and persists it, replacing any
    /// session that was in progress.
    ///
    /// The machine is returned even if the initial write fails; check the
    /// second element.
    pub fn start(
        session: WorkoutSession,
        store: &'a mut SessionStore<S>,
        options: SessionOptions,
    ) -> (Self, Result<(), SessionError>) {
        info!(
            focus = %session.target_muscle,
            exercises = session.exercises.len(),
            "starting workout session"
        );
        let body_weight = if options.body_weight > 0.0 {
            options.body_weight
        } else {
            calories::DEFAULT_BODY_WEIGHT_KG
        };
        let mut machine = Self {
            store,
            session,
            phase: MachinePhase::Warmup,
            body_weight,
            allow_zero_weight: options.allow_zero_weight,
            previous_best: None,
        };
        let saved = machine.persist();
        (machine, saved)
    }

    /// Rebuilds the machine from the persisted active session, if there is one.
    /// # Errors
    /// Returns `SessionError::Load` if the stored entry cannot be read.
    pub fn resume(
        store: &'a mut SessionStore<S>,
        allow_zero_weight: bool,
    ) -> Result<Option<Self>, SessionError> {
        let Some(active) = store.load_current().map_err(SessionError::Load)? else {
            return Ok(None);
        };
        let mut phase = MachinePhase::from(active.phase);
        if let MachinePhase::Active { index } = phase {
            if index >= active.session.exercises.len() {
                warn!(index, "stored exercise index out of range, returning to warmup");
                phase = MachinePhase::Warmup;
            }
        }
        debug!(%phase, "resumed workout session");
        Ok(Some(Self {
            store,
            session: active.session,
            phase,
            body_weight: active.body_weight,
            allow_zero_weight,
            previous_best: None,
        }))
    }

    #[must_use]
    pub const fn phase(&self) -> MachinePhase {
        self.phase
    }

    #[must_use]
    pub const fn session(&self) -> &WorkoutSession {
        &self.session
    }

    #[must_use]
    pub const fn body_weight(&self) -> f64 {
        self.body_weight
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore<S> {
        &*self.store
    }

    /// The slot being worked on, only while an exercise is active.
    #[must_use]
    pub fn current_slot(&self) -> Option<&ExerciseSlot> {
        match self.phase {
            MachinePhase::Active { index } => self.session.exercises.get(index),
            _ => None,
        }
    }

    /// Warmup -> first exercise.
    /// # Errors
    /// `Phase` outside warmup, `EmptySession` when there is nothing to do.
    pub fn start_workout(&mut self) -> Result<(), SessionError> {
        self.require_phase("start the workout", |p| p == MachinePhase::Warmup)?;
        if self.session.exercises.is_empty() {
            return Err(SessionError::EmptySession);
        }
        self.phase = MachinePhase::Active { index: 0 };
        self.previous_best = None;
        info!(exercise = %self.session.exercises[0].name(), "workout started");
        self.persist()
    }

    /// Records one set for the current exercise and returns it.
    /// # Errors
    /// `Phase` outside an exercise; `Validation` for non-positive input, a
    /// weight above [`MAX_SET_WEIGHT_KG`] or a slot that already has all its
    /// sets; `Persist` if the write failed (the set is still recorded).
    pub fn log_set(&mut self, weight: f64, reps: u32) -> Result<SetLog, SessionError> {
        let index = self.active_index("log a set")?;
        if !weight.is_finite() || weight < 0.0 || (weight == 0.0 && !self.allow_zero_weight) {
            return Err(SessionError::Validation(
                "weight must be a positive number".to_string(),
            ));
        }
        if weight > MAX_SET_WEIGHT_KG {
            return Err(SessionError::Validation(format!(
                "weight cannot exceed {MAX_SET_WEIGHT_KG} kg"
            )));
        }
        if reps == 0 {
            return Err(SessionError::Validation(
                "reps must be at least 1".to_string(),
            ));
        }
        let slot = &mut self.session.exercises[index];
        if slot.is_complete() {
            return Err(SessionError::Validation(format!(
                "all {} sets of '{}' are already logged",
                slot.target.target_sets,
                slot.name()
            )));
        }

        let suggestion = advisor::advise(reps, &slot.target.target_reps);
        let log = SetLog {
            set_number: slot.logs.len() as u32 + 1,
            weight,
            reps,
            suggestion: suggestion.to_string(),
        };
        slot.logs.push(log.clone());
        info!(
            exercise = %slot.name(),
            set = log.set_number,
            weight,
            reps,
            "logged set"
        );
        self.persist()?;
        Ok(log)
    }

    /// Finishes the current exercise: credits its calories, then moves to the
    /// next exercise or to the summary. Returns the new phase.
    /// # Errors
    /// `Phase` outside an exercise; `Validation` if the exercise still has
    /// sets to log; `Persist` if the write failed.
    pub fn advance_exercise(&mut self) -> Result<MachinePhase, SessionError> {
        let index = self.active_index("move to the next exercise")?;
        let slot = &self.session.exercises[index];
        if !slot.is_complete() {
            return Err(SessionError::Validation(format!(
                "'{}' has {} of {} sets logged",
                slot.name(),
                slot.logs.len(),
                slot.target.target_sets
            )));
        }

        let burned = calories::estimate_calories(&slot.logs, self.body_weight);
        debug!(exercise = %slot.name(), burned, "credited calories");
        let total = self
            .session
            .calories_burned
            .unwrap_or(0)
            .saturating_add(burned);
        self.session.calories_burned = Some(total);

        if index + 1 < self.session.exercises.len() {
            self.phase = MachinePhase::Active { index: index + 1 };
            self.previous_best = None;
            info!(next = %self.session.exercises[index + 1].name(), "next exercise");
        } else {
            self.phase = MachinePhase::Summary;
            info!(calories = total, "all exercises done");
        }
        self.persist()?;
        Ok(self.phase)
    }

    /// Swaps the current exercise for `new_target`, discarding its logged sets.
    /// # Errors
    /// `Phase` outside an exercise; `Validation` for an unnamed target or zero
    /// sets; `Persist` if the write failed.
    pub fn replace_exercise(&mut self, new_target: ExerciseTarget) -> Result<(), SessionError> {
        let index = self.active_index("replace an exercise")?;
        if new_target.name.trim().is_empty() {
            return Err(SessionError::Validation(
                "replacement exercise needs a name".to_string(),
            ));
        }
        if new_target.target_sets == 0 {
            return Err(SessionError::Validation(
                "replacement exercise needs at least one set".to_string(),
            ));
        }
        info!(
            old = %self.session.exercises[index].name(),
            new = %new_target.name,
            "replacing exercise"
        );
        self.session.exercises[index] = ExerciseSlot::new(new_target);
        self.previous_best = None;
        self.persist()
    }

    /// Ends the session from the summary: stamps the end time, clears the
    /// persisted active session and hands the session back. The machine is
    /// closed afterwards; every later call fails with a phase error.
    /// # Errors
    /// `Phase` outside the summary; `Persist` if the active entry could not be
    /// cleared (the machine then stays in the summary so the call can be retried).
    pub fn finish_workout(&mut self) -> Result<WorkoutSession, SessionError> {
        self.require_phase("finish the workout", |p| p == MachinePhase::Summary)?;
        self.session.end_time = Some(Utc::now());
        self.store.clear_current().map_err(SessionError::Persist)?;
        self.phase = MachinePhase::Closed;
        info!(
            focus = %self.session.target_muscle,
            sets = self.session.completed_sets(),
            calories = self.session.calories_burned.unwrap_or(0),
            "workout finished"
        );
        Ok(self.session.clone())
    }

    /// Like [`Self::finish_workout`], but appends the finished session to
    /// history before the active entry is cleared, so a crash between the two
    /// writes leaves the workout in history rather than nowhere.
    /// # Errors
    /// `Phase` outside the summary. `Persist` if the history append failed
    /// (the machine and the stored active session stay at the summary), or if
    /// the active entry could not be cleared afterwards (the record is saved
    /// and the machine is closed).
    pub fn finish_to_history(&mut self) -> Result<HistoryRecord, SessionError> {
        self.require_phase("finish the workout", |p| p == MachinePhase::Summary)?;
        let mut session = self.session.clone();
        session.end_time = Some(Utc::now());
        let record = HistoryRecord::tracker(session.clone());
        self.store
            .append_history(record.clone())
            .map_err(|e| {
                warn!("failed to append finished workout to history: {e}");
                SessionError::Persist(e)
            })?;
        self.session = session;
        self.phase = MachinePhase::Closed;
        info!(
            id = %record.id(),
            focus = %self.session.target_muscle,
            calories = self.session.calories_burned.unwrap_or(0),
            "workout saved to history"
        );
        self.store.clear_current().map_err(SessionError::Persist)?;
        Ok(record)
    }

    /// Drops the session without producing a history record.
    /// # Errors
    /// `Phase` from the summary or after closing; `Persist` if the active entry
    /// could not be cleared.
    pub fn abandon_workout(&mut self) -> Result<(), SessionError> {
        self.require_phase("abandon the workout", |p| {
            matches!(p, MachinePhase::Warmup | MachinePhase::Active { .. })
        })?;
        self.store.clear_current().map_err(SessionError::Persist)?;
        self.phase = MachinePhase::Closed;
        info!(focus = %self.session.target_muscle, "workout abandoned");
        Ok(())
    }

    /// Best set ever logged for the current exercise, read from history the first
    /// time it is asked for and cached until the exercise changes.
    /// # Errors
    /// `Phase` outside an exercise; `Load` if history cannot be read.
    pub fn previous_best(&mut self) -> Result<Option<PersonalBest>, SessionError> {
        let index = self.active_index("look up a previous best")?;
        if let Some(cached) = self.previous_best {
            return Ok(cached);
        }
        let records = self.store.load_history().map_err(SessionError::Load)?;
        let best = history::personal_best(&records, self.session.exercises[index].name());
        self.previous_best = Some(best);
        Ok(best)
    }

    fn require_phase(
        &self,
        operation: &'static str,
        allowed: impl Fn(MachinePhase) -> bool,
    ) -> Result<(), SessionError> {
        if allowed(self.phase) {
            Ok(())
        } else {
            Err(SessionError::Phase {
                operation,
                phase: self.phase,
            })
        }
    }

    fn active_index(&self, operation: &'static str) -> Result<usize, SessionError> {
        match self.phase {
            MachinePhase::Active { index } => Ok(index),
            phase => Err(SessionError::Phase { operation, phase }),
        }
    }

    fn persist(&mut self) -> Result<(), SessionError> {
        let phase = match self.phase {
            MachinePhase::Warmup => Phase::Warmup,
            MachinePhase::Active { index } => Phase::Active { index },
            MachinePhase::Summary => Phase::Summary,
            MachinePhase::Closed => return Ok(()),
        };
        let active = ActiveWorkout {
            phase,
            body_weight: self.body_weight,
            session: self.session.clone(),
        };
        self.store.save_current(&active).map_err(|e| {
            warn!("failed to persist active session: {e}");
            SessionError::Persist(e)
        })
    }
}
