use anyhow::{bail, Context, Result};
// Use anyhow::Result as standard Result for service layer
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// --- Declare modules ---
pub mod advisor;
pub mod calories;
pub mod coach;
mod config;
pub mod gemini;
pub mod history;
pub mod model;
pub mod prompts;
pub mod session;
pub mod session_store;
pub mod store;

// --- Expose public types ---
pub use advisor::{advise, rep_ceiling, rep_floor, Suggestion};
pub use calories::{estimate_calories, DEFAULT_BODY_WEIGHT_KG};
pub use coach::{
    AiError, AlternativeGenerator, PlanDay, PlanStructurer, PlanWriter, SessionGenerator,
    StructuredPlan,
};
pub use config::{
    get_config_path as get_config_path_util,
    load_config as load_config_util,
    parse_color,
    save_config as save_config_util,
    Config,
    Error as ConfigError, // Renamed from Error
    StandardColor,
    Theme,
    MAX_EXERCISE_COUNT,
};
pub use gemini::GeminiClient;
pub use history::{
    group_by_day, personal_best, recommend_push_focus, DayGroup, HistoryRecord, MuscleGroup,
    PersonalBest, PlanKind, PushFocus, SessionStats,
};
pub use model::{ExerciseSlot, ExerciseTarget, SetLog, WorkoutSession, DEFAULT_WARMUP};
pub use prompts::{
    CurrentLifts, DietGoal, DietPreference, DietProfile, ExperienceLevel, Gender, MealRoutine,
    WorkoutFocus, WorkoutProfile, WorkoutSplit,
};
pub use session::{
    MachinePhase, SessionError, SessionMachine, SessionOptions, MAX_SET_WEIGHT_KG,
};
pub use session_store::{
    ActiveWorkout, Error as SessionStoreError, Phase, SessionStore, CURRENT_SESSION_KEY,
    HISTORY_KEY,
};
pub use store::{
    get_db_path as get_db_path_util,
    Error as StoreError, // Renamed from Error
    KeyValueStore,
    MemoryStore,
    SqliteStore,
};

/// Ties config, storage and the AI coach together for the command line.
pub struct TrackerService<S: KeyValueStore = SqliteStore> {
    pub config: Config,
    pub store: SessionStore<S>,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

impl TrackerService<SqliteStore> {
    /// Initializes the application service.
    /// # Errors
    /// Returns `anyhow::Error` if config/db path determination, loading, or initialization fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load_config(&config_path)
            .context(format!("Failed to load config from {config_path:?}"))?;

        let db_path = store::get_db_path().context("Failed to determine database path")?;
        let kv = SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open database at {db_path:?}"))?;

        Ok(Self {
            config,
            store: SessionStore::new(kv),
            db_path,
            config_path,
        })
    }
}

impl<S: KeyValueStore> TrackerService<S> {
    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save_config(&self.config_path, &self.config)
    }

    /// Sets the bodyweight used for calorie estimates of new sessions.
    /// # Errors
    /// - `ConfigError::InvalidBodyweightInput` if weight is not positive.
    /// - `ConfigError` variants if saving fails.
    pub fn set_bodyweight(&mut self, weight: f64) -> Result<(), ConfigError> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(ConfigError::InvalidBodyweightInput(
                "Weight must be a positive number.".to_string(),
            ));
        }
        self.config.bodyweight = Some(weight);
        self.save_config()
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            body_weight: self.config.bodyweight.unwrap_or(DEFAULT_BODY_WEIGHT_KG),
            allow_zero_weight: self.config.allow_zero_weight,
        }
    }

    // --- Active session ---

    /// Starts `session` in the warmup phase, replacing any active session.
    /// # Errors
    /// Returns an error if the new session could not be written to storage.
    pub fn start_session(&mut self, session: WorkoutSession) -> Result<SessionMachine<'_, S>> {
        let options = self.session_options();
        let had_active = self
            .store
            .load_current()
            .map(|current| current.is_some())
            .unwrap_or(false);
        if had_active {
            warn!("Replacing the workout that was in progress");
        }
        let (machine, saved) = SessionMachine::start(session, &mut self.store, options);
        saved.context("Failed to save the new workout session")?;
        Ok(machine)
    }

    /// The persisted session, if one is in progress.
    /// # Errors
    /// Returns an error if the stored session cannot be read.
    pub fn resume(&mut self) -> Result<Option<SessionMachine<'_, S>>> {
        let allow_zero_weight = self.config.allow_zero_weight;
        SessionMachine::resume(&mut self.store, allow_zero_weight)
            .context("Failed to load the active workout session")
    }

    /// Like [`Self::resume`], but having no active session is an error.
    /// # Errors
    /// Returns an error if nothing is in progress or the session cannot be read.
    pub fn active_session(&mut self) -> Result<SessionMachine<'_, S>> {
        match self.resume()? {
            Some(machine) => Ok(machine),
            None => bail!("No workout in progress. Start one with `gym-tracker new --focus <FOCUS>`."),
        }
    }

    /// Finishes the active session and appends it to history.
    ///
    /// The history record is written before the active session is cleared. If
    /// the append fails the session stays at its summary so `finish` can be
    /// retried.
    /// # Errors
    /// Returns an error if nothing is in progress, the session is not at its
    /// summary, or storage fails.
    pub fn finish_session(&mut self) -> Result<HistoryRecord> {
        let mut machine = self.active_session()?;
        let record = machine
            .finish_to_history()
            .context("Failed to save the finished workout to history")?;
        Ok(record)
    }

    /// Drops the active session without writing history.
    /// # Errors
    /// Returns an error if nothing is in progress or the session is already at its summary.
    pub fn abandon_session(&mut self) -> Result<()> {
        let mut machine = self.active_session()?;
        machine.abandon_workout()?;
        Ok(())
    }

    // --- Session sources ---

    /// Asks the coach for a session targeting `focus`. Uses the configured
    /// default when `exercise_count` is `None`.
    /// # Errors
    /// - `ConfigError::InvalidExerciseCount` for a count outside `1..=MAX_EXERCISE_COUNT`.
    /// - `AiError` if generation fails.
    pub fn generate_session<G: SessionGenerator>(
        &self,
        coach: &G,
        focus: &str,
        exercise_count: Option<u32>,
    ) -> Result<WorkoutSession> {
        let focus = focus.trim();
        if focus.is_empty() {
            bail!("Focus cannot be empty.");
        }
        let count = exercise_count.unwrap_or(self.config.default_exercise_count);
        if count == 0 || count > MAX_EXERCISE_COUNT {
            return Err(ConfigError::InvalidExerciseCount {
                got: count,
                max: MAX_EXERCISE_COUNT,
            }
            .into());
        }
        info!(focus, count, "Generating workout session");
        let session = coach
            .generate_session(focus, count)
            .with_context(|| format!("Failed to generate a '{focus}' session"))?;
        Ok(session)
    }

    /// A fresh copy of a finished tracker session from history.
    /// # Errors
    /// Returns an error if the id is unknown or is not a tracker session.
    pub fn repeat_from_history(&self, id: &str) -> Result<WorkoutSession> {
        let record = self.find_history(id)?;
        let Some(past) = record.session() else {
            bail!(
                "History entry '{}' is a {} plan, not a tracked workout.",
                id,
                record.kind()
            );
        };
        Ok(WorkoutSession::repeat_of(past))
    }

    /// Splits a saved workout plan into per-day sessions.
    /// # Errors
    /// Returns an error if the id is unknown, is not a workout plan, or the coach fails.
    pub fn structure_plan<P: PlanStructurer>(&self, coach: &P, id: &str) -> Result<StructuredPlan> {
        let record = self.find_history(id)?;
        if record.kind() != PlanKind::Workout {
            bail!(
                "History entry '{}' is a {} record, not a workout plan.",
                id,
                record.kind()
            );
        }
        let text = record.plan_text().unwrap_or_default();
        let plan = coach
            .parse_plan_to_days(text)
            .context("Failed to split the workout plan into days")?;
        info!(days = plan.days.len(), "Structured workout plan");
        Ok(plan)
    }

    /// Replaces the current exercise with one suggested by the coach and
    /// returns the new target. The active session is untouched if the coach fails.
    /// # Errors
    /// Returns an error if no exercise is active, the coach fails, or saving fails.
    pub fn replace_with_alternative<A: AlternativeGenerator>(
        &mut self,
        coach: &A,
    ) -> Result<ExerciseTarget> {
        let mut machine = self.active_session()?;
        let Some(current) = machine.current_slot().map(|slot| slot.name().to_string()) else {
            bail!("No exercise is active (phase: {}).", machine.phase());
        };
        let focus = machine.session().target_muscle.clone();
        let alternative = coach
            .generate_alternative(&current, &focus)
            .with_context(|| format!("Failed to find an alternative to '{current}'"))?;
        machine.replace_exercise(alternative.clone())?;
        Ok(alternative)
    }

    // --- Plans ---

    /// Writes a diet plan and saves it to history.
    /// # Errors
    /// Returns an error if the coach fails or history cannot be written.
    pub fn write_diet_plan<W: PlanWriter>(
        &mut self,
        coach: &W,
        profile: &DietProfile,
        skipped_meals: &[String],
    ) -> Result<HistoryRecord> {
        let text = coach
            .write_diet_plan(profile, skipped_meals)
            .context("Failed to generate the diet plan")?;
        let record = HistoryRecord::diet(
            format!("Diet Plan for {} ({})", profile.name, profile.goal),
            text,
        );
        self.store
            .append_history(record.clone())
            .context("Failed to save the diet plan to history")?;
        Ok(record)
    }

    /// Writes a workout plan and saves it to history.
    /// # Errors
    /// Returns an error if the coach fails or history cannot be written.
    pub fn write_workout_plan<W: PlanWriter>(
        &mut self,
        coach: &W,
        profile: &WorkoutProfile,
    ) -> Result<HistoryRecord> {
        let text = coach
            .write_workout_plan(profile)
            .context("Failed to generate the workout plan")?;
        let record = HistoryRecord::workout(
            format!("Workout Plan for {} ({})", profile.name, profile.focus),
            text,
        );
        self.store
            .append_history(record.clone())
            .context("Failed to save the workout plan to history")?;
        Ok(record)
    }

    // --- History ---

    /// History, most recent first, optionally limited to one kind.
    /// # Errors
    /// Returns an error if history cannot be read.
    pub fn list_history(&self, kind: Option<PlanKind>) -> Result<Vec<HistoryRecord>> {
        let records = self
            .store
            .load_history()
            .context("Failed to read history")?;
        Ok(records
            .into_iter()
            .filter(|r| kind.map_or(true, |k| r.kind() == k))
            .collect())
    }

    /// # Errors
    /// Returns an error if the id is unknown or history cannot be read.
    pub fn find_history(&self, id: &str) -> Result<HistoryRecord> {
        self.store
            .find_history(id)
            .context("Failed to read history")?
            .with_context(|| format!("No history entry with id '{id}'"))
    }

    /// # Errors
    /// Returns an error if the id is unknown or history cannot be written.
    pub fn delete_history(&mut self, id: &str) -> Result<()> {
        let removed = self
            .store
            .delete_history(id)
            .context("Failed to update history")?;
        if !removed {
            bail!("No history entry with id '{id}'");
        }
        info!(id, "Deleted history entry");
        Ok(())
    }

    /// Which push-day variant to do next, from the latest push-day session.
    /// # Errors
    /// Returns an error if history cannot be read.
    pub fn suggest_push_focus(&self) -> Result<Option<PushFocus>> {
        let records = self
            .store
            .load_history()
            .context("Failed to read history")?;
        Ok(recommend_push_focus(&records))
    }

    // --- Coach ---

    /// A Gemini client built from the configured key and model.
    /// # Errors
    /// Returns `ConfigError::ApiKeyNotSet` when no key is configured, or an
    /// `AiError` if the client cannot be built.
    pub fn coach(&self) -> Result<GeminiClient> {
        let api_key = self
            .config
            .resolve_api_key()
            .ok_or_else(|| ConfigError::ApiKeyNotSet(self.config_path.clone()))?;
        let client = GeminiClient::new(&api_key, &self.config.model)?;
        Ok(client)
    }
}

/// The session for `day` (1-based) of a structured plan.
/// # Errors
/// Returns an error if `day` is out of range.
pub fn session_for_plan_day(plan: &StructuredPlan, day: usize) -> Result<WorkoutSession> {
    let Some(plan_day) = day.checked_sub(1).and_then(|i| plan.days.get(i)) else {
        bail!(
            "Day {} does not exist; the plan has {} day(s).",
            day,
            plan.days.len()
        );
    };
    Ok(WorkoutSession::from_plan_day(plan_day))
}
