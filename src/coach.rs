//src/coach.rs
//! Boundary to the generative-AI collaborators.
//!
//! The model's replies are untrusted text. Everything that comes back is parsed
//! into `Raw*` shapes, validated, and only then turned into crate types, so a
//! malformed reply fails the whole request instead of half-applying.

use serde::Deserialize;
use thiserror::Error;

use crate::model::{ExerciseTarget, WorkoutSession};
use crate::prompts::{DietProfile, WorkoutProfile};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AiError {
    #[error("Daily limit reached: the AI quota for this key is exhausted. Try again in a few hours or use a different API key.")]
    QuotaExceeded,
    #[error("Invalid API key: the configured key is missing, incorrect or expired. ({0})")]
    AuthFailure(String),
    #[error("Connection error: could not talk to the AI. Check your internet connection. ({0})")]
    Network(String),
    #[error("The AI returned a response that could not be understood: {0}")]
    MalformedResponse(String),
}

impl AiError {
    /// Sorts a failed request into a category from its HTTP status (if any) and message.
    #[must_use]
    pub fn categorize(status: Option<u16>, message: &str) -> Self {
        let lower = message.to_lowercase();
        if status == Some(429) || lower.contains("quota") || lower.contains("resource_exhausted")
        {
            Self::QuotaExceeded
        } else if matches!(status, Some(401 | 403))
            || lower.contains("api key")
            || lower.contains("api_key")
        {
            Self::AuthFailure(message.to_string())
        } else {
            Self::Network(message.to_string())
        }
    }

    /// Short category name for user-facing messages.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::QuotaExceeded => "quota",
            Self::AuthFailure(_) => "auth",
            Self::Network(_) => "connection",
            Self::MalformedResponse(_) => "response",
        }
    }
}

/// One day of a structured long-form workout plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanDay {
    pub day_name: String,
    pub focus: String,
    pub exercises: Vec<ExerciseTarget>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructuredPlan {
    pub days: Vec<PlanDay>,
}

impl WorkoutSession {
    /// A session for one plan day, titled "{day} - {focus}".
    #[must_use]
    pub fn from_plan_day(day: &PlanDay) -> Self {
        let title = if day.focus.trim().is_empty() {
            day.day_name.clone()
        } else {
            format!("{} - {}", day.day_name, day.focus)
        };
        Self::new(title, day.exercises.clone(), Self::default_warmup())
    }
}

pub trait SessionGenerator {
    /// A fresh session for `focus` with exactly `exercise_count` exercises.
    /// # Errors
    /// Returns `AiError` when the request fails or the reply is invalid.
    fn generate_session(&self, focus: &str, exercise_count: u32)
        -> Result<WorkoutSession, AiError>;
}

pub trait AlternativeGenerator {
    /// A substitute for `current_name` that trains the same `focus`.
    /// # Errors
    /// Returns `AiError` when the request fails or the reply is invalid.
    fn generate_alternative(&self, current_name: &str, focus: &str)
        -> Result<ExerciseTarget, AiError>;
}

pub trait PlanStructurer {
    /// Extracts the per-day exercise tables from a long-form plan.
    /// # Errors
    /// Returns `AiError` when the request fails or the reply is invalid.
    fn parse_plan_to_days(&self, plan_text: &str) -> Result<StructuredPlan, AiError>;
}

pub trait PlanWriter {
    /// # Errors
    /// Returns `AiError` when the request fails or the reply is empty.
    fn write_diet_plan(
        &self,
        profile: &DietProfile,
        skipped_meals: &[String],
    ) -> Result<String, AiError>;

    /// # Errors
    /// Returns `AiError` when the request fails or the reply is empty.
    fn write_workout_plan(&self, profile: &WorkoutProfile) -> Result<String, AiError>;
}

// --- Raw reply shapes ---

/// Models mix quoted and bare numbers ("targetSets": "3", "targetReps": 10).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u32),
    Text(String),
}

impl NumberOrText {
    fn count(&self) -> Option<u32> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => crate::advisor::rep_ceiling(s.trim()),
        }
    }

    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExercise {
    #[serde(default)]
    name: String,
    target_sets: Option<NumberOrText>,
    #[serde(alias = "reps")]
    target_reps: Option<NumberOrText>,
    #[serde(alias = "rest")]
    rest_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSession {
    target_muscle: Option<String>,
    #[serde(default)]
    warmup: Vec<String>,
    #[serde(default)]
    exercises: Vec<RawExercise>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDay {
    #[serde(default)]
    day_name: String,
    #[serde(default)]
    focus: String,
    #[serde(default)]
    exercises: Vec<RawExercise>,
}

#[derive(Debug, Deserialize)]
struct RawPlan {
    #[serde(default)]
    days: Vec<RawDay>,
}

/// Strips markdown fences and surrounding chatter, returning the outermost JSON object.
///
/// # Errors
/// `MalformedResponse` when the text holds no `{ ... }` block.
pub fn extract_json_object(text: &str) -> Result<&str, AiError> {
    let start = text.find('{');
    let end = text.rfind('}');
    match (start, end) {
        (Some(s), Some(e)) if s < e => Ok(&text[s..=e]),
        _ => Err(AiError::MalformedResponse(
            "no JSON object in reply".to_string(),
        )),
    }
}

fn parse_json<'de, T: Deserialize<'de>>(text: &'de str) -> Result<T, AiError> {
    let body = extract_json_object(text)?;
    serde_json::from_str(body).map_err(|e| AiError::MalformedResponse(e.to_string()))
}

fn validate_exercise(raw: RawExercise) -> Result<ExerciseTarget, AiError> {
    let name = raw.name.trim().to_string();
    if name.is_empty() {
        return Err(AiError::MalformedResponse(
            "exercise without a name".to_string(),
        ));
    }
    let target_sets = raw
        .target_sets
        .as_ref()
        .and_then(NumberOrText::count)
        .filter(|n| *n > 0)
        .ok_or_else(|| AiError::MalformedResponse(format!("'{name}' has no valid set count")))?;
    let target_reps = raw
        .target_reps
        .map(NumberOrText::into_string)
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| AiError::MalformedResponse(format!("'{name}' has no rep target")))?;
    Ok(ExerciseTarget {
        name,
        target_sets,
        target_reps,
        rest_time: raw.rest_time.unwrap_or_default(),
    })
}

/// Parses a generated session and checks it has exactly `expected_count` valid exercises.
///
/// # Errors
/// `MalformedResponse` on unparseable JSON, a wrong exercise count, or an invalid exercise.
pub fn parse_generated_session(
    text: &str,
    focus: &str,
    expected_count: u32,
) -> Result<WorkoutSession, AiError> {
    let raw: RawSession = parse_json(text)?;
    if raw.exercises.is_empty() {
        return Err(AiError::MalformedResponse(
            "session has no exercises".to_string(),
        ));
    }
    if raw.exercises.len() != expected_count as usize {
        return Err(AiError::MalformedResponse(format!(
            "asked for {expected_count} exercises, got {}",
            raw.exercises.len()
        )));
    }
    let targets = raw
        .exercises
        .into_iter()
        .map(validate_exercise)
        .collect::<Result<Vec<_>, _>>()?;
    let title = raw
        .target_muscle
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| focus.to_string());
    let warmup = raw
        .warmup
        .into_iter()
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .collect();
    Ok(WorkoutSession::new(title, targets, warmup))
}

/// # Errors
/// `MalformedResponse` on unparseable JSON or an invalid exercise.
pub fn parse_alternative(text: &str) -> Result<ExerciseTarget, AiError> {
    let raw: RawExercise = parse_json(text)?;
    validate_exercise(raw)
}

/// # Errors
/// `MalformedResponse` on unparseable JSON, no days, or a day with an invalid exercise.
pub fn parse_structured_plan(text: &str) -> Result<StructuredPlan, AiError> {
    let raw: RawPlan = parse_json(text)?;
    let days = raw
        .days
        .into_iter()
        .filter(|d| !d.exercises.is_empty())
        .enumerate()
        .map(|(i, d)| -> Result<PlanDay, AiError> {
            let exercises = d
                .exercises
                .into_iter()
                .map(validate_exercise)
                .collect::<Result<Vec<_>, _>>()?;
            let day_name = if d.day_name.trim().is_empty() {
                format!("Day {}", i + 1)
            } else {
                d.day_name.trim().to_string()
            };
            Ok(PlanDay {
                day_name,
                focus: d.focus.trim().to_string(),
                exercises,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if days.is_empty() {
        return Err(AiError::MalformedResponse(
            "plan has no training days".to_string(),
        ));
    }
    Ok(StructuredPlan { days })
}
