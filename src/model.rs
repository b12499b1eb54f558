//src/model.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Warmup used when a session is authored by hand or seeded from a plan day.
pub const DEFAULT_WARMUP: [&str; 3] = [
    "5 min light cardio (jog, bike or jumping jacks)",
    "Arm circles and band pull-aparts",
    "Dynamic stretches for today's muscle group",
];

/// What the user is asked to do for one exercise. Replaced wholesale when an exercise is swapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseTarget {
    pub name: String,
    pub target_sets: u32,
    /// Usually "low-high" ("8-12") or a single number ("10").
    pub target_reps: String,
    /// Display only ("90s", "2 min").
    pub rest_time: String,
}

impl ExerciseTarget {
    pub fn new(
        name: impl Into<String>,
        target_sets: u32,
        target_reps: impl Into<String>,
        rest_time: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target_sets,
            target_reps: target_reps.into(),
            rest_time: rest_time.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLog {
    pub set_number: u32,
    pub weight: f64,
    pub reps: u32,
    pub suggestion: String,
}

impl SetLog {
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSlot {
    #[serde(flatten)]
    pub target: ExerciseTarget,
    #[serde(default)]
    pub logs: Vec<SetLog>,
}

impl ExerciseSlot {
    #[must_use]
    pub const fn new(target: ExerciseTarget) -> Self {
        Self {
            target,
            logs: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.target.name
    }

    /// A slot is complete once it holds at least `target_sets` logs.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.logs.len() >= self.target.target_sets as usize
    }

    #[must_use]
    pub fn last_log(&self) -> Option<&SetLog> {
        self.logs.last()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    /// Focus label, e.g. "Chest" or "Day 1 - Chest & Triceps".
    pub target_muscle: String,
    pub exercises: Vec<ExerciseSlot>,
    #[serde(default)]
    pub warmup: Vec<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories_burned: Option<u32>,
}

impl WorkoutSession {
    /// A fresh session starting now, with empty logs for every target.
    pub fn new(
        target_muscle: impl Into<String>,
        targets: Vec<ExerciseTarget>,
        warmup: Vec<String>,
    ) -> Self {
        Self {
            target_muscle: target_muscle.into(),
            exercises: targets.into_iter().map(ExerciseSlot::new).collect(),
            warmup,
            start_time: Utc::now(),
            end_time: None,
            calories_burned: None,
        }
    }

    /// Same focus, targets and warmup as `past`, ready to be performed again.
    #[must_use]
    pub fn repeat_of(past: &Self) -> Self {
        Self::new(
            past.target_muscle.clone(),
            past.exercises.iter().map(|slot| slot.target.clone()).collect(),
            past.warmup.clone(),
        )
    }

    #[must_use]
    pub fn default_warmup() -> Vec<String> {
        DEFAULT_WARMUP.iter().map(ToString::to_string).collect()
    }

    #[must_use]
    pub fn completed_sets(&self) -> usize {
        self.exercises.iter().map(|slot| slot.logs.len()).sum()
    }
}
