//src/prompts.rs
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

// Shared instructions for long-form plans
const PLAN_INSTRUCTIONS: &str = "\
CRITICAL INSTRUCTIONS:
1. SPEED & BREVITY: Output only the plan. No conversational text like \"Here is your plan\".
2. LANGUAGE MATCHING: Detect the user's input language (Hindi/English/Hinglish) and answer in it, matching the tone.
3. FORMATTING: Markdown with '##' section headings.
4. TABLES: Use markdown tables for ALL schedules.
5. CONTENT: NO EMOJIS. NO ICONS. Professional text only.";

const JSON_ONLY: &str = "Respond with a single JSON object and nothing else.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, ValueEnum, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, ValueEnum, Serialize, Deserialize)]
pub enum DietPreference {
    #[strum(serialize = "Vegetarian")]
    Veg,
    #[strum(serialize = "Non-Vegetarian")]
    NonVeg,
    #[strum(serialize = "Veg + Non-Veg (Both)")]
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, ValueEnum, Serialize, Deserialize)]
pub enum DietGoal {
    #[strum(serialize = "Weight Loss")]
    WeightLoss,
    #[strum(serialize = "Weight Gain")]
    WeightGain,
    #[strum(serialize = "Muscle Gain")]
    MuscleGain,
    Maintenance,
    #[strum(serialize = "Fat Loss")]
    FatLoss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, ValueEnum, Serialize, Deserialize)]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, ValueEnum, Serialize, Deserialize)]
pub enum WorkoutSplit {
    #[strum(serialize = "Standard (Mix)")]
    Standard,
    #[strum(serialize = "Double Muscle (2 Body Parts/Day)")]
    DoubleMuscle,
    #[strum(serialize = "Push Pull Legs")]
    Ppl,
    #[strum(serialize = "Bro Split (1 Body Part/Day)")]
    BroSplit,
    #[strum(serialize = "Full Body")]
    FullBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, ValueEnum, Serialize, Deserialize)]
pub enum WorkoutFocus {
    Cardio,
    Strength,
    Mix,
    Powerlifting,
}

/// Usual meal times; every entry is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealRoutine {
    pub wakeup_time: Option<String>,
    pub breakfast: Option<String>,
    pub lunch: Option<String>,
    pub evening_snack: Option<String>,
    pub post_workout: Option<String>,
    pub dinner: Option<String>,
}

impl MealRoutine {
    /// Condensed "Wake: 6am | Bkfast: 8am" form to keep prompts short.
    #[must_use]
    pub fn summary(&self) -> String {
        [
            ("Wake", &self.wakeup_time),
            ("Bkfast", &self.breakfast),
            ("Lnch", &self.lunch),
            ("Snk", &self.evening_snack),
            ("P.WO", &self.post_workout),
            ("Dnr", &self.dinner),
        ]
        .iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(|v| format!("{label}: {v}"))
        })
        .collect::<Vec<_>>()
        .join(" | ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietProfile {
    pub name: String,
    pub gender: Gender,
    pub age: u32,
    pub weight_kg: f64,
    pub height: String,
    pub preference: DietPreference,
    pub goal: DietGoal,
    pub health_conditions: Option<String>,
    pub routine: MealRoutine,
}

/// Current one-rep maxes in kg, used for powerlifting plans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentLifts {
    pub squat: Option<f64>,
    pub bench: Option<f64>,
    pub deadlift: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutProfile {
    pub name: String,
    pub gender: Gender,
    pub days_per_week: u32,
    pub minutes_per_day: u32,
    pub focus: WorkoutFocus,
    pub experience: ExperienceLevel,
    pub split: Option<WorkoutSplit>,
    pub health_conditions: Option<String>,
    pub current_lifts: CurrentLifts,
}

fn lift_or_na(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

#[must_use]
pub fn diet_plan_prompt(profile: &DietProfile, skipped_meals: &[String]) -> String {
    let health = non_empty(profile.health_conditions.as_ref()).map_or_else(
        || "No specific health issues.".to_string(),
        |c| {
            format!(
                "HEALTH CONDITIONS: {c}. CRITICAL: ANALYZE these issues. Adjust foods accordingly \
                 (e.g., Low GI for Diabetes, Iodine for Thyroid, Low Sodium for BP). State the adjustments made."
            )
        },
    );
    let skip = if skipped_meals.is_empty() {
        String::new()
    } else {
        format!("SKIP: {}. Redistribute calories.", skipped_meals.join(", "))
    };
    format!(
        "{PLAN_INSTRUCTIONS}
TYPE: Diet Plan.
USER: {name}, {gender}, Age {age}, {weight}kg, {height}.
GOAL: {goal}. PREF: {pref}.
{health}
ROUTINE: {routine}
{skip}

OUTPUT:
1. BMR & TDEE (1 line).
2. Health Analysis (If conditions exist, briefly explain changes).
3. Meal Table (Time, Meal, Items, Macros). Precise quantities.
4. Short Note on Hydration.",
        name = profile.name,
        gender = profile.gender,
        age = profile.age,
        weight = profile.weight_kg,
        height = profile.height,
        goal = profile.goal,
        pref = profile.preference,
        routine = profile.routine.summary(),
    )
}

#[must_use]
pub fn workout_plan_prompt(profile: &WorkoutProfile) -> String {
    let strategy = if profile.focus == WorkoutFocus::Powerlifting {
        let lifts = profile.current_lifts;
        format!(
            "FOCUS: POWERLIFTING (Strength).
CURRENT LIFTS: Squat: {}kg, Bench: {}kg, Deadlift: {}kg.
GOAL: Increase 1RM on SBD (Squat, Bench, Deadlift).
STRATEGY: Use a strength progression (e.g. 5x5, 5/3/1, or percentage based).
Focus heavily on compound movements with lower reps and higher rest.",
            lift_or_na(lifts.squat),
            lift_or_na(lifts.bench),
            lift_or_na(lifts.deadlift),
        )
    } else {
        match profile.split {
            Some(split) => format!("Split: {split}."),
            None => "Suggest safe split.".to_string(),
        }
    };
    let health = non_empty(profile.health_conditions.as_ref()).map_or_else(
        || "No specific health issues.".to_string(),
        |c| {
            format!(
                "HEALTH ISSUES: {c}. CRITICAL: Adjust intensity and exercises to be SAFE \
                 (e.g., Avoid heavy overheads for shoulder pain, moderate cardio for BP)."
            )
        },
    );
    let intensity_note = if profile.focus == WorkoutFocus::Powerlifting {
        "   For Powerlifting, include % of 1RM or RPE if possible."
    } else {
        ""
    };
    format!(
        "{PLAN_INSTRUCTIONS}
TYPE: Workout Plan.
USER: {name}, {gender}, {experience}.
AVAILABILITY: {days} days, {minutes} mins.
FOCUS: {focus}.
{strategy}
{health}

OUTPUT:
1. Weekly Schedule Table (Day, Muscle Group / Lift).
2. Safety Note (If health issues exist).
3. Daily Routine Tables (Exercise, Sets, Reps).
{intensity_note}
4. Very brief Warmup/Cooldown.",
        name = profile.name,
        gender = profile.gender,
        experience = profile.experience,
        days = profile.days_per_week,
        minutes = profile.minutes_per_day,
        focus = profile.focus,
    )
}

#[must_use]
pub fn session_prompt(focus: &str, exercise_count: u32) -> String {
    format!(
        "Create a gym session for: {focus}.
Exactly {exercise_count} exercises, ordered compound first.
{JSON_ONLY}
Shape: {{\"targetMuscle\": string, \"warmup\": [string, ...3-4 short items],
\"exercises\": [{{\"name\": string, \"targetSets\": number, \"targetReps\": \"8-12\", \"restTime\": \"90s\"}}]}}"
    )
}

#[must_use]
pub fn alternative_prompt(current_name: &str, focus: &str) -> String {
    format!(
        "The user cannot do '{current_name}' today (equipment busy). Suggest ONE different exercise \
that trains the same muscles for a {focus} session.
{JSON_ONLY}
Shape: {{\"name\": string, \"targetSets\": number, \"targetReps\": \"8-12\", \"restTime\": \"60s\"}}"
    )
}

#[must_use]
pub fn plan_structure_prompt(plan_text: &str) -> String {
    format!(
        "Convert this workout plan into structured data. Skip rest days.
{JSON_ONLY}
Shape: {{\"days\": [{{\"dayName\": \"Day 1\", \"focus\": \"Chest & Triceps\",
\"exercises\": [{{\"name\": string, \"targetSets\": number, \"targetReps\": string, \"restTime\": string}}]}}]}}

PLAN:
{plan_text}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workout_profile(focus: WorkoutFocus) -> WorkoutProfile {
        WorkoutProfile {
            name: "Asha".to_string(),
            gender: Gender::Female,
            days_per_week: 4,
            minutes_per_day: 60,
            focus,
            experience: ExperienceLevel::Intermediate,
            split: Some(WorkoutSplit::Ppl),
            health_conditions: None,
            current_lifts: CurrentLifts {
                squat: Some(100.0),
                bench: None,
                deadlift: Some(140.0),
            },
        }
    }

    #[test]
    fn test_routine_summary_skips_blank_entries() {
        let routine = MealRoutine {
            wakeup_time: Some("6am".to_string()),
            lunch: Some(" ".to_string()),
            dinner: Some("9pm".to_string()),
            ..Default::default()
        };
        assert_eq!(routine.summary(), "Wake: 6am | Dnr: 9pm");
    }

    #[test]
    fn test_powerlifting_prompt_lists_lifts() {
        let prompt = workout_plan_prompt(&workout_profile(WorkoutFocus::Powerlifting));
        assert!(prompt.contains("Squat: 100kg, Bench: N/Akg, Deadlift: 140kg"));
        assert!(!prompt.contains("Split:"));
    }

    #[test]
    fn test_strength_prompt_uses_split() {
        let prompt = workout_plan_prompt(&workout_profile(WorkoutFocus::Strength));
        assert!(prompt.contains("Split: Push Pull Legs."));
        assert!(prompt.contains("No specific health issues."));
    }

    #[test]
    fn test_diet_prompt_skips_meals() {
        let profile = DietProfile {
            name: "Ravi".to_string(),
            gender: Gender::Male,
            age: 30,
            weight_kg: 72.5,
            height: "5ft 9in".to_string(),
            preference: DietPreference::Both,
            goal: DietGoal::FatLoss,
            health_conditions: Some("Thyroid".to_string()),
            routine: MealRoutine::default(),
        };
        let prompt = diet_plan_prompt(&profile, &["Lunch".to_string()]);
        assert!(prompt.contains("GOAL: Fat Loss. PREF: Veg + Non-Veg (Both)."));
        assert!(prompt.contains("SKIP: Lunch."));
        assert!(prompt.contains("HEALTH CONDITIONS: Thyroid."));
    }
}
