// src/cli.rs
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use gym_tracker_lib::{
    DietGoal, DietPreference, ExerciseTarget, ExperienceLevel, Gender, PlanKind, WorkoutFocus,
    WorkoutSplit,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan, run and log gym sessions with an AI coach", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
    /// Print history listings as CSV instead of a table
    #[arg(long, global = true)]
    pub export_csv: bool,
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanKindCli {
    Diet,
    Workout,
    Tracker,
}

impl From<PlanKindCli> for PlanKind {
    fn from(value: PlanKindCli) -> Self {
        match value {
            PlanKindCli::Diet => Self::Diet,
            PlanKindCli::Workout => Self::Workout,
            PlanKindCli::Tracker => Self::Tracker,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a session with the AI coach and start it (warmup first)
    New {
        /// Muscle group or session type (e.g., "Legs", "Push Day")
        #[arg(short, long)]
        focus: String,
        /// Number of exercises (defaults to `default_exercise_count` from the config)
        #[arg(short, long)]
        count: Option<u32>,
    },
    /// Start a hand-written session
    Manual {
        #[arg(short, long)]
        focus: String,
        /// Exercise as "Name;sets;reps;rest" (e.g., "Squat;4;6-8;120s"). Repeat for more.
        #[arg(short, long = "exercise", value_parser = parse_exercise_target)]
        exercises: Vec<ExerciseTarget>,
    },
    /// Start a fresh copy of a finished session from history
    Repeat {
        /// History id of a tracked workout
        id: String,
    },
    /// Split a saved workout plan into days and start one of them
    FromPlan {
        /// History id of a workout plan
        id: String,
        /// Day to start (1-based). Lists the days when omitted.
        #[arg(short, long)]
        day: Option<usize>,
    },
    /// Show where the active session stands
    Status,
    /// Finish the warmup and move to the first exercise
    Begin,
    /// Log a set for the current exercise
    Log {
        /// Weight lifted (kg)
        #[arg(short, long)]
        weight: f64,
        /// Repetitions performed
        #[arg(short, long)]
        reps: u32,
    },
    /// Move on once every set of the current exercise is logged
    Next,
    /// Swap the current exercise. Asks the AI coach unless --name is given.
    Replace {
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long, requires = "name", default_value_t = 3)]
        sets: u32,
        #[arg(short, long, requires = "name", default_value = "8-12")]
        reps: String,
        #[arg(long, requires = "name", default_value = "60s")]
        rest: String,
    },
    /// Save the finished session to history
    Finish,
    /// Drop the active session without saving it
    Abandon,
    /// Recommend chest or shoulder focus for the next push day
    SuggestFocus,
    /// Generate a diet plan and save it to history
    Diet {
        #[arg(long)]
        name: String,
        #[arg(long, value_enum)]
        gender: Gender,
        #[arg(long)]
        age: u32,
        /// Body weight in kg
        #[arg(long)]
        weight: f64,
        /// Height in any notation (e.g., "5'9", "175cm")
        #[arg(long)]
        height: String,
        #[arg(long, value_enum)]
        preference: DietPreference,
        #[arg(long, value_enum)]
        goal: DietGoal,
        /// Medical conditions or allergies
        #[arg(long)]
        health: Option<String>,
        #[arg(long)]
        wakeup: Option<String>,
        #[arg(long)]
        breakfast: Option<String>,
        #[arg(long)]
        lunch: Option<String>,
        #[arg(long)]
        snack: Option<String>,
        #[arg(long)]
        post_workout: Option<String>,
        #[arg(long)]
        dinner: Option<String>,
        /// Meal to leave out (e.g., "Breakfast"). Repeat for more.
        #[arg(long = "skip")]
        skipped_meals: Vec<String>,
    },
    /// Generate a workout plan and save it to history
    Workout {
        #[arg(long)]
        name: String,
        #[arg(long, value_enum)]
        gender: Gender,
        #[arg(long, default_value_t = 4)]
        days: u32,
        #[arg(long, default_value_t = 60)]
        minutes: u32,
        #[arg(long, value_enum)]
        focus: WorkoutFocus,
        #[arg(long, value_enum)]
        experience: ExperienceLevel,
        #[arg(long, value_enum)]
        split: Option<WorkoutSplit>,
        #[arg(long)]
        health: Option<String>,
        /// Current one-rep maxes (kg), used for powerlifting plans
        #[arg(long)]
        squat: Option<f64>,
        #[arg(long)]
        bench: Option<f64>,
        #[arg(long)]
        deadlift: Option<f64>,
    },
    /// List saved plans and workouts
    History {
        #[arg(short, long, value_enum)]
        kind: Option<PlanKindCli>,
    },
    /// Show one history entry in full
    ShowHistory { id: String },
    /// Delete one history entry
    DeleteHistory { id: String },
    /// Set your body weight (kg) for calorie estimates
    SetBodyweight { weight: f64 },
    /// Show the path to the database file
    DbPath,
    GenerateCompletion {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parses "Name;sets;reps;rest". Reps and rest are optional.
fn parse_exercise_target(value: &str) -> Result<ExerciseTarget, String> {
    let mut parts = value.split(';').map(str::trim);
    let name = parts.next().unwrap_or_default();
    if name.is_empty() {
        return Err("exercise name cannot be empty".to_string());
    }
    let sets = match parts.next() {
        Some(s) if !s.is_empty() => s
            .parse::<u32>()
            .map_err(|_| format!("invalid set count '{s}'"))?,
        _ => 3,
    };
    if sets == 0 {
        return Err("set count must be at least 1".to_string());
    }
    let reps = parts.next().filter(|s| !s.is_empty()).unwrap_or("8-12");
    let rest = parts.next().filter(|s| !s.is_empty()).unwrap_or("60s");
    Ok(ExerciseTarget::new(name, sets, reps, rest))
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exercise_target() {
        let target = parse_exercise_target("Squat; 4; 6-8; 120s").unwrap();
        assert_eq!(target.name, "Squat");
        assert_eq!(target.target_sets, 4);
        assert_eq!(target.target_reps, "6-8");
        assert_eq!(target.rest_time, "120s");

        let defaults = parse_exercise_target("Plank").unwrap();
        assert_eq!(defaults.target_sets, 3);
        assert_eq!(defaults.target_reps, "8-12");

        assert!(parse_exercise_target(";3").is_err());
        assert!(parse_exercise_target("Row;zero").is_err());
        assert!(parse_exercise_target("Row;0").is_err());
    }

    #[test]
    fn test_cli_is_well_formed() {
        build_cli_command().debug_assert();
    }
}
