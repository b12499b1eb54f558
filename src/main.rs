//src/main.rs
mod cli; // Keep cli module for parsing args

use anyhow::{bail, Context, Result};
use chrono::Local;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use std::io::{self, stdout};

use gym_tracker_lib::{
    group_by_day, session_for_plan_day, CurrentLifts, DietProfile, ExerciseTarget, HistoryRecord, KeyValueStore, MachinePhase,
    MealRoutine, MuscleGroup, SessionMachine, SessionStats, TrackerService, WorkoutProfile,
    WorkoutSession,
};

fn main() -> Result<()> {
    // --- Check for completion generation request FIRST ---
    let cli_args = cli::parse_args(); // Parse arguments once
    let export_csv = cli_args.export_csv;

    let log_level = if cli_args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(io::stderr)
        .init();

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command(); // Get the command structure
        let bin_name = cmd.get_name().to_string(); // Get the binary name

        eprintln!("Generating completion script for {shell}..."); // Print to stderr
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout()); // Print script to stdout
        return Ok(()); // Exit after generating script
    }

    // Initialize the application service (loads config, opens the store)
    let mut service =
        TrackerService::initialize().context("Failed to initialize application service")?;
    let header_color = service.config.theme.header_color();

    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {
            // This case is handled above, but keep it exhaustive
            unreachable!("Completion generation should have exited already");
        }

        // --- Starting a session ---
        cli::Commands::New { focus, count } => {
            let coach = service.coach()?;
            let session = service.generate_session(&coach, &focus, count)?;
            let machine = service.start_session(session)?;
            print_warmup(machine.session(), header_color);
        }
        cli::Commands::Manual { focus, exercises } => {
            if focus.trim().is_empty() {
                bail!("Focus cannot be empty.");
            }
            let session =
                WorkoutSession::new(focus.trim(), exercises, WorkoutSession::default_warmup());
            let machine = service.start_session(session)?;
            print_warmup(machine.session(), header_color);
        }
        cli::Commands::Repeat { id } => {
            let session = service.repeat_from_history(&id)?;
            let machine = service.start_session(session)?;
            print_warmup(machine.session(), header_color);
        }
        cli::Commands::FromPlan { id, day } => {
            let coach = service.coach()?;
            let plan = service.structure_plan(&coach, &id)?;
            match day {
                None => {
                    let mut table = new_table(vec!["Day", "Name", "Focus", "Exercises"], header_color);
                    for (i, plan_day) in plan.days.iter().enumerate() {
                        table.add_row(vec![
                            Cell::new(i + 1),
                            Cell::new(&plan_day.day_name),
                            Cell::new(&plan_day.focus),
                            Cell::new(plan_day.exercises.len()),
                        ]);
                    }
                    println!("{table}");
                    println!("Start a day with: gym-tracker from-plan {id} --day <N>");
                }
                Some(day) => {
                    let session = session_for_plan_day(&plan, day)?;
                    let machine = service.start_session(session)?;
                    print_warmup(machine.session(), header_color);
                }
            }
        }

        // --- Running a session ---
        cli::Commands::Status => match service.resume()? {
            None => println!("No workout in progress."),
            Some(mut machine) => print_status(&mut machine, header_color)?,
        },
        cli::Commands::Begin => {
            let mut machine = service.active_session()?;
            machine.start_workout()?;
            print_status(&mut machine, header_color)?;
        }
        cli::Commands::Log { weight, reps } => {
            let mut machine = service.active_session()?;
            let log = machine.log_set(weight, reps)?;
            println!(
                "Set {} logged: {}kg x {}. {}",
                log.set_number, log.weight, log.reps, log.suggestion
            );
            if let Some(slot) = machine.current_slot() {
                if slot.is_complete() {
                    println!(
                        "All {} sets of '{}' done. Run `gym-tracker next` to continue.",
                        slot.target.target_sets,
                        slot.name()
                    );
                }
            }
        }
        cli::Commands::Next => {
            let mut machine = service.active_session()?;
            match machine.advance_exercise()? {
                MachinePhase::Summary => print_summary(machine.session(), header_color),
                _ => print_status(&mut machine, header_color)?,
            }
        }
        cli::Commands::Replace {
            name,
            sets,
            reps,
            rest,
        } => {
            let target = match name {
                Some(name) => {
                    let target = ExerciseTarget::new(name.trim(), sets, reps, rest);
                    let mut machine = service.active_session()?;
                    machine.replace_exercise(target.clone())?;
                    target
                }
                None => {
                    let coach = service.coach()?;
                    service.replace_with_alternative(&coach)?
                }
            };
            println!(
                "Now doing: {} ({} sets x {}, rest {})",
                target.name, target.target_sets, target.target_reps, target.rest_time
            );
        }
        cli::Commands::Finish => {
            let record = service.finish_session()?;
            if let Some(session) = record.session() {
                print_summary(session, header_color);
            }
            println!("Saved to history as {}", record.id());
        }
        cli::Commands::Abandon => {
            service.abandon_session()?;
            println!("Workout abandoned. Nothing was saved to history.");
        }
        cli::Commands::SuggestFocus => match service.suggest_push_focus()? {
            Some(focus) => println!(
                "Last push day was {}. Next up: {}",
                focus.other(),
                focus.session_title()
            ),
            None => println!("No recommendation yet; log a 'Push Day (Chest Focused)' or 'Push Day (Shoulder Focused)' session first."),
        },

        // --- Plans ---
        cli::Commands::Diet {
            name,
            gender,
            age,
            weight,
            height,
            preference,
            goal,
            health,
            wakeup,
            breakfast,
            lunch,
            snack,
            post_workout,
            dinner,
            skipped_meals,
        } => {
            if age == 0 || weight <= 0.0 {
                bail!("Age and weight must be positive.");
            }
            let profile = DietProfile {
                name,
                gender,
                age,
                weight_kg: weight,
                height,
                preference,
                goal,
                health_conditions: health,
                routine: MealRoutine {
                    wakeup_time: wakeup,
                    breakfast,
                    lunch,
                    evening_snack: snack,
                    post_workout,
                    dinner,
                },
            };
            let coach = service.coach()?;
            let record = service.write_diet_plan(&coach, &profile, &skipped_meals)?;
            print_plan(&record);
        }
        cli::Commands::Workout {
            name,
            gender,
            days,
            minutes,
            focus,
            experience,
            split,
            health,
            squat,
            bench,
            deadlift,
        } => {
            if !(1..=7).contains(&days) {
                bail!("Days per week must be between 1 and 7.");
            }
            let profile = WorkoutProfile {
                name,
                gender,
                days_per_week: days,
                minutes_per_day: minutes,
                focus,
                experience,
                split,
                health_conditions: health,
                current_lifts: CurrentLifts {
                    squat,
                    bench,
                    deadlift,
                },
            };
            let coach = service.coach()?;
            let record = service.write_workout_plan(&coach, &profile)?;
            print_plan(&record);
        }

        // --- History ---
        cli::Commands::History { kind } => {
            let records = service.list_history(kind.map(Into::into))?;
            if export_csv {
                print_history_csv(&records)?;
            } else if records.is_empty() {
                println!("No history yet.");
            } else {
                print_history_table(&records, header_color);
            }
        }
        cli::Commands::ShowHistory { id } => {
            let record = service.find_history(&id)?;
            match record.session() {
                Some(session) => print_summary(session, header_color),
                None => print_plan(&record),
            }
        }
        cli::Commands::DeleteHistory { id } => {
            service.delete_history(&id)?;
            println!("Deleted history entry {id}");
        }

        // --- Misc ---
        cli::Commands::SetBodyweight { weight } => {
            service.set_bodyweight(weight)?;
            println!(
                "Body weight set to {weight}kg in {:?}",
                service.get_config_path()
            );
        }
        cli::Commands::DbPath => {
            println!("Database file is located at: {:?}", service.get_db_path());
        }
    }

    Ok(())
}

fn new_table(headers: Vec<&str>, header_color: Color) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .into_iter()
                .map(|h| Cell::new(h).fg(header_color))
                .collect::<Vec<_>>(),
        );
    table
}

fn print_exercise_list(session: &WorkoutSession, header_color: Color) {
    let mut table = new_table(vec!["#", "Exercise", "Sets", "Reps", "Rest", "Logged"], header_color);
    for (i, slot) in session.exercises.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(slot.name()),
            Cell::new(slot.target.target_sets),
            Cell::new(&slot.target.target_reps),
            Cell::new(&slot.target.rest_time),
            Cell::new(slot.logs.len()),
        ]);
    }
    println!("{table}");
}

fn print_warmup(session: &WorkoutSession, header_color: Color) {
    println!("Workout: {}", session.target_muscle);
    println!("Warmup:");
    for item in &session.warmup {
        println!("  - {item}");
    }
    print_exercise_list(session, header_color);
    println!("Run `gym-tracker begin` when you are warmed up.");
}

fn print_status<S: KeyValueStore>(
    machine: &mut SessionMachine<'_, S>,
    header_color: Color,
) -> Result<()> {
    match machine.phase() {
        MachinePhase::Warmup => print_warmup(machine.session(), header_color),
        MachinePhase::Summary => {
            print_summary(machine.session(), header_color);
            println!("Run `gym-tracker finish` to save it.");
        }
        MachinePhase::Closed => println!("This workout is closed."),
        MachinePhase::Active { index } => {
            let total = machine.session().exercises.len();
            let best = machine.previous_best()?;
            let Some(slot) = machine.current_slot() else {
                return Ok(());
            };
            println!(
                "Exercise {}/{}: {} ({} sets x {}, rest {})",
                index + 1,
                total,
                slot.name(),
                slot.target.target_sets,
                slot.target.target_reps,
                slot.target.rest_time
            );
            match best {
                Some(best) => println!("Previous best: {best}"),
                None => println!("Previous best: none yet"),
            }
            if !slot.logs.is_empty() {
                let mut table = new_table(vec!["Set", "Weight (kg)", "Reps"], header_color);
                for log in &slot.logs {
                    table.add_row(vec![
                        Cell::new(log.set_number),
                        Cell::new(log.weight),
                        Cell::new(log.reps),
                    ]);
                }
                println!("{table}");
            }
            if let Some(last) = slot.last_log() {
                println!("Tip: {}", last.suggestion);
            }
        }
    }
    Ok(())
}

fn print_summary(session: &WorkoutSession, header_color: Color) {
    let stats = SessionStats::of(session);
    println!("{} - Workout Complete", session.target_muscle);
    let mut table = new_table(vec!["Exercise", "Set", "Weight (kg)", "Reps"], header_color);
    for slot in &session.exercises {
        for log in &slot.logs {
            table.add_row(vec![
                Cell::new(slot.name()),
                Cell::new(log.set_number),
                Cell::new(log.weight),
                Cell::new(log.reps),
            ]);
        }
    }
    println!("{table}");
    println!(
        "Exercises: {} | Sets: {} | Volume: {:.1}kg | Calories: {}",
        stats.exercises,
        stats.sets_completed,
        stats.total_volume,
        stats
            .calories_burned
            .map_or_else(|| "-".to_string(), |c| format!("{c} kcal"))
    );
}

fn print_plan(record: &HistoryRecord) {
    println!("{} ({})", record.title(), record.id());
    println!();
    println!("{}", record.plan_text().unwrap_or_default());
}

fn print_history_table(records: &[HistoryRecord], header_color: Color) {
    let mut table = new_table(vec!["ID", "Date", "Kind", "Title", "Group", "Sets", "Calories"], header_color);
    for record in records.iter().filter(|r| r.session().is_none()) {
        table.add_row(vec![
            Cell::new(record.id()),
            Cell::new(record.date().with_timezone(&Local).format("%Y-%m-%d %H:%M")),
            Cell::new(record.kind()),
            Cell::new(record.title()),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new("-"),
        ]);
    }
    for group in group_by_day(records, &Local::now()) {
        table.add_row(vec![Cell::new(&group.label).add_attribute(Attribute::Bold)]);
        for record in group.records {
            let Some(session) = record.session() else {
                continue;
            };
            let stats = SessionStats::of(session);
            table.add_row(vec![
                Cell::new(record.id()),
                Cell::new(record.date().with_timezone(&Local).format("%H:%M")),
                Cell::new(record.kind()),
                Cell::new(record.title()),
                Cell::new(MuscleGroup::classify(record.title())),
                Cell::new(stats.sets_completed),
                Cell::new(
                    stats
                        .calories_burned
                        .map_or_else(|| "-".to_string(), |c| c.to_string()),
                ),
            ]);
        }
    }
    println!("{table}");
}

fn print_history_csv(records: &[HistoryRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());

    // Write header
    writer.write_record([
        "ID",
        "Date_UTC",
        "Kind",
        "Title",
        "Exercises",
        "Sets",
        "Volume_kg",
        "Calories",
    ])?;

    for record in records {
        let stats = record.session().map(SessionStats::of);
        writer.write_record(&[
            record.id().to_string(),
            record.date().to_rfc3339(), // Use ISO 8601/RFC3339 for CSV
            record.kind().to_string(),
            record.title().to_string(),
            stats.map_or_else(String::new, |s| s.exercises.to_string()),
            stats.map_or_else(String::new, |s| s.sets_completed.to_string()),
            stats.map_or_else(String::new, |s| format!("{:.2}", s.total_volume)),
            stats
                .and_then(|s| s.calories_burned)
                .map_or_else(String::new, |c| c.to_string()),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
