//src/history.rs
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumIter};
use uuid::Uuid;

use crate::model::WorkoutSession;

const PUSH_DAY_MARKER: &str = "Push Day";
const CHEST_FOCUS_MARKER: &str = "Chest Focused";
const SHOULDER_FOCUS_MARKER: &str = "Shoulder Focused";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum PlanKind {
    #[strum(serialize = "diet")]
    Diet,
    #[strum(serialize = "workout")]
    Workout,
    #[strum(serialize = "tracker")]
    Tracker,
}

/// A generated long-form plan (diet or workout), stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub id: String,
    pub date: DateTime<Utc>,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerRecord {
    pub id: String,
    pub date: DateTime<Utc>,
    pub title: String,
    pub content: WorkoutSession,
}

/// One entry of the history aggregate. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HistoryRecord {
    Diet(PlanRecord),
    Workout(PlanRecord),
    Tracker(TrackerRecord),
}

fn new_record_id() -> String {
    // v7 ids sort by creation time
    Uuid::now_v7().to_string()
}

impl HistoryRecord {
    pub fn diet(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Diet(PlanRecord {
            id: new_record_id(),
            date: Utc::now(),
            title: title.into(),
            content: content.into(),
        })
    }

    pub fn workout(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Workout(PlanRecord {
            id: new_record_id(),
            date: Utc::now(),
            title: title.into(),
            content: content.into(),
        })
    }

    /// Wraps a finished session; the title is the session's focus label.
    #[must_use]
    pub fn tracker(session: WorkoutSession) -> Self {
        Self::Tracker(TrackerRecord {
            id: new_record_id(),
            date: session.end_time.unwrap_or_else(Utc::now),
            title: session.target_muscle.clone(),
            content: session,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Diet(r) | Self::Workout(r) => &r.id,
            Self::Tracker(r) => &r.id,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Diet(r) | Self::Workout(r) => &r.title,
            Self::Tracker(r) => &r.title,
        }
    }

    #[must_use]
    pub const fn date(&self) -> DateTime<Utc> {
        match self {
            Self::Diet(r) | Self::Workout(r) => r.date,
            Self::Tracker(r) => r.date,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> PlanKind {
        match self {
            Self::Diet(_) => PlanKind::Diet,
            Self::Workout(_) => PlanKind::Workout,
            Self::Tracker(_) => PlanKind::Tracker,
        }
    }

    #[must_use]
    pub const fn session(&self) -> Option<&WorkoutSession> {
        match self {
            Self::Tracker(r) => Some(&r.content),
            _ => None,
        }
    }

    #[must_use]
    pub fn plan_text(&self) -> Option<&str> {
        match self {
            Self::Diet(r) | Self::Workout(r) => Some(&r.content),
            Self::Tracker(_) => None,
        }
    }
}

/// Heaviest set ever logged for an exercise, with the reps of that set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonalBest {
    pub weight: f64,
    pub reps: u32,
}

impl fmt::Display for PersonalBest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}kg x {}", self.weight, self.reps)
    }
}

fn same_exercise(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Scans every tracker session for `exercise_name` (case-insensitive, trimmed) and
/// returns the heaviest set.
///
/// `records` is most-recent-first, so the scan walks it in reverse to go in
/// chronological order. On equal weights the earliest set wins.
#[must_use]
pub fn personal_best(records: &[HistoryRecord], exercise_name: &str) -> Option<PersonalBest> {
    let mut best: Option<PersonalBest> = None;
    let logs = records
        .iter()
        .rev()
        .filter_map(HistoryRecord::session)
        .flat_map(|session| session.exercises.iter())
        .filter(|slot| same_exercise(slot.name(), exercise_name))
        .flat_map(|slot| slot.logs.iter());
    for log in logs {
        if best.map_or(true, |b| log.weight > b.weight) {
            best = Some(PersonalBest {
                weight: log.weight,
                reps: log.reps,
            });
        }
    }
    best
}

/// Sub-focus alternated between push days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PushFocus {
    #[strum(serialize = "Chest Focused")]
    Chest,
    #[strum(serialize = "Shoulder Focused")]
    Shoulder,
}

impl PushFocus {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Chest => Self::Shoulder,
            Self::Shoulder => Self::Chest,
        }
    }

    /// Focus label for a new session, e.g. "Push Day (Shoulder Focused)".
    #[must_use]
    pub fn session_title(self) -> String {
        format!("{PUSH_DAY_MARKER} ({self})")
    }
}

/// Recommends the push-day sub-focus not used by the latest push-day session.
///
/// Looks only at the most recent tracker record titled "Push Day"; if that
/// title names neither focus there is no recommendation.
#[must_use]
pub fn recommend_push_focus(records: &[HistoryRecord]) -> Option<PushFocus> {
    let last_push = records
        .iter()
        .filter(|r| r.kind() == PlanKind::Tracker)
        .find(|r| r.title().contains(PUSH_DAY_MARKER))?;
    let title = last_push.title();
    if title.contains(CHEST_FOCUS_MARKER) {
        Some(PushFocus::Chest.other())
    } else if title.contains(SHOULDER_FOCUS_MARKER) {
        Some(PushFocus::Shoulder.other())
    } else {
        None
    }
}

/// Tracker records only, in stored order.
pub fn tracker_sessions(records: &[HistoryRecord]) -> impl Iterator<Item = &HistoryRecord> {
    records.iter().filter(|r| r.kind() == PlanKind::Tracker)
}

#[derive(Debug)]
pub struct DayGroup<'a> {
    pub label: String,
    pub records: Vec<&'a HistoryRecord>,
}

/// Groups tracker sessions by calendar day in `now`'s time zone, newest day first.
/// Days are labelled "Today", "Yesterday" or e.g. "Mon, March 3".
#[must_use]
pub fn group_by_day<'a, Tz: TimeZone>(
    records: &'a [HistoryRecord],
    now: &DateTime<Tz>,
) -> Vec<DayGroup<'a>> {
    let tz = now.timezone();
    let today = now.date_naive();
    let yesterday = today - Duration::days(1);

    let mut sessions: Vec<&HistoryRecord> = tracker_sessions(records).collect();
    sessions.sort_by(|a, b| b.date().cmp(&a.date()));

    let mut groups: Vec<DayGroup<'a>> = Vec::new();
    let mut current_day = None;
    for record in sessions {
        let day = record.date().with_timezone(&tz).date_naive();
        if current_day != Some(day) {
            let label = if day == today {
                "Today".to_string()
            } else if day == yesterday {
                "Yesterday".to_string()
            } else {
                day.format("%a, %B %-d").to_string()
            };
            groups.push(DayGroup {
                label,
                records: Vec::new(),
            });
            current_day = Some(day);
        }
        if let Some(group) = groups.last_mut() {
            group.records.push(record);
        }
    }
    groups
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionStats {
    pub exercises: usize,
    pub sets_completed: usize,
    pub total_volume: f64,
    pub calories_burned: Option<u32>,
}

impl SessionStats {
    #[must_use]
    pub fn of(session: &WorkoutSession) -> Self {
        Self {
            exercises: session.exercises.len(),
            sets_completed: session.completed_sets(),
            total_volume: session
                .exercises
                .iter()
                .flat_map(|slot| slot.logs.iter())
                .map(crate::model::SetLog::volume)
                .sum(),
            calories_burned: session.calories_burned,
        }
    }
}

/// Coarse muscle family of a session title, used to tag history listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum MuscleGroup {
    Push,
    Pull,
    Legs,
    Arms,
    Other,
}

impl MuscleGroup {
    #[must_use]
    pub fn classify(title: &str) -> Self {
        let t = title.to_lowercase();
        if t.contains("chest") || t.contains("push") {
            Self::Push
        } else if t.contains("back") || t.contains("pull") {
            Self::Pull
        } else if t.contains("leg") || t.contains("squat") {
            Self::Legs
        } else if t.contains("arm") || t.contains("bicep") {
            Self::Arms
        } else {
            Self::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExerciseTarget, SetLog};
    use chrono::TimeZone;

    fn session_with(title: &str, name: &str, sets: &[(f64, u32)]) -> WorkoutSession {
        let mut session = WorkoutSession::new(
            title,
            vec![ExerciseTarget::new(name, 3, "8-12", "90s")],
            Vec::new(),
        );
        for (i, (weight, reps)) in sets.iter().enumerate() {
            session.exercises[0].logs.push(SetLog {
                set_number: i as u32 + 1,
                weight: *weight,
                reps: *reps,
                suggestion: String::new(),
            });
        }
        session
    }

    #[test]
    fn test_personal_best_tie_keeps_earliest() {
        // Most-recent-first: index 0 is newest.
        let records = vec![
            HistoryRecord::tracker(session_with("Chest", "Bench Press", &[(60.0, 3)])),
            HistoryRecord::tracker(session_with("Chest", "bench press ", &[(60.0, 8)])),
        ];
        let best = personal_best(&records, "Bench Press").unwrap();
        assert_eq!(best.reps, 8);
    }

    #[test]
    fn test_personal_best_ignores_other_exercises_and_plans() {
        let records = vec![
            HistoryRecord::diet("Diet", "<p>eat</p>"),
            HistoryRecord::tracker(session_with("Legs", "Squat", &[(140.0, 3)])),
        ];
        assert_eq!(personal_best(&records, "Bench Press"), None);
    }

    #[test]
    fn test_push_focus_alternates() {
        let records = vec![
            HistoryRecord::tracker(session_with("Legs", "Squat", &[])),
            HistoryRecord::tracker(session_with("Push Day (Chest Focused)", "Bench", &[])),
            HistoryRecord::tracker(session_with("Push Day (Shoulder Focused)", "OHP", &[])),
        ];
        assert_eq!(recommend_push_focus(&records), Some(PushFocus::Shoulder));
        assert_eq!(
            PushFocus::Shoulder.session_title(),
            "Push Day (Shoulder Focused)"
        );
    }

    #[test]
    fn test_push_focus_needs_marker() {
        let plain = vec![HistoryRecord::tracker(session_with("Push Day", "Bench", &[]))];
        assert_eq!(recommend_push_focus(&plain), None);
        assert_eq!(recommend_push_focus(&[]), None);
    }

    #[test]
    fn test_group_by_day_labels() {
        let now = Utc.with_ymd_and_hms(2025, 3, 5, 18, 0, 0).unwrap();
        let mut today = session_with("Chest", "Bench", &[]);
        today.end_time = Some(now - Duration::hours(2));
        let mut yesterday = session_with("Back", "Row", &[]);
        yesterday.end_time = Some(now - Duration::days(1));
        let mut older = session_with("Legs", "Squat", &[]);
        older.end_time = Some(Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap());

        let records = vec![
            HistoryRecord::tracker(older),
            HistoryRecord::workout("Plan", "text"),
            HistoryRecord::tracker(today),
            HistoryRecord::tracker(yesterday),
        ];
        let groups = group_by_day(&records, &now);
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Today", "Yesterday", "Mon, March 3"]);
        assert!(groups.iter().all(|g| g.records.len() == 1));
    }

    #[test]
    fn test_muscle_group_classification() {
        assert_eq!(MuscleGroup::classify("Push Day (Chest Focused)"), MuscleGroup::Push);
        assert_eq!(MuscleGroup::classify("Back & Biceps"), MuscleGroup::Pull);
        assert_eq!(MuscleGroup::classify("Legs"), MuscleGroup::Legs);
        assert_eq!(MuscleGroup::classify("Arms"), MuscleGroup::Arms);
        assert_eq!(MuscleGroup::classify("Cardio"), MuscleGroup::Other);
    }

    #[test]
    fn test_record_serializes_with_type_tag() {
        let record = HistoryRecord::workout("PPL", "<table></table>");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "workout");
        assert_eq!(json["content"], "<table></table>");
    }
}
