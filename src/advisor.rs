//src/advisor.rs
use std::fmt;

/// Coaching hint attached to each logged set. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suggestion {
    IncreaseWeight,
    MaintainWeight,
    DecreaseWeight,
}

impl Suggestion {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::IncreaseWeight => "Great job! Increase weight by 2.5kg next set.",
            Self::MaintainWeight => "Maintain weight.",
            Self::DecreaseWeight => "Decrease weight slightly to hit target reps.",
        }
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

const RANGE_DASHES: [char; 2] = ['-', '\u{2013}'];

fn leading_number(text: &str) -> Option<u32> {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Upper bound of a rep range: "8-12" -> 12, "10" -> 10, "10-12 reps" -> 12.
///
/// The part after the first dash (or the whole string when there is none) is
/// read by its leading digits. Returns `None` for ranges like "AMRAP".
#[must_use]
pub fn rep_ceiling(target_reps: &str) -> Option<u32> {
    let upper = target_reps
        .split(RANGE_DASHES)
        .nth(1)
        .filter(|part| !part.trim().is_empty())
        .unwrap_or(target_reps);
    leading_number(upper)
}

/// Lower bound of a rep range ("8-12" -> 8). `None` for a single number.
#[must_use]
pub fn rep_floor(target_reps: &str) -> Option<u32> {
    let (lower, _) = target_reps.split_once(RANGE_DASHES)?;
    leading_number(lower)
}

/// Suggestion for the next set given the reps just performed.
///
/// Above the ceiling means the weight is too light. Falling short of both the
/// range floor and two reps under the ceiling means it is too heavy. An
/// unreadable range always yields `MaintainWeight`.
#[must_use]
pub fn advise(reps: u32, target_reps: &str) -> Suggestion {
    let Some(ceiling) = rep_ceiling(target_reps) else {
        return Suggestion::MaintainWeight;
    };
    let near_ceiling = i64::from(ceiling) - 2;
    let too_few = rep_floor(target_reps)
        .map_or(near_ceiling, |floor| near_ceiling.min(i64::from(floor)));
    if reps > ceiling {
        Suggestion::IncreaseWeight
    } else if i64::from(reps) < too_few {
        Suggestion::DecreaseWeight
    } else {
        Suggestion::MaintainWeight
    }
}
