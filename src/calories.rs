//src/calories.rs
use crate::model::SetLog;

/// Body weight (kg) used when the user never configured one.
pub const DEFAULT_BODY_WEIGHT_KG: f64 = 70.0;

const KCAL_PER_VOLUME_KG: f64 = 0.0005;
const KCAL_PER_BODYWEIGHT_KG_PER_SET: f64 = 0.05;

/// Estimated burn for one finished exercise:
/// `round(volume * 0.0005 + body_weight * 0.05 * sets)`, rounded half up.
#[must_use]
pub fn estimate_calories(logs: &[SetLog], body_weight: f64) -> u32 {
    let total_volume: f64 = logs.iter().map(SetLog::volume).sum();
    let set_count = logs.len() as f64;
    let raw = total_volume * KCAL_PER_VOLUME_KG
        + body_weight * KCAL_PER_BODYWEIGHT_KG_PER_SET * set_count;
    // Inputs are non-negative, so floor(x + 0.5) is round-half-up.
    let rounded = (raw + 0.5).floor();
    if rounded.is_finite() && rounded > 0.0 {
        rounded as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(weight: f64, reps: u32) -> SetLog {
        SetLog {
            set_number: 1,
            weight,
            reps,
            suggestion: String::new(),
        }
    }

    #[test]
    fn test_two_set_example() {
        let logs = [log(20.0, 10), log(25.0, 8)];
        assert_eq!(estimate_calories(&logs, 70.0), 7);
    }

    #[test]
    fn test_rounds_half_up() {
        // 0 volume, 1 set at 10kg body weight: 0.5 -> 1
        assert_eq!(estimate_calories(&[log(0.0, 0)], 10.0), 1);
        // 1000 volume at 0 body weight: 0.5 -> 1
        assert_eq!(estimate_calories(&[log(100.0, 10)], 0.0), 1);
    }

    #[test]
    fn test_no_logs_burns_nothing() {
        assert_eq!(estimate_calories(&[], DEFAULT_BODY_WEIGHT_KG), 0);
    }
}
