//! Personal record detection
//!
//! A set is a PR when its estimated one-rep max beats every other set ever
//! logged for the same exercise name. Within one session only the best set
//! keeps the flag, so a better set later in the session takes it over.
//!
//! Exercises whose name contains "assisted" are scored the other way round:
//! less assistance weight is the better lift.

use crate::types::{SetEntry, SetRecord};
use serde::Serialize;
use tracing::debug;

const ASSISTED_MARKER: &str = "assisted";

/// Outcome of evaluating one new set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrOutcome {
    pub is_pr: bool,
    /// Set that held the session PR and lost it to the new set
    pub demoted: Option<String>,
    /// Best estimated 1RM among the other sets of this exercise, if any
    pub historical_best: Option<f64>,
}

/// Brzycki estimate: `weight * 36 / (37 - reps)`
///
/// The denominator is clamped to 1 so rep counts of 36 and above yield a
/// large but finite value instead of dividing by zero or flipping sign.
pub fn estimated_1rm(weight: f64, reps: u32) -> f64 {
    if reps == 0 {
        return 0.0;
    }
    let denominator = (37.0 - reps as f64).max(1.0);
    weight * 36.0 / denominator
}

/// Whether lower weight is the better lift for this exercise name
pub fn is_assisted(exercise_name: &str) -> bool {
    exercise_name.to_lowercase().contains(ASSISTED_MARKER)
}

/// Direction-aware strict comparison
fn beats(candidate: f64, incumbent: f64, assisted: bool) -> bool {
    if assisted {
        candidate < incumbent
    } else {
        candidate > incumbent
    }
}

/// Best estimated 1RM of an exercise across `history`, direction-aware
pub fn best_estimated_1rm<'a, I>(exercise_name: &str, history: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a SetRecord>,
{
    let assisted = is_assisted(exercise_name);
    history
        .into_iter()
        .filter(|record| record.exercise_name == exercise_name)
        .map(|record| record.set.estimated_1rm())
        .reduce(|best, value| if beats(value, best, assisted) { value } else { best })
}

/// Decide whether `new_set` is a PR and update the flags accordingly
///
/// `history` is every recorded set joined with its exercise name and session;
/// it may or may not already contain `new_set` (matched by id and ignored).
/// At most two flags change: `new_set.is_pr`, and the `is_pr` of a same-session
/// holder in `history` that the new set displaces.
pub fn evaluate_and_mark(
    new_set: &mut SetEntry,
    exercise_name: &str,
    session_id: &str,
    history: &mut [SetRecord],
) -> PrOutcome {
    let assisted = is_assisted(exercise_name);
    let current = new_set.estimated_1rm();

    let historical_best = best_estimated_1rm(
        exercise_name,
        history.iter().filter(|record| record.set.id != new_set.id),
    );

    let holder = history.iter_mut().find(|record| {
        record.set.is_pr
            && record.set.id != new_set.id
            && record.exercise_name == exercise_name
            && record.session_id == session_id
    });

    let mut demoted = None;
    match holder {
        Some(holder) => {
            if beats(current, holder.set.estimated_1rm(), assisted) {
                holder.set.is_pr = false;
                new_set.is_pr = true;
                demoted = Some(holder.set.id.clone());
            } else {
                new_set.is_pr = false;
            }
        }
        None => {
            let sentinel = if assisted { f64::INFINITY } else { 0.0 };
            new_set.is_pr = beats(current, historical_best.unwrap_or(sentinel), assisted);
        }
    }

    debug!(
        exercise = exercise_name,
        estimated_1rm = current,
        ?historical_best,
        assisted,
        is_pr = new_set.is_pr,
        "Evaluated set for PR"
    );

    PrOutcome {
        is_pr: new_set.is_pr,
        demoted,
        historical_best,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, exercise: &str, session: &str, weight: f64, reps: u32, is_pr: bool) -> SetRecord {
        let mut set = SetEntry::new("ex", weight, reps, 1, false);
        set.id = id.to_string();
        set.is_pr = is_pr;
        SetRecord {
            set,
            exercise_name: exercise.to_string(),
            session_id: session.to_string(),
        }
    }

    fn new_set(id: &str, weight: f64, reps: u32) -> SetEntry {
        let mut set = SetEntry::new("ex", weight, reps, 1, false);
        set.id = id.to_string();
        set
    }

    #[test]
    fn test_brzycki_formula() {
        assert!((estimated_1rm(100.0, 1) - 100.0).abs() < 1e-9);
        assert!((estimated_1rm(100.0, 10) - 133.333_333).abs() < 1e-3);
        assert_eq!(estimated_1rm(100.0, 0), 0.0);
    }

    #[test]
    fn test_brzycki_denominator_is_clamped() {
        assert_eq!(estimated_1rm(10.0, 36), 360.0);
        assert_eq!(estimated_1rm(10.0, 37), 360.0);
        assert_eq!(estimated_1rm(10.0, 50), 360.0);
    }

    #[test]
    fn test_assisted_detection_is_case_insensitive_substring() {
        assert!(is_assisted("Assisted Pull-up"));
        assert!(is_assisted("machine ASSISTED dip"));
        assert!(!is_assisted("Pull-up"));
    }

    #[test]
    fn test_first_set_is_pr() {
        let mut set = new_set("a", 60.0, 8);
        let outcome = evaluate_and_mark(&mut set, "Bench Press", "s1", &mut []);
        assert!(set.is_pr);
        assert_eq!(outcome.historical_best, None);
    }

    #[test]
    fn test_first_assisted_set_is_pr() {
        let mut set = new_set("a", 40.0, 8);
        evaluate_and_mark(&mut set, "Assisted Dip", "s1", &mut []);
        assert!(set.is_pr);
    }

    #[test]
    fn test_first_bodyweight_set_is_not_pr() {
        // zero estimated 1RM never beats the zero sentinel
        let mut set = new_set("a", 0.0, 12);
        evaluate_and_mark(&mut set, "Push-up", "s1", &mut []);
        assert!(!set.is_pr);
    }

    #[test]
    fn test_new_set_in_history_is_ignored() {
        let mut history = vec![record("a", "Squat", "s1", 100.0, 5, false)];
        let mut set = new_set("a", 100.0, 5);
        evaluate_and_mark(&mut set, "Squat", "s1", &mut history);
        assert!(set.is_pr);
    }

    #[test]
    fn test_increasing_sets_in_session_move_the_flag() {
        let mut history: Vec<SetRecord> = Vec::new();

        for (i, weight) in [60.0, 70.0, 80.0, 90.0].into_iter().enumerate() {
            let id = format!("set-{}", i);
            let mut set = new_set(&id, weight, 5);
            evaluate_and_mark(&mut set, "Squat", "s1", &mut history);
            assert!(set.is_pr, "set {} should hold the PR", i);
            history.push(SetRecord {
                set,
                exercise_name: "Squat".to_string(),
                session_id: "s1".to_string(),
            });

            let holders: Vec<_> = history.iter().filter(|r| r.set.is_pr).collect();
            assert_eq!(holders.len(), 1);
            assert_eq!(holders[0].set.id, id);
        }
    }

    #[test]
    fn test_weaker_set_in_session_keeps_existing_holder() {
        let mut history = vec![record("a", "Squat", "s1", 100.0, 5, true)];
        let mut set = new_set("b", 90.0, 5);
        let outcome = evaluate_and_mark(&mut set, "Squat", "s1", &mut history);
        assert!(!set.is_pr);
        assert!(history[0].set.is_pr);
        assert_eq!(outcome.demoted, None);
    }

    #[test]
    fn test_equal_set_in_session_does_not_take_flag() {
        let mut history = vec![record("a", "Squat", "s1", 100.0, 5, true)];
        let mut set = new_set("b", 100.0, 5);
        evaluate_and_mark(&mut set, "Squat", "s1", &mut history);
        assert!(!set.is_pr);
        assert!(history[0].set.is_pr);
    }

    #[test]
    fn test_better_set_demotes_session_holder() {
        let mut history = vec![
            record("old", "Squat", "s0", 150.0, 5, true),
            record("a", "Squat", "s1", 100.0, 5, true),
        ];
        let mut set = new_set("b", 110.0, 5);
        let outcome = evaluate_and_mark(&mut set, "Squat", "s1", &mut history);

        // session override wins even below the all-time best
        assert!(set.is_pr);
        assert_eq!(outcome.demoted.as_deref(), Some("a"));
        assert!(!history[1].set.is_pr);
        assert!(history[0].set.is_pr, "other sessions are untouched");
    }

    #[test]
    fn test_assisted_lower_weight_wins() {
        let mut history = vec![record("a", "Assisted Pull-up", "s1", 40.0, 8, true)];
        let mut set = new_set("b", 20.0, 8);
        evaluate_and_mark(&mut set, "Assisted Pull-up", "s1", &mut history);
        assert!(set.is_pr);
        assert!(!history[0].set.is_pr);
    }

    #[test]
    fn test_unassisted_same_weights_keep_heavier() {
        let mut history = vec![record("a", "Pull-up", "s1", 40.0, 8, true)];
        let mut set = new_set("b", 20.0, 8);
        evaluate_and_mark(&mut set, "Pull-up", "s1", &mut history);
        assert!(!set.is_pr);
        assert!(history[0].set.is_pr);
    }

    #[test]
    fn test_cross_session_equal_is_not_pr() {
        let mut history = vec![record("a", "Deadlift", "s1", 180.0, 3, true)];
        let mut set = new_set("b", 180.0, 3);
        let outcome = evaluate_and_mark(&mut set, "Deadlift", "s2", &mut history);
        assert!(!set.is_pr);
        assert!(outcome.historical_best.is_some());
    }

    #[test]
    fn test_cross_session_exceeding_is_pr() {
        let mut history = vec![record("a", "Deadlift", "s1", 180.0, 3, true)];
        let mut set = new_set("b", 182.5, 3);
        let outcome = evaluate_and_mark(&mut set, "Deadlift", "s2", &mut history);
        assert!(set.is_pr);
        // the old session keeps its own flag
        assert!(history[0].set.is_pr);
        assert_eq!(outcome.demoted, None);
    }

    #[test]
    fn test_other_exercises_do_not_count() {
        let mut history = vec![record("a", "Deadlift", "s1", 250.0, 1, true)];
        let mut set = new_set("b", 100.0, 5);
        evaluate_and_mark(&mut set, "Squat", "s1", &mut history);
        assert!(set.is_pr);
        assert!(history[0].set.is_pr);
    }

    #[test]
    fn test_best_estimated_1rm_direction() {
        let history = vec![
            record("a", "Assisted Dip", "s1", 40.0, 5, false),
            record("b", "Assisted Dip", "s1", 25.0, 5, false),
        ];
        let best = best_estimated_1rm("Assisted Dip", &history).unwrap();
        assert!((best - estimated_1rm(25.0, 5)).abs() < 1e-9);
    }
}
