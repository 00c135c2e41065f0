//! Core types for IronNotes

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// One workout occurrence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: String,
    /// Unix timestamp (seconds) the session started
    pub date: i64,
    pub notes: String,
    /// Seconds, written once when the session is finished
    pub duration: i64,
    pub is_completed: bool,
}

impl Session {
    pub fn new(notes: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date: chrono::Utc::now().timestamp(),
            notes,
            duration: 0,
            is_completed: false,
        }
    }
}

/// A named movement inside a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub session_id: String,
    pub name: String,
    pub muscle_group: MuscleGroup,
    /// Insertion order within the session
    pub position: i64,
}

impl Exercise {
    pub fn new(session_id: &str, name: String, muscle_group: MuscleGroup, position: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            name,
            muscle_group,
            position,
        }
    }
}

/// One logged set. `is_pr` is the only field that changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetEntry {
    pub id: String,
    pub exercise_id: String,
    pub weight: f64,
    pub reps: u32,
    /// Ordinal position of the set within its exercise, starting at 1
    pub set_count: u32,
    pub is_single_arm: bool,
    /// Unix timestamp (seconds) the set was logged
    pub timestamp: i64,
    pub is_pr: bool,
}

impl SetEntry {
    pub fn new(exercise_id: &str, weight: f64, reps: u32, set_count: u32, is_single_arm: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            exercise_id: exercise_id.to_string(),
            weight,
            reps,
            set_count,
            is_single_arm,
            timestamp: chrono::Utc::now().timestamp(),
            is_pr: false,
        }
    }

    pub fn estimated_1rm(&self) -> f64 {
        crate::pr::estimated_1rm(self.weight, self.reps)
    }

    /// Weight moved across the set (weight x reps)
    pub fn volume(&self) -> f64 {
        self.weight * self.reps as f64
    }
}

/// A set joined with the name of its exercise and the session it belongs to.
///
/// This is the shape the PR engine reads history in.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SetRecord {
    pub set: SetEntry,
    pub exercise_name: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MuscleGroup {
    Chest,
    Back,
    Legs,
    Shoulders,
    Arms,
    Core,
    #[serde(rename = "Full Body")]
    FullBody,
}

impl MuscleGroup {
    pub const ALL: [MuscleGroup; 7] = [
        MuscleGroup::Chest,
        MuscleGroup::Back,
        MuscleGroup::Legs,
        MuscleGroup::Shoulders,
        MuscleGroup::Arms,
        MuscleGroup::Core,
        MuscleGroup::FullBody,
    ];

    /// Groups an exercise can be filed under (split-level categories excluded)
    pub fn selectable() -> impl Iterator<Item = MuscleGroup> {
        Self::ALL.into_iter().filter(|g| *g != MuscleGroup::FullBody)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "Chest",
            MuscleGroup::Back => "Back",
            MuscleGroup::Legs => "Legs",
            MuscleGroup::Shoulders => "Shoulders",
            MuscleGroup::Arms => "Arms",
            MuscleGroup::Core => "Core",
            MuscleGroup::FullBody => "Full Body",
        }
    }
}

impl FromStr for MuscleGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', '_'], " ");
        Self::ALL
            .into_iter()
            .find(|g| g.as_str().to_lowercase() == wanted)
            .ok_or_else(|| {
                format!(
                    "Invalid muscle group: '{}'. Valid options: chest, back, legs, shoulders, arms, core, full-body",
                    s
                )
            })
    }
}

impl std::fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Weight unit preference. Stored weights are plain numbers in this unit.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lb,
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lb => "lb",
        }
    }
}

impl FromStr for WeightUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kg" | "kgs" => Ok(WeightUnit::Kg),
            "lb" | "lbs" => Ok(WeightUnit::Lb),
            _ => Err(format!("Invalid weight unit: '{}'. Valid options: kg, lb", s)),
        }
    }
}

impl std::fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muscle_group_from_str() {
        assert_eq!("chest".parse::<MuscleGroup>().unwrap(), MuscleGroup::Chest);
        assert_eq!("LEGS".parse::<MuscleGroup>().unwrap(), MuscleGroup::Legs);
        assert_eq!("full-body".parse::<MuscleGroup>().unwrap(), MuscleGroup::FullBody);
        assert_eq!("Full Body".parse::<MuscleGroup>().unwrap(), MuscleGroup::FullBody);
        assert!("glutes".parse::<MuscleGroup>().is_err());
    }

    #[test]
    fn test_selectable_excludes_full_body() {
        let groups: Vec<_> = MuscleGroup::selectable().collect();
        assert_eq!(groups.len(), 6);
        assert!(!groups.contains(&MuscleGroup::FullBody));
    }

    #[test]
    fn test_muscle_group_serde_name() {
        let json = serde_json::to_string(&MuscleGroup::FullBody).unwrap();
        assert_eq!(json, "\"Full Body\"");
    }

    #[test]
    fn test_weight_unit_round_trip() {
        assert_eq!("KG".parse::<WeightUnit>().unwrap(), WeightUnit::Kg);
        assert_eq!("lbs".parse::<WeightUnit>().unwrap(), WeightUnit::Lb);
        assert_eq!(WeightUnit::Lb.to_string(), "lb");
        assert!("stone".parse::<WeightUnit>().is_err());
    }

    #[test]
    fn test_set_volume_and_ordinal() {
        let set = SetEntry::new("ex-1", 100.0, 10, 1, false);
        assert_eq!(set.volume(), 1000.0);
        assert_eq!(set.set_count, 1);
        assert!(!set.is_pr);
    }
}
