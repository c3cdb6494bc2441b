use std::fmt;

use client_core::{DataMapper, Video, Workout};
use serde::{Deserialize, Serialize};
use url::Url;

/// `get_video` response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoData {
    pub id: u32,
    pub duration: u32,
    /// Server-relative path of the file, for example `/videos/5.mp4`.
    pub link: String,
}

impl VideoData {
    /// Convert into the domain model, resolving `link` against `base_url`.
    pub fn into_video(self, base_url: &Url) -> Video {
        Video {
            id: self.id,
            duration: self.duration,
            link: resolve_link(base_url, &self.link),
        }
    }
}

/// Join `link` onto the API root, dropping everything up to its first `/`.
///
/// A link without any `/` is appended as-is.
pub fn resolve_link(base_url: &Url, link: &str) -> String {
    let relative = link.split_once('/').map_or(link, |(_, rest)| rest);
    format!("{}{relative}", base_url.as_str())
}

/// Duration field that the API sends either as a number or as text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DurationValue {
    Number(u64),
    Text(String),
}

impl fmt::Display for DurationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// One element of the `get_workouts` response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutData {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub workout_type: u32,
    pub duration: DurationValue,
}

impl DataMapper<Workout> for WorkoutData {
    fn map_to_domain(self) -> Workout {
        Workout {
            id: self.id,
            title: self.title,
            description: self.description,
            workout_type: self.workout_type,
            duration: self.duration.to_string(),
        }
    }
}

/// Bookmarked workout as kept in the local record store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedWorkoutRecord {
    pub id: u32,
    pub title: String,
    pub description: Option<String>,
    pub workout_type: u32,
    pub duration: String,
}

impl From<Workout> for SavedWorkoutRecord {
    fn from(workout: Workout) -> Self {
        Self {
            id: workout.id,
            title: workout.title,
            description: workout.description,
            workout_type: workout.workout_type,
            duration: workout.duration,
        }
    }
}

impl DataMapper<Workout> for SavedWorkoutRecord {
    fn map_to_domain(self) -> Workout {
        Workout {
            id: self.id,
            title: self.title,
            description: self.description,
            workout_type: self.workout_type,
            duration: self.duration,
        }
    }
}
