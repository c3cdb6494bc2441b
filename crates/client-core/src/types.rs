use serde::{Deserialize, Serialize};

/// Playable workout video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Video {
    /// Server-side video id.
    pub id: u32,
    /// Length in seconds.
    pub duration: u32,
    /// Absolute URL of the video file.
    pub link: String,
}

/// Workout listed by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Workout {
    /// Server-side workout id, also used to fetch its video.
    pub id: u32,
    pub title: String,
    /// Free text, omitted by the API for some workouts.
    pub description: Option<String>,
    /// Numeric workout category as reported by the API.
    pub workout_type: u32,
    /// Duration exactly as the API reports it, for example `"30"` or `"30-40"`.
    pub duration: String,
}

impl Workout {
    /// Duration in minutes, when the API reported a plain number.
    pub fn duration_minutes(&self) -> Option<u32> {
        self.duration.trim().parse().ok()
    }
}
