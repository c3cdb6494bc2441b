use std::sync::Arc;

use crate::{
    error::AppError,
    executor::{LocalStream, RemoteStream},
    transport::ByteStream,
    types::{Video, Workout},
};

/// Remote source of workout videos.
pub trait VideoRepository: Send + Sync {
    fn get_video_by_id(&self, id: u32) -> RemoteStream<Video>;

    /// Stream the video file itself; the caller owns the returned bytes.
    fn open_video(&self, video: &Video) -> RemoteStream<ByteStream>;
}

/// Remote source of the workout catalogue.
pub trait WorkoutRepository: Send + Sync {
    fn get_workouts_list(&self) -> RemoteStream<Vec<Workout>>;
}

/// Local bookmarks of workouts.
pub trait SavedWorkoutRepository: Send + Sync {
    fn save(&self, workout: Workout) -> Result<(), AppError>;

    fn remove(&self, id: u32) -> Result<(), AppError>;

    /// Continuous stream of the saved workout with `id`, `None` while unsaved.
    fn observe_saved(&self, id: u32) -> LocalStream<Option<Workout>>;

    /// Continuous stream of the saved state of every id, in the given order.
    fn observe_saved_many(&self, ids: Vec<u32>) -> LocalStream<Vec<Option<Workout>>>;
}

#[derive(Clone)]
pub struct GetVideoByIdUseCase {
    repository: Arc<dyn VideoRepository>,
}

impl GetVideoByIdUseCase {
    pub fn new(repository: Arc<dyn VideoRepository>) -> Self {
        Self { repository }
    }

    pub fn execute(&self, id: u32) -> RemoteStream<Video> {
        self.repository.get_video_by_id(id)
    }
}

#[derive(Clone)]
pub struct GetWorkoutListUseCase {
    repository: Arc<dyn WorkoutRepository>,
}

impl GetWorkoutListUseCase {
    pub fn new(repository: Arc<dyn WorkoutRepository>) -> Self {
        Self { repository }
    }

    pub fn execute(&self) -> RemoteStream<Vec<Workout>> {
        self.repository.get_workouts_list()
    }
}

/// Saves, removes and observes bookmarked workouts.
#[derive(Clone)]
pub struct ObserveSavedWorkoutsUseCase {
    repository: Arc<dyn SavedWorkoutRepository>,
}

impl ObserveSavedWorkoutsUseCase {
    pub fn new(repository: Arc<dyn SavedWorkoutRepository>) -> Self {
        Self { repository }
    }

    /// Saved state of `ids`, re-emitted whenever any bookmark changes.
    pub fn execute(&self, ids: Vec<u32>) -> LocalStream<Vec<Option<Workout>>> {
        self.repository.observe_saved_many(ids)
    }

    pub fn observe_one(&self, id: u32) -> LocalStream<Option<Workout>> {
        self.repository.observe_saved(id)
    }

    pub fn save(&self, workout: Workout) -> Result<(), AppError> {
        self.repository.save(workout)
    }

    pub fn remove(&self, id: u32) -> Result<(), AppError> {
        self.repository.remove(id)
    }
}
