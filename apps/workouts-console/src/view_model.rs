//! Screen-level owners of presentation state.

use std::sync::Arc;

use client_core::{
    AppError, GetVideoByIdUseCase, GetWorkoutListUseCase, InFlightPolicy, LocalStream,
    ObserveSavedWorkoutsUseCase, PresentationStateMachine, StateObserver, Video, Workout,
};
use tokio::{runtime::Handle, sync::watch, task::JoinHandle};
use tracing::debug;

/// Video screen: fetches one video and keeps the last one that loaded.
pub struct VideoViewModel {
    get_video: GetVideoByIdUseCase,
    video_state: PresentationStateMachine<Video>,
    loaded: Arc<watch::Sender<Option<Video>>>,
}

impl VideoViewModel {
    pub fn new(handle: Handle, get_video: GetVideoByIdUseCase) -> Self {
        let (loaded, _) = watch::channel(None);
        Self {
            get_video,
            video_state: PresentationStateMachine::new(handle),
            loaded: Arc::new(loaded),
        }
    }

    pub fn video_state(&self) -> StateObserver<Video> {
        self.video_state.observer()
    }

    /// Last successfully loaded video; survives later reloads and failures.
    pub fn loaded_video(&self) -> Option<Video> {
        self.loaded.borrow().clone()
    }

    pub fn get_video(&self, id: u32) -> JoinHandle<()> {
        debug!(id, "loading video");
        let loaded = Arc::clone(&self.loaded);
        self.video_state.run_and_publish_then(
            self.get_video.execute(id),
            |video: Video| video,
            move |video: &Video| {
                loaded.send_replace(Some(video.clone()));
            },
        )
    }
}

/// Workout list screen with local bookmarks.
///
/// Refreshing while a fetch is in flight supersedes the earlier fetch.
pub struct WorkoutListViewModel {
    get_workouts: GetWorkoutListUseCase,
    saved_workouts: ObserveSavedWorkoutsUseCase,
    workouts_state: PresentationStateMachine<Vec<Workout>>,
    loaded: Arc<watch::Sender<Vec<Workout>>>,
}

impl WorkoutListViewModel {
    pub fn new(
        handle: Handle,
        get_workouts: GetWorkoutListUseCase,
        saved_workouts: ObserveSavedWorkoutsUseCase,
    ) -> Self {
        let (loaded, _) = watch::channel(Vec::new());
        Self {
            get_workouts,
            saved_workouts,
            workouts_state: PresentationStateMachine::with_policy(
                handle,
                InFlightPolicy::SingleFlight,
            ),
            loaded: Arc::new(loaded),
        }
    }

    pub fn workouts_state(&self) -> StateObserver<Vec<Workout>> {
        self.workouts_state.observer()
    }

    pub fn loaded_workouts(&self) -> Vec<Workout> {
        self.loaded.borrow().clone()
    }

    pub fn get_workouts(&self) -> JoinHandle<()> {
        debug!("loading workouts");
        let loaded = Arc::clone(&self.loaded);
        self.workouts_state.run_and_publish_then(
            self.get_workouts.execute(),
            |workouts: Vec<Workout>| workouts,
            move |workouts: &Vec<Workout>| {
                loaded.send_replace(workouts.clone());
            },
        )
    }

    /// Bookmark or un-bookmark `workout`.
    pub fn set_saved(&self, workout: &Workout, saved: bool) -> Result<(), AppError> {
        if saved {
            self.saved_workouts.save(workout.clone())
        } else {
            self.saved_workouts.remove(workout.id)
        }
    }

    /// Saved state of every loaded workout, in list order.
    pub fn saved_state(&self) -> LocalStream<Vec<Option<Workout>>> {
        let ids = self.loaded.borrow().iter().map(|workout| workout.id).collect();
        self.saved_workouts.execute(ids)
    }
}
