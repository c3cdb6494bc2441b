mod config;
mod logging;
mod screen;
mod view_model;

use std::{
    process::ExitCode,
    sync::{Arc, Mutex},
    time::Duration,
};

use client_core::{
    GetVideoByIdUseCase, GetWorkoutListUseCase, Lifecycle, ObserveSavedWorkoutsUseCase,
    RequestExecutor, Visibility,
};
use client_http::{LocalSavedWorkoutRepository, SavedWorkoutRecord, WorkoutsClient};
use client_platform::{InMemoryRecordStore, ScopedRecordStore};
use config::ConsoleConfig;
use futures::StreamExt;
use screen::{ConsoleSurface, ScreenBinding, bind_screen, render_video, render_workouts};
use tokio::{runtime::Handle, time::timeout};
use tracing::{error, info, warn};
use view_model::{VideoViewModel, WorkoutListViewModel};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let config = match ConsoleConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(base_url = %config.base_url, "starting workouts console");

    let handle = Handle::current();
    let client = match WorkoutsClient::new(
        &config.http_client_config(),
        RequestExecutor::new(handle.clone()),
    ) {
        Ok(client) => client,
        Err(err) => {
            error!(error = %err, "failed to build http client");
            return ExitCode::FAILURE;
        }
    };
    let bookmarks = LocalSavedWorkoutRepository::new(ScopedRecordStore::new(
        InMemoryRecordStore::<SavedWorkoutRecord>::default(),
        "workouts-console",
    ));

    let list = WorkoutListViewModel::new(
        handle.clone(),
        GetWorkoutListUseCase::new(Arc::new(client.workouts)),
        ObserveSavedWorkoutsUseCase::new(Arc::new(bookmarks)),
    );
    let video = VideoViewModel::new(
        handle.clone(),
        GetVideoByIdUseCase::new(Arc::new(client.videos)),
    );

    let lifecycle = Lifecycle::new();
    lifecycle.move_to(Visibility::Created);
    let mut list_screen = bind_screen(
        &handle,
        list.workouts_state(),
        &lifecycle,
        config.show_content_on_success,
        Arc::new(Mutex::new(ConsoleSurface::new("workouts"))),
        render_workouts,
    );
    let mut video_screen = bind_screen(
        &handle,
        video.video_state(),
        &lifecycle,
        config.show_content_on_success,
        Arc::new(Mutex::new(ConsoleSurface::new("video"))),
        render_video,
    );
    lifecycle.move_to(Visibility::Resumed);

    if let Err(err) = list.get_workouts().await {
        error!(error = %err, "workout publisher failed");
    }
    settle(&mut list_screen, "workouts").await;

    let workouts = list.loaded_workouts();
    if let Some(first) = workouts.first() {
        match list.set_saved(first, true) {
            Ok(()) => {
                let saved = list.saved_state().next().await.unwrap_or_default();
                let count = saved.iter().flatten().count();
                info!(count, "bookmarked workouts");
            }
            Err(err) => warn!(error = %err, "failed to bookmark workout"),
        }
    }

    match config.video_id.or_else(|| workouts.first().map(|workout| workout.id)) {
        Some(id) => {
            if let Err(err) = video.get_video(id).await {
                error!(error = %err, "video publisher failed");
            }
            settle(&mut video_screen, "video").await;
        }
        None => warn!("no video to open: WORKOUTS_VIDEO_ID unset and no workouts listed"),
    }

    lifecycle.destroy();
    for binding in [list_screen, video_screen] {
        binding.stop();
        if let Err(err) = binding.into_observation().join().await {
            warn!(error = %err, "screen observation ended abnormally");
        }
    }

    if video.loaded_video().is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn settle(binding: &mut ScreenBinding, screen: &'static str) {
    if timeout(SETTLE_TIMEOUT, binding.wait_settled(0)).await.is_err() {
        warn!(screen, "screen did not render a result in time");
    }
}
