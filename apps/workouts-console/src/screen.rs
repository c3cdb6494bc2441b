//! Binds view-model state to a rendering surface inside a lifecycle window.

use std::sync::{Arc, Mutex, PoisonError};

use client_core::{
    AppError, Lifecycle, ObservationHandle, StateCallbacks, StateObserver, Video, ViewEffect,
    Visibility, Workout, consumer_failure, effects_for, observe_while_active,
};
use tokio::{runtime::Handle, sync::watch};
use tracing::debug;

/// Where a screen's effects and content end up.
pub trait Surface: Send + 'static {
    fn apply(&mut self, effect: &ViewEffect);

    fn show_line(&mut self, line: &str);
}

/// Surface that writes to stdout.
#[derive(Debug, Clone)]
pub struct ConsoleSurface {
    screen: &'static str,
}

impl ConsoleSurface {
    pub fn new(screen: &'static str) -> Self {
        Self { screen }
    }
}

impl Surface for ConsoleSurface {
    fn apply(&mut self, effect: &ViewEffect) {
        match effect {
            ViewEffect::SetLoaderVisible(true) => println!("[{}] loading...", self.screen),
            ViewEffect::SetLoaderVisible(false) => {}
            ViewEffect::SetContentVisible(visible) => {
                debug!(screen = self.screen, visible, "content visibility");
            }
            ViewEffect::HideSkeleton => debug!(screen = self.screen, "skeleton hidden"),
            ViewEffect::ShowMessage(message) => println!("[{}] ! {message}", self.screen),
        }
    }

    fn show_line(&mut self, line: &str) {
        println!("[{}] {line}", self.screen);
    }
}

pub type SharedSurface<S> = Arc<Mutex<S>>;

fn with_surface<S>(surface: &SharedSurface<S>, f: impl FnOnce(&mut S)) {
    let mut guard = surface.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard);
}

/// Live binding of one screen.
#[derive(Debug)]
pub struct ScreenBinding {
    observation: ObservationHandle,
    settled: watch::Receiver<u64>,
}

impl ScreenBinding {
    /// Wait until the screen has handled one more terminal state than
    /// `already_seen`. Returns the new count, or `None` if the binding ended.
    pub async fn wait_settled(&mut self, already_seen: u64) -> Option<u64> {
        let count = self
            .settled
            .wait_for(|count| *count > already_seen)
            .await
            .ok()?;
        Some(*count)
    }

    pub fn stop(&self) {
        self.observation.stop();
    }

    pub fn into_observation(self) -> ObservationHandle {
        self.observation
    }
}

/// Observe `observer` while `lifecycle` is at least `Started`.
///
/// Every state is turned into [`ViewEffect`]s; successful payloads are then
/// handed to `render`.
pub fn bind_screen<T, S, R>(
    handle: &Handle,
    observer: StateObserver<T>,
    lifecycle: &Lifecycle,
    show_content_on_success: bool,
    surface: SharedSurface<S>,
    mut render: R,
) -> ScreenBinding
where
    T: Clone + Send + Sync + 'static,
    S: Surface,
    R: FnMut(&mut S, T) + Send + 'static,
{
    let (settled_tx, settled) = watch::channel(0_u64);
    let settled_tx = Arc::new(settled_tx);

    let effects_surface = Arc::clone(&surface);
    let success_surface = Arc::clone(&surface);
    let success_settled = Arc::clone(&settled_tx);
    let error_settled = Arc::clone(&settled_tx);

    let callbacks = StateCallbacks::new(
        move |error: &AppError| {
            debug!(error = %error, "screen received error state");
            error_settled.send_modify(|count| *count += 1);
        },
        move |data: T| {
            with_surface(&success_surface, |surface| render(surface, data));
            success_settled.send_modify(|count| *count += 1);
        },
    )
    .with_every_state(move |state| {
        with_surface(&effects_surface, |surface| {
            for effect in effects_for(state, show_content_on_success) {
                surface.apply(&effect);
            }
        });
    })
    .with_failure_fallback(move |message| {
        with_surface(&surface, |surface| surface.apply(&consumer_failure(&message)));
        settled_tx.send_modify(|count| *count += 1);
    });

    let observation =
        observe_while_active(handle, observer, lifecycle, Visibility::Started, callbacks);
    ScreenBinding {
        observation,
        settled,
    }
}

pub fn render_workouts<S: Surface>(surface: &mut S, workouts: Vec<Workout>) {
    if workouts.is_empty() {
        surface.show_line("no workouts");
        return;
    }
    for workout in workouts {
        let description = workout.description.as_deref().unwrap_or("-");
        let duration = match workout.duration_minutes() {
            Some(minutes) => format!("{minutes} min"),
            None => workout.duration.clone(),
        };
        surface.show_line(&format!(
            "#{} {} ({duration}, type {}): {description}",
            workout.id, workout.title, workout.workout_type
        ));
    }
}

pub fn render_video<S: Surface>(surface: &mut S, video: Video) {
    surface.show_line(&format!(
        "video #{} ({} s): {}",
        video.id, video.duration, video.link
    ));
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use client_core::{NetworkError, PresentationState, StateHolder};
    use tokio::time::timeout;

    use super::*;

    #[derive(Debug, Default)]
    struct RecordingSurface {
        effects: Vec<ViewEffect>,
        lines: Vec<String>,
    }

    impl Surface for RecordingSurface {
        fn apply(&mut self, effect: &ViewEffect) {
            self.effects.push(effect.clone());
        }

        fn show_line(&mut self, line: &str) {
            self.lines.push(line.to_owned());
        }
    }

    fn started() -> Lifecycle {
        let lifecycle = Lifecycle::new();
        lifecycle.move_to(Visibility::Resumed);
        lifecycle
    }

    async fn settle(binding: &mut ScreenBinding, already_seen: u64) -> u64 {
        timeout(Duration::from_secs(2), binding.wait_settled(already_seen))
            .await
            .expect("settle timeout")
            .expect("binding should be alive")
    }

    fn workout(id: u32) -> Workout {
        Workout {
            id,
            title: "Core".into(),
            description: None,
            workout_type: 1,
            duration: "20".into(),
        }
    }

    #[tokio::test]
    async fn success_applies_effects_then_renders() {
        let holder = StateHolder::new();
        holder.set(PresentationState::Success(vec![workout(1)]));
        let surface = Arc::new(Mutex::new(RecordingSurface::default()));
        let lifecycle = started();

        let mut binding = bind_screen(
            &Handle::current(),
            holder.observer(),
            &lifecycle,
            true,
            Arc::clone(&surface),
            render_workouts,
        );
        assert_eq!(settle(&mut binding, 0).await, 1);

        let surface = surface.lock().expect("surface lock");
        assert_eq!(
            surface.effects,
            vec![
                ViewEffect::SetLoaderVisible(false),
                ViewEffect::SetContentVisible(true),
                ViewEffect::HideSkeleton,
            ]
        );
        assert_eq!(surface.lines, vec!["#1 Core (20 min, type 1): -".to_owned()]);
    }

    #[test]
    fn ranged_duration_is_rendered_verbatim() {
        let mut surface = RecordingSurface::default();
        let mut ranged = workout(2);
        ranged.duration = "30-35".into();
        ranged.description = Some("legs".into());

        render_workouts(&mut surface, vec![workout(1), ranged]);
        assert_eq!(
            surface.lines,
            vec![
                "#1 Core (20 min, type 1): -".to_owned(),
                "#2 Core (30-35, type 1): legs".to_owned(),
            ]
        );
    }

    #[tokio::test]
    async fn error_shows_message_and_empty_body_stays_silent() {
        let holder = StateHolder::<Vec<Workout>>::new();
        holder.set(PresentationState::Error(AppError::from(NetworkError::unexpected(
            "timeout",
        ))));
        let surface = Arc::new(Mutex::new(RecordingSurface::default()));
        let lifecycle = started();

        let mut binding = bind_screen(
            &Handle::current(),
            holder.observer(),
            &lifecycle,
            true,
            Arc::clone(&surface),
            render_workouts,
        );
        let seen = settle(&mut binding, 0).await;

        holder.set(PresentationState::Error(AppError::from(NetworkError::EmptyBody)));
        settle(&mut binding, seen).await;

        let surface = surface.lock().expect("surface lock");
        let messages: Vec<&ViewEffect> = surface
            .effects
            .iter()
            .filter(|effect| matches!(effect, ViewEffect::ShowMessage(_)))
            .collect();
        assert_eq!(messages, vec![&ViewEffect::ShowMessage("timeout".into())]);
        assert!(surface.lines.is_empty());
    }

    #[tokio::test]
    async fn render_panic_shows_fallback_message() {
        let holder = StateHolder::new();
        holder.set(PresentationState::Success(workout(3)));
        let surface = Arc::new(Mutex::new(RecordingSurface::default()));
        let lifecycle = started();

        let mut binding = bind_screen(
            &Handle::current(),
            holder.observer(),
            &lifecycle,
            false,
            Arc::clone(&surface),
            |_: &mut RecordingSurface, _: Workout| panic!("layout overflow"),
        );
        settle(&mut binding, 0).await;

        let surface = surface.lock().unwrap_or_else(PoisonError::into_inner);
        assert_eq!(
            surface.effects.last(),
            Some(&ViewEffect::ShowMessage("layout overflow".into()))
        );
    }

    #[test]
    fn video_renders_as_one_line() {
        let mut surface = RecordingSurface::default();
        render_video(
            &mut surface,
            Video {
                id: 4,
                duration: 95,
                link: "https://workouts.example.org/videos/4.mp4".into(),
            },
        );
        assert_eq!(
            surface.lines,
            vec!["video #4 (95 s): https://workouts.example.org/videos/4.mp4".to_owned()]
        );
    }
}
