use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

use futures::{StreamExt, stream::BoxStream};
use serde::{Deserialize, Serialize};
use tokio::{
    runtime::Handle,
    sync::watch,
    task::{JoinError, JoinHandle},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::{
    channel::StateObserver, error::AppError, executor::panic_message, state::PresentationState,
};

/// Visibility of the host that consumes presentation state, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Destroyed,
    Initialized,
    Created,
    Started,
    Resumed,
}

/// Threshold used when a host does not pick one.
pub const DEFAULT_MIN_VISIBILITY: Visibility = Visibility::Started;

/// Visibility state machine of one host. `Destroyed` is terminal.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    tx: Arc<watch::Sender<Visibility>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Visibility::Initialized);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Visibility {
        *self.tx.borrow()
    }

    /// Move to `next`. Returns `false` once the lifecycle is destroyed.
    pub fn move_to(&self, next: Visibility) -> bool {
        let mut accepted = true;
        self.tx.send_if_modified(|current| {
            if *current == Visibility::Destroyed {
                accepted = false;
                return false;
            }
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        if accepted {
            debug!(visibility = ?next, "lifecycle moved");
        }
        accepted
    }

    pub fn destroy(&self) {
        self.move_to(Visibility::Destroyed);
    }

    fn watch(&self) -> watch::Receiver<Visibility> {
        self.tx.subscribe()
    }
}

type FailureFallback = Box<dyn FnOnce(String) + Send>;

/// Reactions of one screen to the states of one operation.
///
/// `Idle` and `Loading` reach only `on_every_state`; `Error` goes to
/// `on_error` and `Success` to `on_success`.
pub struct StateCallbacks<T> {
    on_every_state: Option<Box<dyn FnMut(&PresentationState<T>) + Send>>,
    on_error: Box<dyn FnMut(&AppError) + Send>,
    on_success: Box<dyn FnMut(T) + Send>,
    on_consumer_failure: FailureFallback,
}

impl<T> StateCallbacks<T> {
    pub fn new(
        on_error: impl FnMut(&AppError) + Send + 'static,
        on_success: impl FnMut(T) + Send + 'static,
    ) -> Self {
        Self {
            on_every_state: None,
            on_error: Box::new(on_error),
            on_success: Box::new(on_success),
            on_consumer_failure: Box::new(|message| {
                error!(error = %message, "state consumer failed");
            }),
        }
    }

    /// Also see every state, including `Idle` and `Loading`, before dispatch.
    pub fn with_every_state(
        mut self,
        on_every_state: impl FnMut(&PresentationState<T>) + Send + 'static,
    ) -> Self {
        self.on_every_state = Some(Box::new(on_every_state));
        self
    }

    /// Where the message of a failed consumer is shown.
    pub fn with_failure_fallback(mut self, fallback: impl FnOnce(String) + Send + 'static) -> Self {
        self.on_consumer_failure = Box::new(fallback);
        self
    }

    fn dispatch(&mut self, state: PresentationState<T>) {
        if let Some(on_every_state) = self.on_every_state.as_mut() {
            on_every_state(&state);
        }
        match state {
            PresentationState::Idle | PresentationState::Loading => {}
            PresentationState::Error(error) => (self.on_error)(&error),
            PresentationState::Success(data) => (self.on_success)(data),
        }
    }
}

impl<T> std::fmt::Debug for StateCallbacks<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCallbacks")
            .field("on_every_state", &self.on_every_state.is_some())
            .finish_non_exhaustive()
    }
}

/// Running lifecycle-scoped observation.
#[derive(Debug)]
pub struct ObservationHandle {
    stop: CancellationToken,
    task: JoinHandle<()>,
}

impl ObservationHandle {
    /// End the observation. The producer behind the stream keeps running.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    pub async fn join(self) -> Result<(), JoinError> {
        self.task.await
    }
}

/// Collect a resubscribable stream only while `lifecycle` is at or above `min`.
///
/// `subscribe` is called every time the host becomes active; the previous
/// subscription is dropped when it falls below `min`. A panic inside
/// `collector` ends the observation and hands its message to `on_failure`.
/// The observation also ends when the lifecycle is destroyed, the stream
/// ends, or [`ObservationHandle::stop`] is called.
pub fn collect_while_active<I, S, C, F>(
    handle: &Handle,
    lifecycle: &Lifecycle,
    min: Visibility,
    mut subscribe: S,
    mut collector: C,
    on_failure: F,
) -> ObservationHandle
where
    I: Send + 'static,
    S: FnMut() -> BoxStream<'static, I> + Send + 'static,
    C: FnMut(I) + Send + 'static,
    F: FnOnce(String) + Send + 'static,
{
    let stop = CancellationToken::new();
    let task_stop = stop.clone();
    let mut visibility = lifecycle.watch();

    let task = handle.spawn(async move {
        'observation: loop {
            loop {
                let current = *visibility.borrow_and_update();
                if current == Visibility::Destroyed {
                    debug!("lifecycle destroyed; ending observation");
                    return;
                }
                if current >= min {
                    break;
                }
                tokio::select! {
                    _ = task_stop.cancelled() => return,
                    changed = visibility.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }

            debug!(?min, "host active; subscribing");
            let mut items = subscribe();
            loop {
                tokio::select! {
                    _ = task_stop.cancelled() => {
                        debug!("observation stopped");
                        return;
                    }
                    changed = visibility.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        if *visibility.borrow() < min {
                            debug!(?min, "host below threshold; unsubscribing");
                            continue 'observation;
                        }
                    }
                    item = items.next() => {
                        let Some(item) = item else {
                            debug!("observed stream ended");
                            return;
                        };
                        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| collector(item))) {
                            let message = panic_message(payload);
                            error!(error = %message, "state consumer panicked; routing to fallback");
                            on_failure(message);
                            return;
                        }
                    }
                }
            }
        }
    });

    ObservationHandle { stop, task }
}

/// Dispatch the states of `observer` to `callbacks` while the host is active.
///
/// Each activation replays the latest state first.
pub fn observe_while_active<T>(
    handle: &Handle,
    observer: StateObserver<T>,
    lifecycle: &Lifecycle,
    min: Visibility,
    mut callbacks: StateCallbacks<T>,
) -> ObservationHandle
where
    T: Clone + Send + Sync + 'static,
{
    let on_failure = std::mem::replace(&mut callbacks.on_consumer_failure, Box::new(|_| {}));

    collect_while_active(
        handle,
        lifecycle,
        min,
        move || observer.subscribe().into_stream(),
        move |state| callbacks.dispatch(state),
        on_failure,
    )
}
