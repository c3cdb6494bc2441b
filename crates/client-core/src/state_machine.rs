use std::{
    panic::AssertUnwindSafe,
    sync::{Mutex, PoisonError},
};

use futures::{FutureExt, StreamExt};
use tokio::{runtime::Handle, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    channel::{StateHolder, StateObserver},
    either::Either,
    error::{AppError, NetworkError},
    executor::{RemoteStream, panic_message},
    state::PresentationState,
};

/// What happens to an in-flight invocation when the operation is invoked again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InFlightPolicy {
    /// Earlier invocations keep running and may still publish; the last
    /// writer wins.
    #[default]
    Overlap,
    /// A new invocation cancels the previous publisher before publishing
    /// `Loading`, so only the latest invocation reaches the holder.
    SingleFlight,
}

/// Drive `holder` through `Loading` and then the terminal state of `results`.
///
/// `Loading` is published before this function returns. The stream is
/// consumed on `handle`; each failure becomes `Error`, each success becomes
/// `Success(mapper(value))`, and a panic while polling or mapping becomes
/// `Error(Unexpected)`.
pub fn run_and_publish<S, T, M>(
    handle: &Handle,
    results: RemoteStream<S>,
    holder: &StateHolder<T>,
    mapper: M,
) -> JoinHandle<()>
where
    S: Send + 'static,
    T: Send + Sync + 'static,
    M: FnMut(S) -> T + Send + 'static,
{
    spawn_publisher(
        handle,
        results,
        holder,
        mapper,
        |_: &T| {},
        CancellationToken::new(),
    )
}

fn spawn_publisher<S, T, M, P>(
    handle: &Handle,
    mut results: RemoteStream<S>,
    holder: &StateHolder<T>,
    mut mapper: M,
    mut on_published: P,
    stop: CancellationToken,
) -> JoinHandle<()>
where
    S: Send + 'static,
    T: Send + Sync + 'static,
    M: FnMut(S) -> T + Send + 'static,
    P: FnMut(&T) + Send + 'static,
{
    holder.set_unless_cancelled(PresentationState::Loading, &stop);
    let holder = holder.clone();

    handle.spawn(async move {
        let drive = async {
            while let Some(result) = results.next().await {
                let next = match result {
                    Either::Failure(error) => PresentationState::Error(AppError::Network(error)),
                    Either::Success(value) => PresentationState::Success(mapper(value)),
                };
                let published = holder.set_unless_cancelled_then(next, &stop, |state| {
                    if let PresentationState::Success(value) = state {
                        on_published(value);
                    }
                });
                if !published {
                    return;
                }
            }
        };

        tokio::select! {
            _ = stop.cancelled() => {
                debug!("publisher superseded by a newer invocation");
            }
            outcome = AssertUnwindSafe(drive).catch_unwind() => {
                if let Err(payload) = outcome {
                    let message = panic_message(payload);
                    warn!(error = %message, "result stream panicked; publishing unexpected error");
                    holder.set_unless_cancelled(
                        PresentationState::Error(AppError::Network(NetworkError::unexpected(message))),
                        &stop,
                    );
                }
            }
        }
    })
}

/// Owns the state holder of one screen-level operation.
#[derive(Debug)]
pub struct PresentationStateMachine<T> {
    handle: Handle,
    holder: StateHolder<T>,
    policy: InFlightPolicy,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl<T> PresentationStateMachine<T>
where
    T: Send + Sync + 'static,
{
    /// Create an `Idle` state machine publishing from `handle`.
    pub fn new(handle: Handle) -> Self {
        Self::with_policy(handle, InFlightPolicy::default())
    }

    pub fn with_policy(handle: Handle, policy: InFlightPolicy) -> Self {
        Self {
            handle,
            holder: StateHolder::new(),
            policy,
            in_flight: Mutex::new(None),
        }
    }

    /// Read-only view for consumers.
    pub fn observer(&self) -> StateObserver<T> {
        self.holder.observer()
    }

    /// Run `results` and publish its outcome, mapping successes with `mapper`.
    pub fn run_and_publish<S, M>(&self, results: RemoteStream<S>, mapper: M) -> JoinHandle<()>
    where
        S: Send + 'static,
        M: FnMut(S) -> T + Send + 'static,
    {
        self.run_and_publish_then(results, mapper, |_: &T| {})
    }

    /// Like [`PresentationStateMachine::run_and_publish`], calling
    /// `on_published` with every success that actually reached the holder.
    /// Results of a superseded invocation never reach it.
    pub fn run_and_publish_then<S, M, P>(
        &self,
        results: RemoteStream<S>,
        mapper: M,
        on_published: P,
    ) -> JoinHandle<()>
    where
        S: Send + 'static,
        M: FnMut(S) -> T + Send + 'static,
        P: FnMut(&T) + Send + 'static,
    {
        let stop = CancellationToken::new();
        if self.policy == InFlightPolicy::SingleFlight {
            let mut slot = self
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = slot.replace(stop.clone()) {
                debug!("cancelling in-flight invocation");
                previous.cancel();
            }
        }

        spawn_publisher(&self.handle, results, &self.holder, mapper, on_published, stop)
    }

    /// Run `results` and publish successes unchanged.
    pub fn collect_network_request(&self, results: RemoteStream<T>) -> JoinHandle<()> {
        self.run_and_publish(results, |value| value)
    }
}

impl<T: Clone> PresentationStateMachine<T> {
    /// Snapshot of the current state.
    pub fn state(&self) -> PresentationState<T> {
        self.holder.current()
    }
}

#[cfg(test)]
mod tests {
    use std::{io, sync::Arc, time::Duration};

    use futures::stream;
    use tokio::{sync::oneshot, time::timeout};

    use super::*;
    use crate::{
        executor::RequestExecutor,
        transport::{ErrorBody, TransportResponse},
    };

    async fn finish(task: JoinHandle<()>) {
        timeout(Duration::from_secs(2), task)
            .await
            .expect("publisher timeout")
            .expect("publisher task should not panic");
    }

    fn gated_request(
        executor: &RequestExecutor,
        value: u32,
    ) -> (oneshot::Sender<()>, RemoteStream<u32>) {
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let stream = executor.network_request_without_mapping(move || async move {
            let _ = release_rx.await;
            Ok::<_, io::Error>(TransportResponse::success(200, Some(value)))
        });
        (release_tx, stream)
    }

    #[tokio::test]
    async fn publishes_loading_then_mapped_success() {
        let executor = RequestExecutor::new(Handle::current());
        let machine = PresentationStateMachine::new(Handle::current());
        let mut subscription = machine.observer().subscribe();
        assert_eq!(subscription.next().await, Some(PresentationState::Idle));

        let (release, results) = gated_request(&executor, 21);
        let task = machine.run_and_publish(results, |value| value * 2);

        assert_eq!(machine.state(), PresentationState::Loading);
        let observed = timeout(Duration::from_secs(2), subscription.next())
            .await
            .expect("loading timeout");
        assert_eq!(observed, Some(PresentationState::Loading));

        release.send(()).expect("request should be waiting");
        finish(task).await;
        assert_eq!(machine.state(), PresentationState::Success(42));
    }

    #[tokio::test]
    async fn not_found_response_ends_in_api_error() {
        let executor = RequestExecutor::new(Handle::current());
        let holder = StateHolder::<String>::new();
        let results = executor.network_request_without_mapping(|| async {
            Ok::<_, io::Error>(TransportResponse::<String>::failure(
                404,
                ErrorBody::Text("not found".into()),
                None,
            ))
        });

        finish(run_and_publish(&Handle::current(), results, &holder, |v| v)).await;
        assert_eq!(
            holder.current(),
            PresentationState::Error(AppError::Network(NetworkError::api_with_code(
                "not found",
                404
            )))
        );
    }

    #[tokio::test]
    async fn request_error_transitions_loading_to_unexpected() {
        let executor = RequestExecutor::new(Handle::current());
        let machine = PresentationStateMachine::<u8>::new(Handle::current());
        let results = executor.network_request_without_mapping(|| async {
            Err::<TransportResponse<u8>, _>(io::Error::new(io::ErrorKind::TimedOut, "read timed out"))
        });

        let task = machine.collect_network_request(results);
        assert_eq!(machine.state(), PresentationState::Loading);

        finish(task).await;
        assert_eq!(
            machine.state(),
            PresentationState::Error(AppError::Network(NetworkError::unexpected(
                "read timed out"
            )))
        );
    }

    #[tokio::test]
    async fn reinvocation_resets_to_loading_after_success() {
        let executor = RequestExecutor::new(Handle::current());
        let machine = PresentationStateMachine::new(Handle::current());

        let (release, results) = gated_request(&executor, 1);
        let task = machine.collect_network_request(results);
        release.send(()).expect("request should be waiting");
        finish(task).await;
        assert_eq!(machine.state(), PresentationState::Success(1));

        let (_release, results) = gated_request(&executor, 2);
        let _task = machine.collect_network_request(results);
        assert_eq!(machine.state(), PresentationState::Loading);
    }

    #[tokio::test]
    async fn panicking_mapper_publishes_unexpected_error() {
        let machine = PresentationStateMachine::<u8>::new(Handle::current());
        let results: RemoteStream<u8> = stream::iter(vec![Either::Success(1)]).boxed();

        finish(machine.run_and_publish(results, |_| -> u8 { panic!("mapper exploded") })).await;
        assert_eq!(
            machine.state(),
            PresentationState::Error(AppError::Network(NetworkError::unexpected(
                "mapper exploded"
            )))
        );
    }

    #[tokio::test]
    async fn overlap_policy_lets_the_last_writer_win() {
        let executor = RequestExecutor::new(Handle::current());
        let machine = PresentationStateMachine::new(Handle::current());

        let (release_first, first) = gated_request(&executor, 1);
        let first_task = machine.collect_network_request(first);
        let (release_second, second) = gated_request(&executor, 2);
        let second_task = machine.collect_network_request(second);

        release_second.send(()).expect("second request should be waiting");
        finish(second_task).await;
        assert_eq!(machine.state(), PresentationState::Success(2));

        release_first.send(()).expect("first request should be waiting");
        finish(first_task).await;
        assert_eq!(machine.state(), PresentationState::Success(1));
    }

    #[tokio::test]
    async fn single_flight_policy_drops_superseded_results() {
        let executor = RequestExecutor::new(Handle::current());
        let machine =
            PresentationStateMachine::with_policy(Handle::current(), InFlightPolicy::SingleFlight);

        let (release_first, first) = gated_request(&executor, 1);
        let first_task = machine.collect_network_request(first);
        let (release_second, second) = gated_request(&executor, 2);
        let second_task = machine.collect_network_request(second);

        finish(first_task).await;
        let _ = release_first.send(());

        release_second.send(()).expect("second request should be waiting");
        finish(second_task).await;
        assert_eq!(machine.state(), PresentationState::Success(2));
    }

    #[tokio::test]
    async fn superseded_success_never_reaches_publish_hook() {
        let executor = RequestExecutor::new(Handle::current());
        let machine =
            PresentationStateMachine::with_policy(Handle::current(), InFlightPolicy::SingleFlight);
        let published = Arc::new(Mutex::new(Vec::new()));

        let (release_first, first) = gated_request(&executor, 1);
        let sink = Arc::clone(&published);
        let first_task = machine.run_and_publish_then(first, |value| value, move |value: &u32| {
            sink.lock().expect("sink lock").push(*value);
        });
        let (release_second, second) = gated_request(&executor, 2);
        let sink = Arc::clone(&published);
        let second_task = machine.run_and_publish_then(second, |value| value, move |value: &u32| {
            sink.lock().expect("sink lock").push(*value);
        });

        let _ = release_first.send(());
        finish(first_task).await;
        release_second.send(()).expect("second request should be waiting");
        finish(second_task).await;

        assert_eq!(machine.state(), PresentationState::Success(2));
        assert_eq!(*published.lock().expect("sink lock"), vec![2]);
    }
}
