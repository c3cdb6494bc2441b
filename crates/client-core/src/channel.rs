use std::sync::Arc;

use futures::{StreamExt, stream::BoxStream};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::state::PresentationState;

/// Hot, replay-1 slot holding the current [`PresentationState`].
///
/// Clones share the same slot; they exist so publisher tasks can write from
/// the background runtime. Readers go through [`StateObserver`].
#[derive(Debug)]
pub struct StateHolder<T> {
    tx: Arc<watch::Sender<PresentationState<T>>>,
}

impl<T> Clone for StateHolder<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T> Default for StateHolder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> StateHolder<T> {
    /// Create a holder in the `Idle` state.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(PresentationState::Idle);
        Self { tx: Arc::new(tx) }
    }

    /// Replace the current state and notify every observer.
    ///
    /// Succeeds with zero observers; late observers replay this value.
    pub fn set(&self, state: PresentationState<T>) {
        trace!(state = state.kind(), "publishing presentation state");
        self.tx.send_replace(state);
    }

    /// Replace the current state unless `stop` has been cancelled.
    ///
    /// The check and the write happen under the slot's lock, so a writer
    /// cancelled before another writer publishes can never overwrite it.
    pub(crate) fn set_unless_cancelled(
        &self,
        state: PresentationState<T>,
        stop: &CancellationToken,
    ) -> bool {
        self.set_unless_cancelled_then(state, stop, |_| {})
    }

    /// Like [`StateHolder::set_unless_cancelled`], running `on_published` on
    /// the new state while the slot is still locked. `on_published` must not
    /// touch this holder.
    pub(crate) fn set_unless_cancelled_then<F>(
        &self,
        state: PresentationState<T>,
        stop: &CancellationToken,
        on_published: F,
    ) -> bool
    where
        F: FnOnce(&PresentationState<T>),
    {
        let kind = state.kind();
        let published = self.tx.send_if_modified(move |current| {
            if stop.is_cancelled() {
                return false;
            }
            *current = state;
            on_published(current);
            true
        });
        if published {
            trace!(state = kind, "publishing presentation state");
        } else {
            trace!(state = kind, "dropping state from a superseded invocation");
        }
        published
    }

    /// Read-only view of this holder.
    pub fn observer(&self) -> StateObserver<T> {
        StateObserver {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of live observer receivers.
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone> StateHolder<T> {
    /// Snapshot of the current state.
    pub fn current(&self) -> PresentationState<T> {
        self.tx.borrow().clone()
    }
}

/// Read-only handle onto a [`StateHolder`].
#[derive(Debug)]
pub struct StateObserver<T> {
    rx: watch::Receiver<PresentationState<T>>,
}

impl<T> Clone for StateObserver<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<T: Clone> StateObserver<T> {
    /// Snapshot of the current state.
    pub fn current(&self) -> PresentationState<T> {
        self.rx.borrow().clone()
    }

    /// Current success payload, if the latest state is `Success`.
    pub fn success_value(&self) -> Option<T> {
        self.rx.borrow().success_value().cloned()
    }

    /// Start a new subscription; its first item is the current state.
    pub fn subscribe(&self) -> StateSubscription<T> {
        StateSubscription {
            rx: self.rx.clone(),
            replayed: false,
        }
    }
}

/// One subscription to a holder, replaying the latest value first.
///
/// Intermediate states published faster than the subscriber reads them are
/// conflated; the subscriber always sees the most recent one.
#[derive(Debug)]
pub struct StateSubscription<T> {
    rx: watch::Receiver<PresentationState<T>>,
    replayed: bool,
}

impl<T: Clone> StateSubscription<T> {
    /// Next state, or `None` once every holder clone has been dropped.
    pub async fn next(&mut self) -> Option<PresentationState<T>> {
        if !self.replayed {
            self.replayed = true;
            return Some(self.rx.borrow_and_update().clone());
        }

        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

impl<T: Clone + Send + Sync + 'static> StateSubscription<T> {
    /// Adapt the subscription into a stream.
    pub fn into_stream(self) -> BoxStream<'static, PresentationState<T>> {
        futures::stream::unfold(self, |mut subscription| async move {
            let state = subscription.next().await?;
            Some((state, subscription))
        })
        .boxed()
    }
}
