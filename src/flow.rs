//! Event streams produced by coordinator flows

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::{FutureExt, Stream};
use tokio::sync::mpsc;

use crate::model::{FlowEvent, FlowKind};

/// Stream of [`FlowEvent`]s for one coordinator flow
///
/// The flow's work runs inside `poll_next`, on whatever task consumes the
/// stream. Nothing starts before the first poll and dropping the stream
/// cancels whatever is in progress.
pub struct FlowStream {
    kind: FlowKind,
    driver: Option<BoxFuture<'static, ()>>,
    events: mpsc::UnboundedReceiver<FlowEvent>,
}

impl FlowStream {
    pub(crate) fn new<F, Fut>(kind: FlowKind, run: F) -> Self
    where
        F: FnOnce(FlowEmitter) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, events) = mpsc::unbounded_channel();
        Self {
            kind,
            driver: Some(run(FlowEmitter { tx }).boxed()),
            events,
        }
    }

    /// A flow that ends after a single event without doing any work
    pub(crate) fn single(kind: FlowKind, event: FlowEvent) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        // Receiver is alive, cannot fail
        let _ = tx.send(event);
        Self {
            kind,
            driver: None,
            events,
        }
    }

    pub fn kind(&self) -> FlowKind {
        self.kind
    }
}

impl Stream for FlowStream {
    type Item = FlowEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<FlowEvent>> {
        let this = &mut *self;
        if let Some(driver) = this.driver.as_mut() {
            if driver.as_mut().poll(cx).is_ready() {
                this.driver = None;
            }
        }
        this.events.poll_recv(cx)
    }
}

impl std::fmt::Debug for FlowStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowStream")
            .field("kind", &self.kind)
            .field("running", &self.driver.is_some())
            .finish()
    }
}

/// Sending half handed to a flow driver
pub(crate) struct FlowEmitter {
    tx: mpsc::UnboundedSender<FlowEvent>,
}

impl FlowEmitter {
    pub(crate) fn emit(&self, event: FlowEvent) {
        // Receiver gone means the stream, and this driver with it, is being dropped
        let _ = self.tx.send(event);
    }
}

/// Marks one kind of flow as in flight until dropped
pub(crate) struct FlowGuard {
    busy: Arc<AtomicBool>,
}

impl FlowGuard {
    pub(crate) fn acquire(busy: &Arc<AtomicBool>) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { busy: busy.clone() })
    }
}

impl Drop for FlowGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_events_in_order_then_end() {
        let flow = FlowStream::new(FlowKind::Generate, |out| async move {
            out.emit(FlowEvent::Loading);
            tokio::task::yield_now().await;
            out.emit(FlowEvent::Success("done".to_string()));
        });

        let events: Vec<_> = flow.collect().await;

        assert_eq!(
            events,
            vec![FlowEvent::Loading, FlowEvent::Success("done".to_string())]
        );
    }

    #[tokio::test]
    async fn test_driver_runs_only_when_polled() {
        let started = Arc::new(AtomicBool::new(false));
        let flag = started.clone();
        let mut flow = FlowStream::new(FlowKind::Authenticate, move |out| async move {
            flag.store(true, Ordering::SeqCst);
            out.emit(FlowEvent::Loading);
        });
        tokio::task::yield_now().await;
        assert!(!started.load(Ordering::SeqCst));

        assert_eq!(flow.next().await, Some(FlowEvent::Loading));
        assert!(started.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_single_event() {
        let flow = FlowStream::single(FlowKind::Generate, FlowEvent::Error("busy".to_string()));
        assert_eq!(flow.kind(), FlowKind::Generate);

        let events: Vec<_> = flow.collect().await;
        assert_eq!(events, vec![FlowEvent::Error("busy".to_string())]);
    }

    #[test]
    fn test_guard_is_exclusive_until_dropped() {
        let busy = Arc::new(AtomicBool::new(false));

        let guard = FlowGuard::acquire(&busy);
        assert!(guard.is_some());
        assert!(FlowGuard::acquire(&busy).is_none());

        drop(guard);
        assert!(FlowGuard::acquire(&busy).is_some());
    }
}
