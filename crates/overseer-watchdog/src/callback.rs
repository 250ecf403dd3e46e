//! Event sinks registered on the watchdog.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::mpsc::UnboundedSender;

use overseer_core::models::ErrorEvent;

pub type SyncCallback = Arc<dyn Fn(&ErrorEvent) + Send + Sync>;
pub type AsyncCallback = Arc<dyn Fn(ErrorEvent) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Clone)]
pub enum EventCallback {
    Sync(SyncCallback),
    Async(AsyncCallback),
    /// Forward into a queue, typically the controller's intake.
    Channel(UnboundedSender<ErrorEvent>),
}

impl EventCallback {
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&ErrorEvent) + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(f))
    }

    pub fn asynchronous<F, Fut>(f: F) -> Self
    where
        F: Fn(ErrorEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::Async(Arc::new(move |event| Box::pin(f(event))))
    }

    pub fn channel(sender: UnboundedSender<ErrorEvent>) -> Self {
        Self::Channel(sender)
    }

    /// Deliver one event. Returns `false` only when a channel's receiver
    /// has gone away.
    pub async fn dispatch(&self, event: &ErrorEvent) -> bool {
        match self {
            Self::Sync(f) => {
                f(event);
                true
            }
            Self::Async(f) => {
                f(event.clone()).await;
                true
            }
            Self::Channel(tx) => tx.send(event.clone()).is_ok(),
        }
    }
}

impl fmt::Debug for EventCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("EventCallback::Sync"),
            Self::Async(_) => f.write_str("EventCallback::Async"),
            Self::Channel(_) => f.write_str("EventCallback::Channel"),
        }
    }
}
