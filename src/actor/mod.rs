//! Actor plumbing. Events travel over unbounded channels together with the
//! tracing span they were sent from, so a handler's logs stay attached to
//! the operation that caused them.

pub mod reactor;

use tracing::Span;

pub struct Sender<E> {
    tx: tokio::sync::mpsc::UnboundedSender<(Span, E)>,
}

impl<E> Clone for Sender<E> {
    fn clone(&self) -> Self {
        Sender { tx: self.tx.clone() }
    }
}

impl<E> Sender<E> {
    /// Sends an event, ignoring a closed channel (the receiver shutting down
    /// first is a normal teardown order).
    pub fn send(&self, event: E) {
        let _ = self.tx.send((Span::current(), event));
    }
}

pub type Receiver<E> = tokio::sync::mpsc::UnboundedReceiver<(Span, E)>;

pub fn channel<E>() -> (Sender<E>, Receiver<E>) {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    (Sender { tx }, rx)
}
