//! Results of collaborator calls that may finish later.

use std::{fmt, future::Future, pin::Pin};

/// Alias for a boxed `Future` handed back by a collaborator.
pub type Pending<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Outcome of an operation that either finished synchronously or will
/// finish when the returned future resolves.
///
/// The future must not borrow the callee; collaborators share whatever
/// state they need through `Arc`.
pub enum Completion<T> {
    Ready(T),
    Pending(Pending<T>),
}

impl<T: Send + 'static> Completion<T> {
    pub fn pending<F>(fut: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Completion::Pending(Box::pin(fut))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Completion::Ready(_))
    }

    /// Converts into a future; a ready value resolves on first poll.
    pub fn into_future(self) -> Pending<T> {
        match self {
            Completion::Ready(value) => Box::pin(std::future::ready(value)),
            Completion::Pending(fut) => fut,
        }
    }

    pub fn map<U, F>(self, f: F) -> Completion<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        match self {
            Completion::Ready(value) => Completion::Ready(f(value)),
            Completion::Pending(fut) => Completion::Pending(Box::pin(async move { f(fut.await) })),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Completion::Pending(_) => f.write_str("Pending"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_into_future() {
        let c: Completion<i32> = Completion::Ready(7);
        assert!(c.is_ready());
        assert_eq!(c.into_future().await, 7);
    }

    #[tokio::test]
    async fn test_map_pending() {
        let c = Completion::pending(async { 20 }).map(|v| v + 1);
        assert!(!c.is_ready());
        assert_eq!(c.into_future().await, 21);
    }

    #[test]
    fn test_debug_hides_future() {
        let c: Completion<u8> = Completion::pending(async { 1 });
        assert_eq!(format!("{:?}", c), "Pending");
        assert_eq!(format!("{:?}", Completion::Ready(1u8)), "Ready(1)");
    }
}
