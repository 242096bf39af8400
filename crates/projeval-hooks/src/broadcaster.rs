//! Ordered listener dispatch tolerant of registration during dispatch.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// An ordered collection of listeners of type `L`.
///
/// Listeners run in registration order. A listener may register further
/// listeners on the same broadcaster while it is being invoked; those are
/// invoked by the same [`dispatch`](Self::dispatch) call, with the same event,
/// after every listener known at the time.
///
/// The internal lock is never held while a listener runs, so listeners are
/// free to call [`add`](Self::add).
///
/// # Example
///
/// ```rust
/// use projeval_hooks::ListenerBroadcaster;
/// use std::sync::Arc;
///
/// let broadcaster: Arc<ListenerBroadcaster<dyn Fn(&str) + Send + Sync>> =
///     Arc::new(ListenerBroadcaster::new());
/// broadcaster.add(Arc::new(|event: &str| println!("got {event}")));
///
/// let notified = broadcaster
///     .dispatch(|listener| {
///         listener("configured");
///         Ok::<_, std::convert::Infallible>(())
///     })
///     .unwrap();
/// assert_eq!(notified, 1);
/// ```
pub struct ListenerBroadcaster<L: ?Sized> {
    listeners: Mutex<Vec<Arc<L>>>,
}

impl<L: ?Sized> Default for ListenerBroadcaster<L> {
    fn default() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }
}

impl<L: ?Sized> fmt::Debug for ListenerBroadcaster<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerBroadcaster")
            .field("listeners", &self.len())
            .finish()
    }
}

impl<L: ?Sized> ListenerBroadcaster<L> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<L>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a listener after all current ones.
    pub fn add(&self, listener: Arc<L>) {
        self.lock().push(listener);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Invoke every listener once, in registration order.
    ///
    /// Works in batches: each batch is the listeners registered but not yet
    /// invoked by this call. Dispatch ends when a batch comes back empty.
    /// The first error stops dispatch and is returned; listeners after it,
    /// in this batch or later ones, are not invoked.
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch<E>(&self, mut invoke: impl FnMut(&L) -> Result<(), E>) -> Result<usize, E> {
        let mut cursor = 0;
        loop {
            let batch: Vec<Arc<L>> = {
                let listeners = self.lock();
                listeners.get(cursor..).map(<[_]>::to_vec).unwrap_or_default()
            };
            if batch.is_empty() {
                return Ok(cursor);
            }
            for listener in &batch {
                cursor += 1;
                invoke(listener)?;
            }
        }
    }
}
