use crate::access::Access;
use crate::error::Error;
use crate::map::DeviceMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Callback invoked after a completed bank access.
///
/// An observer may call back into the [`DeviceMap`]. Such calls fire the hooks again, so
/// unbounded recursion has to be prevented by the observer itself.
pub type Observer = dyn Fn(&DeviceMap, &Access) -> anyhow::Result<()> + Send + Sync;

/// Handle of a registered observer used for deregistration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// Ordered list of observers of one access event.
#[derive(Default)]
pub struct Hook {
    next: AtomicU64,
    observers: RwLock<Vec<(HookId, Arc<Observer>)>>,
}

impl Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook")
            .field("observers", &self.len())
            .finish()
    }
}

impl Hook {
    /// Append an observer. Observers are invoked in registration order.
    pub fn register<F>(&self, observer: F) -> HookId
    where
        F: Fn(&DeviceMap, &Access) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = HookId(self.next.fetch_add(1, Ordering::Relaxed));
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(observer)));
        id
    }

    /// Remove a previously registered observer. Returns `false` if it is unknown.
    pub fn deregister(&self, id: HookId) -> bool {
        let mut observers = self
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let len = observers.len();
        observers.retain(|(i, _)| *i != id);
        observers.len() != len
    }

    pub fn clear(&self) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke all observers on the calling thread. Stops at the first failing observer.
    pub(crate) fn fire(&self, map: &DeviceMap, access: &Access) -> Result<(), Error> {
        // Observers run without the list being locked, they are free to (de)register.
        let observers: Vec<Arc<Observer>> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, o)| o.clone())
            .collect();
        for observer in observers {
            observer(map, access).map_err(Error::Observer)?;
        }
        Ok(())
    }
}
