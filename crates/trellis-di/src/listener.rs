//! Creation-notification channel.
//!
//! Every fresh bean production (never a cache hit) is multicast synchronously
//! to all listeners registered with the owning context before the bean is
//! returned to the original caller.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::bean::BeanValue;

/// Payload of a creation notification.
pub struct BeanCreationEvent<'a> {
    bean: &'a BeanValue,
    bean_name: Option<String>,
    store_name: Option<String>,
}

impl<'a> BeanCreationEvent<'a> {
    pub(crate) fn new(
        bean: &'a BeanValue,
        bean_name: Option<String>,
        store_name: Option<String>,
    ) -> Self {
        Self {
            bean,
            bean_name,
            store_name,
        }
    }

    /// The freshly produced bean.
    pub fn bean(&self) -> &BeanValue {
        self.bean
    }

    /// The name the producing provider is registered under, when it could be
    /// determined (anonymous beans have none).
    pub fn bean_name(&self) -> Option<&str> {
        self.bean_name.as_deref()
    }

    /// Name of the store the provider was found in, if that store is named.
    pub fn store_name(&self) -> Option<&str> {
        self.store_name.as_deref()
    }
}

/// Observer of fresh bean productions.
///
/// The callback is infallible by signature; a panicking listener unwinds into
/// the `get_bean` caller that triggered the creation.
pub trait BeanCreationListener: Send + Sync {
    fn bean_created(&self, event: &BeanCreationEvent<'_>);
}

/// Multicast support object owned by a bean context.
#[derive(Default)]
pub(crate) struct BeanCreationListenerSupport {
    listeners: RwLock<Vec<Arc<dyn BeanCreationListener>>>,
}

impl BeanCreationListenerSupport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&self, listener: Arc<dyn BeanCreationListener>) {
        self.listeners.write().push(listener);
    }

    /// Removes `listener` by pointer identity; a no-op when unregistered.
    pub(crate) fn remove(&self, listener: &Arc<dyn BeanCreationListener>) {
        self.listeners
            .write()
            .retain(|registered| !Arc::ptr_eq(registered, listener));
    }

    pub(crate) fn clear(&self) {
        self.listeners.write().clear();
    }

    pub(crate) fn fire(&self, event: &BeanCreationEvent<'_>) {
        let listeners = self.listeners.read().clone();
        if !listeners.is_empty() {
            debug!(
                "notifying {} listener(s) of bean creation: {:?}",
                listeners.len(),
                event.bean_name()
            );
        }
        for listener in listeners {
            listener.bean_created(event);
        }
    }
}
