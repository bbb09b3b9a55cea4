//! Hierarchical, read-side bean store.
//!
//! Runtime stores are immutable after assembly: lookups need no locking and
//! are safe for unsynchronized concurrent reads. Each store also owns the
//! synchronization primitives used when it acts as the root of a resolution
//! transaction.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::conversion::ConversionHelper;
use crate::provider::BeanProvider;

/// Prefix reserved for generated anonymous bean names. User-supplied names
/// must not start with it; the builder rejects such names.
pub(crate) const ANONYMOUS_BEAN_PREFIX: &str = "trellis.anonymousBean.";

/// Mutex and condition variable used to coordinate resolution transactions
/// rooted at a store.
#[derive(Default)]
pub struct ResolutionSync {
    pub(crate) mutex: Mutex<()>,
    pub(crate) condvar: Condvar,
}

impl ResolutionSync {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

/// A hierarchical namespace of bean providers.
///
/// Lookup methods are local-only; parent delegation happens exactly once per
/// name in the resolution layer. `provider_names` never exposes generated
/// anonymous names, although anonymous beans stay resolvable through
/// [`bean_provider`](BeanStore::bean_provider).
pub trait BeanStore: Send + Sync {
    /// Optional human-readable name; the root store may be unnamed.
    fn name(&self) -> Option<&str>;

    /// Local lookup of a provider, without parent delegation.
    fn bean_provider(&self, name: &str) -> Option<Arc<dyn BeanProvider>>;

    /// The locally registered names, excluding anonymous beans.
    fn provider_names(&self) -> BTreeSet<String>;

    /// The parent store, absent for the root.
    fn parent(&self) -> Option<Arc<dyn BeanStore>>;

    /// The conversion helper attached to this store, if any.
    fn conversion_helper(&self) -> Option<Arc<ConversionHelper>> {
        None
    }

    /// Synchronization primitives used when this store roots a transaction.
    fn resolution_sync(&self) -> &ResolutionSync;
}

/// Walks up the parent chain to the root store.
pub fn fetch_root(store: &Arc<dyn BeanStore>) -> Arc<dyn BeanStore> {
    let mut current = store.clone();
    while let Some(parent) = current.parent() {
        current = parent;
    }
    current
}

/// The standard immutable store produced by the builder phase.
pub struct DefaultBeanStore {
    name: Option<String>,
    providers: BTreeMap<String, Arc<dyn BeanProvider>>,
    parent: Option<Arc<dyn BeanStore>>,
    conversion: Option<Arc<ConversionHelper>>,
    sync: ResolutionSync,
}

impl DefaultBeanStore {
    pub(crate) fn new(
        name: Option<String>,
        providers: BTreeMap<String, Arc<dyn BeanProvider>>,
        parent: Option<Arc<dyn BeanStore>>,
        conversion: Option<Arc<ConversionHelper>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            providers,
            parent,
            conversion,
            sync: ResolutionSync::new(),
        })
    }

    /// Searches the chain starting at `store` for a conversion helper; with
    /// `create_if_necessary` a fresh default helper is returned on a miss.
    pub fn fetch_conversion_helper(
        store: &Arc<dyn BeanStore>,
        create_if_necessary: bool,
    ) -> Option<Arc<ConversionHelper>> {
        let mut current = Some(store.clone());
        while let Some(s) = current {
            if let Some(helper) = s.conversion_helper() {
                return Some(helper);
            }
            current = s.parent();
        }

        create_if_necessary.then(|| Arc::new(ConversionHelper::new()))
    }
}

impl BeanStore for DefaultBeanStore {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn bean_provider(&self, name: &str) -> Option<Arc<dyn BeanProvider>> {
        self.providers.get(name).cloned()
    }

    fn provider_names(&self) -> BTreeSet<String> {
        self.providers
            .keys()
            .filter(|name| !name.starts_with(ANONYMOUS_BEAN_PREFIX))
            .cloned()
            .collect()
    }

    fn parent(&self) -> Option<Arc<dyn BeanStore>> {
        self.parent.clone()
    }

    fn conversion_helper(&self) -> Option<Arc<ConversionHelper>> {
        self.conversion.clone()
    }

    fn resolution_sync(&self) -> &ResolutionSync {
        &self.sync
    }
}

impl fmt::Debug for DefaultBeanStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultBeanStore")
            .field("name", &self.name)
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

static COMBINED_STORE_COUNTER: AtomicU64 = AtomicU64::new(0);

const COMBINED_STORE_PREFIX: &str = "trellis.combinedStore.";

/// A read-only view joining several stores under one name.
///
/// Lookups try the child stores in order; the first hit wins. The view's
/// parent combines the children's parents, collapsing to a single store when
/// only one child has a parent.
pub struct CombinedBeanStore {
    name: String,
    children: Vec<Arc<dyn BeanStore>>,
    sync: ResolutionSync,
}

impl CombinedBeanStore {
    pub fn new(children: Vec<Arc<dyn BeanStore>>) -> Arc<Self> {
        Self::named(Self::generate_name(), children)
    }

    pub fn named(name: impl Into<String>, children: Vec<Arc<dyn BeanStore>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            children,
            sync: ResolutionSync::new(),
        })
    }

    pub fn children(&self) -> &[Arc<dyn BeanStore>] {
        &self.children
    }

    fn generate_name() -> String {
        let index = COMBINED_STORE_COUNTER.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{COMBINED_STORE_PREFIX}{index}")
    }
}

impl BeanStore for CombinedBeanStore {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn bean_provider(&self, name: &str) -> Option<Arc<dyn BeanProvider>> {
        self.children
            .iter()
            .find_map(|child| child.bean_provider(name))
    }

    fn provider_names(&self) -> BTreeSet<String> {
        self.children
            .iter()
            .flat_map(|child| child.provider_names())
            .collect()
    }

    fn parent(&self) -> Option<Arc<dyn BeanStore>> {
        let parents: Vec<Arc<dyn BeanStore>> = self
            .children
            .iter()
            .filter_map(|child| child.parent())
            .collect();

        match parents.len() {
            0 => None,
            1 => parents.into_iter().next(),
            _ => Some(CombinedBeanStore::new(parents) as Arc<dyn BeanStore>),
        }
    }

    fn conversion_helper(&self) -> Option<Arc<ConversionHelper>> {
        self.children
            .iter()
            .find_map(|child| child.conversion_helper())
    }

    fn resolution_sync(&self) -> &ResolutionSync {
        &self.sync
    }
}
