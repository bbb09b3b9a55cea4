//! Write-side store hierarchy used while a container is being assembled.
//!
//! Assembly is single-threaded by contract: a [`ContainerBuilder`] keeps a
//! flat registry of named mutable stores so the declarative front-end can
//! address them in O(1), then [`build`](ContainerBuilder::build) freezes the
//! whole tree into immutable runtime stores in one irreversible step. The
//! flat registry dies with the builder; runtime stores form a tree purely
//! through parent references.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::conversion::ConversionHelper;
use crate::error::{InjectionError, InjectionResult};
use crate::loader::TypeRegistry;
use crate::provider::BeanProvider;
use crate::store::{BeanStore, DefaultBeanStore, ANONYMOUS_BEAN_PREFIX};

/// Process-wide counter behind generated anonymous bean names. Shared by all
/// builders so generated names stay unique even across containers assembled
/// concurrently in one process.
static ANONYMOUS_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_anonymous_index() -> u64 {
    ANONYMOUS_COUNTER.fetch_add(1, Ordering::SeqCst) + 1
}

/// The mutable, builder-phase counterpart of a bean store.
pub struct MutableBeanStore {
    name: Option<String>,
    providers: BTreeMap<String, Arc<dyn BeanProvider>>,
    conversion: Option<Arc<ConversionHelper>>,
}

impl MutableBeanStore {
    pub fn new(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            providers: BTreeMap::new(),
            conversion: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Registers `provider` under `name`, replacing an earlier registration
    /// of the same name. Empty names and names colliding with the reserved
    /// anonymous prefix are rejected.
    pub fn add_bean_provider(
        &mut self,
        name: &str,
        provider: Arc<dyn BeanProvider>,
    ) -> InjectionResult<()> {
        if name.is_empty() {
            return Err(InjectionError::InvalidArgument(
                "bean provider name must not be empty".into(),
            ));
        }
        if name.starts_with(ANONYMOUS_BEAN_PREFIX) {
            return Err(InjectionError::InvalidArgument(format!(
                "bean provider name uses the reserved anonymous prefix: {name}"
            )));
        }

        debug!(
            "registered bean provider: {name} (store: {})",
            self.name.as_deref().unwrap_or("<root>")
        );
        self.providers.insert(name.to_string(), provider);
        Ok(())
    }

    /// Registers `provider` under a generated, process-unique name and
    /// returns that name.
    pub fn add_anonymous_bean_provider(&mut self, provider: Arc<dyn BeanProvider>) -> String {
        let name = format!("{ANONYMOUS_BEAN_PREFIX}{}", next_anonymous_index());
        self.providers.insert(name.clone(), provider);
        name
    }

    pub fn remove_bean_provider(&mut self, name: &str) -> Option<Arc<dyn BeanProvider>> {
        self.providers.remove(name)
    }

    pub fn provider_names(&self) -> BTreeSet<String> {
        self.providers
            .keys()
            .filter(|name| !name.starts_with(ANONYMOUS_BEAN_PREFIX))
            .cloned()
            .collect()
    }

    pub fn set_conversion_helper(&mut self, helper: Option<Arc<ConversionHelper>>) {
        self.conversion = helper;
    }

    pub fn conversion_helper(&self) -> Option<Arc<ConversionHelper>> {
        self.conversion.clone()
    }

    fn freeze(self, parent: Option<Arc<dyn BeanStore>>) -> Arc<DefaultBeanStore> {
        DefaultBeanStore::new(self.name, self.providers, parent, self.conversion)
    }
}

/// The immutable result of [`ContainerBuilder::build`].
pub struct FrozenStores {
    root: Arc<dyn BeanStore>,
    by_name: HashMap<String, Arc<dyn BeanStore>>,
}

impl FrozenStores {
    /// The root of the frozen hierarchy.
    pub fn root(&self) -> Arc<dyn BeanStore> {
        self.root.clone()
    }

    /// A named store of the hierarchy.
    pub fn store(&self, name: &str) -> InjectionResult<Arc<dyn BeanStore>> {
        self.by_name
            .get(name)
            .cloned()
            .ok_or_else(|| InjectionError::UnknownStore {
                name: name.to_string(),
            })
    }

    pub fn store_names(&self) -> BTreeSet<String> {
        self.by_name.keys().cloned().collect()
    }
}

struct StoreEntry {
    store: MutableBeanStore,
    parent: Option<String>,
}

/// Assembles the bean store tree and its cross-cutting helpers before any
/// context exists. Not safe for concurrent mutation; assemble on one thread,
/// then hand the frozen result to the thread-safe runtime types.
#[derive(Default)]
pub struct ContainerBuilder {
    stores: HashMap<String, StoreEntry>,
    root: Option<MutableBeanStore>,
    conversion: Option<Arc<ConversionHelper>>,
    types: Option<Arc<TypeRegistry>>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The builder's type registry, created empty on first access.
    pub fn type_registry(&mut self) -> Arc<TypeRegistry> {
        self.types
            .get_or_insert_with(|| Arc::new(TypeRegistry::new()))
            .clone()
    }

    pub fn set_type_registry(&mut self, types: Arc<TypeRegistry>) {
        self.types = Some(types);
    }

    /// The builder's conversion helper, created on first access.
    pub fn conversion_helper(&mut self) -> Arc<ConversionHelper> {
        self.conversion
            .get_or_insert_with(|| Arc::new(ConversionHelper::new()))
            .clone()
    }

    /// Replaces the conversion helper. An already materialized root store
    /// keeps the helper it was created with.
    pub fn set_conversion_helper(&mut self, helper: Arc<ConversionHelper>) {
        self.conversion = Some(helper);
    }

    /// The root store, materialized on first access. The current conversion
    /// helper is propagated into the root at this point and not retroactively.
    pub fn root_bean_store(&mut self) -> &mut MutableBeanStore {
        if self.root.is_none() {
            let helper = self.conversion_helper();
            let mut root = MutableBeanStore::new(None);
            root.set_conversion_helper(Some(helper));
            self.root = Some(root);
        }
        self.root.as_mut().expect("root store just materialized")
    }

    /// Whether `name` addresses a known store; `None` addresses the root and
    /// is always known.
    pub fn has_bean_store(&self, name: Option<&str>) -> bool {
        match name {
            None => true,
            Some(name) => self.stores.contains_key(name),
        }
    }

    pub fn bean_store_names(&self) -> BTreeSet<String> {
        self.stores.keys().cloned().collect()
    }

    /// Creates a new named store under `parent` (`None` parents to the root).
    pub fn add_bean_store(&mut self, name: &str, parent: Option<&str>) -> InjectionResult<()> {
        if name.is_empty() {
            return Err(InjectionError::InvalidArgument(
                "bean store name must not be empty".into(),
            ));
        }
        if self.stores.contains_key(name) {
            return Err(InjectionError::DuplicateName {
                name: name.to_string(),
            });
        }
        if let Some(parent_name) = parent {
            if !self.stores.contains_key(parent_name) {
                return Err(InjectionError::UnknownStore {
                    name: parent_name.to_string(),
                });
            }
        }

        debug!("added bean store: {name} (parent: {})", parent.unwrap_or("<root>"));
        self.stores.insert(
            name.to_string(),
            StoreEntry {
                store: MutableBeanStore::new(Some(name)),
                parent: parent.map(str::to_string),
            },
        );
        Ok(())
    }

    /// Registers a provider in the store addressed by `store_name`.
    pub fn add_bean_provider(
        &mut self,
        store_name: Option<&str>,
        bean_name: &str,
        provider: Arc<dyn BeanProvider>,
    ) -> InjectionResult<()> {
        self.store_mut(store_name)?
            .add_bean_provider(bean_name, provider)
    }

    /// Registers a provider under a generated name and returns that name.
    pub fn add_anonymous_bean_provider(
        &mut self,
        store_name: Option<&str>,
        provider: Arc<dyn BeanProvider>,
    ) -> InjectionResult<String> {
        Ok(self
            .store_mut(store_name)?
            .add_anonymous_bean_provider(provider))
    }

    fn store_mut(&mut self, name: Option<&str>) -> InjectionResult<&mut MutableBeanStore> {
        match name {
            None => Ok(self.root_bean_store()),
            Some(name) => self
                .stores
                .get_mut(name)
                .map(|entry| &mut entry.store)
                .ok_or_else(|| InjectionError::UnknownStore {
                    name: name.to_string(),
                }),
        }
    }

    /// Freezes the assembled hierarchy into immutable runtime stores. Parents
    /// are materialized before their children; the builder is consumed.
    pub fn build(mut self) -> FrozenStores {
        // materialize a root even when nothing was registered on it
        self.root_bean_store();
        let root_store = self
            .root
            .take()
            .expect("root store materialized above")
            .freeze(None);
        let root: Arc<dyn BeanStore> = root_store;

        let mut by_name: HashMap<String, Arc<dyn BeanStore>> = HashMap::new();
        let mut pending: Vec<(String, StoreEntry)> = self.stores.drain().collect();

        while !pending.is_empty() {
            let mut remaining = Vec::new();
            let mut progressed = false;

            for (name, entry) in pending {
                let parent: Arc<dyn BeanStore> = match &entry.parent {
                    None => root.clone(),
                    Some(parent_name) => match by_name.get(parent_name) {
                        Some(frozen) => frozen.clone(),
                        None => {
                            remaining.push((name, entry));
                            continue;
                        }
                    },
                };
                by_name.insert(name, entry.store.freeze(Some(parent)) as Arc<dyn BeanStore>);
                progressed = true;
            }

            if !progressed {
                break;
            }
            pending = remaining;
        }

        info!(
            "assembled bean store hierarchy: {} named store(s)",
            by_name.len()
        );
        FrozenStores { root, by_name }
    }
}
