//! The runtime façade: bean lookup, resolution transactions, listener
//! notification and type-registry access.
//!
//! Resolution follows a transaction protocol. Before any bean is produced,
//! the transitive dependency graph of the request is collected and every
//! provider in it is locked with a fresh transaction id; concurrent requests
//! touching a locked provider wait on the root store's condition variable
//! until the transaction finishes. This guarantees exactly one production
//! for concurrent first-time requests of a singleton, while keeping
//! unrelated subgraphs fully concurrent.

use std::any::Any;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::bean::{BeanType, BeanValue, Dependency};
use crate::conversion::ConversionHelper;
use crate::error::{InjectionError, InjectionResult};
use crate::listener::{BeanCreationEvent, BeanCreationListener, BeanCreationListenerSupport};
use crate::loader::TypeRegistry;
use crate::provider::BeanProvider;
use crate::store::{fetch_root, BeanStore, DefaultBeanStore};

static TX_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_tx_id() -> u64 {
    TX_COUNTER.fetch_add(1, Ordering::SeqCst) + 1
}

/// Resolves `dependency` against `store` and its ancestors.
///
/// Name lookups stop at the first store whose local mapping contains the
/// name (child definitions shadow ancestors). Type lookups scan the named
/// providers of each store in lexicographic order, child stores before
/// ancestors, and return the first provider whose produced type matches:
/// first-match-wins is the documented ambiguity policy.
fn resolve_dependency(
    dependency: &Dependency,
    store: &Arc<dyn BeanStore>,
    types: &TypeRegistry,
) -> InjectionResult<Arc<dyn BeanProvider>> {
    let mut current = Some(store.clone());
    while let Some(s) = current {
        match dependency {
            Dependency::Name(name) => {
                if let Some(provider) = s.bean_provider(name) {
                    return Ok(provider);
                }
            }
            Dependency::Type(ty) => {
                for name in s.provider_names() {
                    if let Some(provider) = s.bean_provider(&name) {
                        if provider.bean_type(types)? == *ty {
                            return Ok(provider);
                        }
                    }
                }
            }
        }
        current = s.parent();
    }

    Err(InjectionError::NotFound {
        dependency: dependency.to_string(),
    })
}

/// Searches `store` and its ancestors for the name `provider` is registered
/// under, child before parent; also reports the owning store's name.
fn locate_provider(
    provider: &Arc<dyn BeanProvider>,
    store: &Arc<dyn BeanStore>,
) -> Option<(String, Option<String>)> {
    let mut current = Some(store.clone());
    while let Some(s) = current {
        for name in s.provider_names() {
            if let Some(registered) = s.bean_provider(&name) {
                if Arc::ptr_eq(&registered, provider) {
                    return Some((name, s.name().map(str::to_string)));
                }
            }
        }
        current = s.parent();
    }
    None
}

/// Unlocks the transaction's providers and wakes waiting transactions when
/// the transaction ends, on success, error and unwind alike.
struct TxUnlock {
    root: Arc<dyn BeanStore>,
    providers: Vec<Arc<dyn BeanProvider>>,
}

impl Drop for TxUnlock {
    fn drop(&mut self) {
        let sync = self.root.resolution_sync();
        let _guard = sync.mutex.lock();
        for provider in &self.providers {
            provider.set_lock_id(None);
        }
        sync.condvar.notify_all();
    }
}

/// Per-transaction view handed to producing providers.
///
/// Serves nested dependency requests from the transaction's collected graph,
/// records postponed initializers, fires creation events and exposes the
/// type registry and conversion helper of the resolution.
pub struct ResolutionContext<'a> {
    context: &'a BeanContext,
    store: Arc<dyn BeanStore>,
    types: Arc<TypeRegistry>,
    graph: HashMap<Dependency, Arc<dyn BeanProvider>>,
    dep_stack: Vec<Dependency>,
    provider_stack: Vec<Arc<dyn BeanProvider>>,
    initializers: Vec<Arc<dyn BeanProvider>>,
}

impl<'a> ResolutionContext<'a> {
    fn new(
        context: &'a BeanContext,
        store: Arc<dyn BeanStore>,
        types: Arc<TypeRegistry>,
        graph: HashMap<Dependency, Arc<dyn BeanProvider>>,
    ) -> Self {
        Self {
            context,
            store,
            types,
            graph,
            dep_stack: Vec::new(),
            provider_stack: Vec::new(),
            initializers: Vec::new(),
        }
    }

    /// Produces the bean for a dependency of the current transaction.
    pub fn get_dependent_bean(&mut self, dependency: &Dependency) -> InjectionResult<BeanValue> {
        let provider = self.provider_for(dependency)?;
        self.dep_stack.push(dependency.clone());
        self.provider_stack.push(provider.clone());
        let result = provider.bean(self);
        self.provider_stack.pop();
        self.dep_stack.pop();
        result
    }

    /// Whether the bean for a transaction dependency can be handed out right
    /// now (false while it is being produced).
    pub fn is_bean_available(&self, dependency: &Dependency) -> InjectionResult<bool> {
        Ok(self.provider_for(dependency)?.is_bean_available())
    }

    /// The store this resolution started from.
    pub fn store(&self) -> &Arc<dyn BeanStore> {
        &self.store
    }

    /// The type registry of the owning context.
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Shorthand for loading a type descriptor through the registry.
    pub fn load_class(
        &self,
        type_name: &str,
        loader_name: Option<&str>,
    ) -> InjectionResult<crate::loader::TypeDescriptor> {
        self.types.load_class(type_name, loader_name)
    }

    /// The conversion helper of the store chain, falling back to a default.
    pub fn conversion_helper(&self) -> Arc<ConversionHelper> {
        DefaultBeanStore::fetch_conversion_helper(&self.store, true)
            .unwrap_or_else(|| Arc::new(ConversionHelper::new()))
    }

    /// Registers the currently producing provider for postponed
    /// initialization at the end of the transaction.
    pub fn defer_initialization(&mut self) {
        if let Some(provider) = self.provider_stack.last() {
            self.initializers.push(provider.clone());
        }
    }

    /// Notifies the owning context's creation listeners about a fresh bean.
    pub fn bean_created(&mut self, bean: &BeanValue) {
        let located = self
            .provider_stack
            .last()
            .and_then(|provider| locate_provider(provider, &self.store));
        let (bean_name, store_name) = match located {
            Some((name, store)) => (Some(name), store),
            None => (None, None),
        };
        let event = BeanCreationEvent::new(bean, bean_name, store_name);
        self.context.fire_creation_event(&event);
    }

    /// The chain of dependencies currently being produced, for diagnostics.
    pub fn dependency_chain(&self) -> String {
        self.dep_stack
            .iter()
            .map(Dependency::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    fn provider_for(&self, dependency: &Dependency) -> InjectionResult<Arc<dyn BeanProvider>> {
        self.graph.get(dependency).cloned().ok_or_else(|| {
            InjectionError::InvalidArgument(format!(
                "dependency does not belong to the current resolution: {dependency}"
            ))
        })
    }

    fn invoke_initializers(&mut self) -> InjectionResult<()> {
        let mut first_error = None;
        while !self.initializers.is_empty() {
            let pending = std::mem::take(&mut self.initializers);
            for provider in pending {
                if let Err(err) = provider.initialize(self) {
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// The runtime façade over a finished bean store hierarchy.
///
/// Contexts are cheap: they hold a swappable default store, a lazily created
/// [`TypeRegistry`] and the registered creation listeners. Stores may be
/// shared by several contexts; [`close`](BeanContext::close) therefore only
/// releases what the context itself owns.
pub struct BeanContext {
    default_store: RwLock<Arc<dyn BeanStore>>,
    types: RwLock<Option<Arc<TypeRegistry>>>,
    listeners: BeanCreationListenerSupport,
}

impl BeanContext {
    pub fn new(default_store: Arc<dyn BeanStore>) -> Self {
        Self {
            default_store: RwLock::new(default_store),
            types: RwLock::new(None),
            listeners: BeanCreationListenerSupport::new(),
        }
    }

    pub fn default_store(&self) -> Arc<dyn BeanStore> {
        self.default_store.read().clone()
    }

    pub fn set_default_store(&self, store: Arc<dyn BeanStore>) {
        *self.default_store.write() = store;
    }

    /// The context's type registry, created empty on first access.
    pub fn type_registry(&self) -> Arc<TypeRegistry> {
        if let Some(types) = self.types.read().clone() {
            return types;
        }
        let mut slot = self.types.write();
        slot.get_or_insert_with(|| Arc::new(TypeRegistry::new()))
            .clone()
    }

    pub fn set_type_registry(&self, types: Arc<TypeRegistry>) {
        *self.types.write() = Some(types);
    }

    /// Releases the listener registrations; the underlying store is left
    /// untouched and stays usable by other contexts.
    pub fn close(&self) {
        debug!("closing bean context");
        self.listeners.clear();
    }

    pub fn add_bean_creation_listener(&self, listener: Arc<dyn BeanCreationListener>) {
        self.listeners.add(listener);
    }

    /// Removes a listener by pointer identity; a no-op when unregistered.
    pub fn remove_bean_creation_listener(&self, listener: &Arc<dyn BeanCreationListener>) {
        self.listeners.remove(listener);
    }

    pub(crate) fn fire_creation_event(&self, event: &BeanCreationEvent<'_>) {
        self.listeners.fire(event);
    }

    /// Resolves a bean by name from the default store chain.
    pub fn get_bean_by_name(&self, name: &str) -> InjectionResult<BeanValue> {
        self.get_bean_by_name_in(name, &self.default_store())
    }

    /// Resolves a bean by name from an explicit store chain.
    pub fn get_bean_by_name_in(
        &self,
        name: &str,
        store: &Arc<dyn BeanStore>,
    ) -> InjectionResult<BeanValue> {
        self.resolve(&Dependency::on_name(name), store)
    }

    /// Resolves a bean by its Rust type from the default store chain.
    pub fn get_bean<T: Any + Send + Sync>(&self) -> InjectionResult<Arc<T>> {
        self.get_bean_in(&self.default_store())
    }

    /// Resolves a bean by its Rust type from an explicit store chain.
    pub fn get_bean_in<T: Any + Send + Sync>(
        &self,
        store: &Arc<dyn BeanStore>,
    ) -> InjectionResult<Arc<T>> {
        let bean_type = BeanType::of::<T>();
        let value = self.resolve(&Dependency::of_type(bean_type.clone()), store)?;
        value
            .downcast::<T>()
            .map_err(|_| InjectionError::TypeMismatch {
                name: format!("[type {bean_type}]"),
                expected: bean_type.name().to_string(),
            })
    }

    /// Resolves a bean by name and downcasts it to `T`.
    pub fn get_named_bean<T: Any + Send + Sync>(&self, name: &str) -> InjectionResult<Arc<T>> {
        self.get_named_bean_in(name, &self.default_store())
    }

    pub fn get_named_bean_in<T: Any + Send + Sync>(
        &self,
        name: &str,
        store: &Arc<dyn BeanStore>,
    ) -> InjectionResult<Arc<T>> {
        let value = self.get_bean_by_name_in(name, store)?;
        value
            .downcast::<T>()
            .map_err(|_| InjectionError::TypeMismatch {
                name: format!("'{name}'"),
                expected: std::any::type_name::<T>().to_string(),
            })
    }

    /// Resolves a bean for an arbitrary dependency from an explicit store.
    pub fn get_bean_for(
        &self,
        dependency: &Dependency,
        store: &Arc<dyn BeanStore>,
    ) -> InjectionResult<BeanValue> {
        self.resolve(dependency, store)
    }

    /// Whether a bean with the given name is reachable; never fails.
    pub fn contains_bean_named(&self, name: &str) -> bool {
        self.contains_bean_named_in(name, &self.default_store())
    }

    pub fn contains_bean_named_in(&self, name: &str, store: &Arc<dyn BeanStore>) -> bool {
        resolve_dependency(&Dependency::on_name(name), store, &self.type_registry()).is_ok()
    }

    /// Whether a bean of type `T` is reachable; never fails.
    pub fn contains_bean<T: Any>(&self) -> bool {
        self.contains_bean_in::<T>(&self.default_store())
    }

    pub fn contains_bean_in<T: Any>(&self, store: &Arc<dyn BeanStore>) -> bool {
        resolve_dependency(&Dependency::on_type::<T>(), store, &self.type_registry()).is_ok()
    }

    /// Deduplicated union of bean names visible from the default store.
    pub fn bean_names(&self) -> BTreeSet<String> {
        self.bean_names_in(&self.default_store())
    }

    pub fn bean_names_in(&self, store: &Arc<dyn BeanStore>) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        let mut current = Some(store.clone());
        while let Some(s) = current {
            names.extend(s.provider_names());
            current = s.parent();
        }
        names
    }

    /// Union of bean types producible from the default store chain.
    pub fn bean_classes(&self) -> InjectionResult<BTreeSet<BeanType>> {
        self.bean_classes_in(&self.default_store())
    }

    pub fn bean_classes_in(
        &self,
        store: &Arc<dyn BeanStore>,
    ) -> InjectionResult<BTreeSet<BeanType>> {
        let types = self.type_registry();
        let mut classes = BTreeSet::new();
        let mut current = Some(store.clone());
        while let Some(s) = current {
            for name in s.provider_names() {
                if let Some(provider) = s.bean_provider(&name) {
                    classes.insert(provider.bean_type(&types)?);
                }
            }
            current = s.parent();
        }
        Ok(classes)
    }

    /// Reverse lookup: the name `provider` is registered under in the default
    /// store chain, child before parent.
    pub fn bean_name_for(&self, provider: &Arc<dyn BeanProvider>) -> Option<String> {
        self.bean_name_for_in(provider, &self.default_store())
    }

    pub fn bean_name_for_in(
        &self,
        provider: &Arc<dyn BeanProvider>,
        store: &Arc<dyn BeanStore>,
    ) -> Option<String> {
        locate_provider(provider, store).map(|(name, _)| name)
    }

    /// Shuts down the named providers of `store`, invoking their shutdown
    /// hooks with a detached resolution context.
    pub fn shutdown_store(&self, store: &Arc<dyn BeanStore>) {
        let types = self.type_registry();
        let mut ctx = ResolutionContext::new(self, store.clone(), types, HashMap::new());
        for name in store.provider_names() {
            if let Some(provider) = store.bean_provider(&name) {
                provider.shutdown(&mut ctx);
            }
        }
    }

    /// The resolution transaction: collect and lock the dependency graph,
    /// produce, run postponed initializers, unlock and wake waiters.
    fn resolve(
        &self,
        dependency: &Dependency,
        store: &Arc<dyn BeanStore>,
    ) -> InjectionResult<BeanValue> {
        let root = fetch_root(store);
        let types = self.type_registry();

        let graph = {
            let sync = root.resolution_sync();
            let mut guard = sync.mutex.lock();
            loop {
                match collect_graph(dependency, store, &types)? {
                    Some(graph) => {
                        let tx_id = next_tx_id();
                        debug!("resolution transaction {tx_id} locks {} provider(s)", graph.len());
                        for provider in graph.values() {
                            provider.set_lock_id(Some(tx_id));
                        }
                        break graph;
                    }
                    None => sync.condvar.wait(&mut guard),
                }
            }
        };

        let _unlock = TxUnlock {
            root,
            providers: graph.values().cloned().collect(),
        };

        let mut ctx = ResolutionContext::new(self, store.clone(), types, graph);
        let produced = ctx.get_dependent_bean(dependency);
        let produced = match produced {
            Ok(bean) => ctx.invoke_initializers().map(|()| bean),
            Err(err) => Err(err),
        };

        produced.map_err(|err| InjectionError::wrap_production(dependency.to_string(), err))
    }
}

/// Collects the transitive dependency graph of `dependency`, each dependency
/// resolved once against the starting store. Returns `None` when a provider
/// in the graph is locked by another transaction; lookup failures of nested
/// dependencies are reported as production failures of the request.
fn collect_graph(
    dependency: &Dependency,
    store: &Arc<dyn BeanStore>,
    types: &TypeRegistry,
) -> InjectionResult<Option<HashMap<Dependency, Arc<dyn BeanProvider>>>> {
    let mut graph: HashMap<Dependency, Arc<dyn BeanProvider>> = HashMap::new();
    let mut queue = VecDeque::new();
    queue.push_back(dependency.clone());

    while let Some(current) = queue.pop_front() {
        if graph.contains_key(&current) {
            continue;
        }

        let provider = resolve_dependency(&current, store, types).map_err(|err| {
            if current == *dependency {
                err
            } else {
                InjectionError::wrap_production(dependency.to_string(), err)
            }
        })?;

        if provider.lock_id().is_some() {
            return Ok(None);
        }

        if let Some(dependencies) = provider.dependencies() {
            queue.extend(dependencies);
        }
        graph.insert(current, provider);
    }

    Ok(Some(graph))
}
