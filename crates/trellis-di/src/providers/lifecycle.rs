//! Scope-bearing provider with creation, initialization and shutdown hooks.

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::bean::{BeanType, BeanValue, Dependency};
use crate::context::ResolutionContext;
use crate::error::{InjectionError, InjectionResult};
use crate::loader::TypeRegistry;
use crate::provider::{BeanProvider, Invokable};
use crate::providers::FnBeanProvider;

/// Caching policy of a lifecycle provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BeanScope {
    /// Produce once, hand out the same instance forever.
    Singleton,
    /// Produce a fresh instance on every request.
    Factory,
}

#[derive(Default)]
struct LifecycleState {
    bean: Option<BeanValue>,
    lock_id: Option<u64>,
    creating: bool,
    initializing: bool,
    instance_created: bool,
}

/// The standard provider for beans with a creation lifecycle.
///
/// Wraps an inner creator provider and adds: scope-determined caching, the
/// transaction locking contract, re-entrancy detection (an unresolvable
/// dependency cycle fails instead of overflowing the stack), an optional
/// initializer that is postponed to the end of the transaction when its own
/// dependencies are not yet available, and an optional shutdown handler for
/// produced singletons.
pub struct LifecycleBeanProvider {
    creator: Arc<dyn BeanProvider>,
    initializer: Option<Invokable>,
    shutdown_handler: Option<Invokable>,
    scope: BeanScope,
    state: Mutex<LifecycleState>,
}

impl LifecycleBeanProvider {
    pub fn new(scope: BeanScope, creator: Arc<dyn BeanProvider>) -> Self {
        Self {
            creator,
            initializer: None,
            shutdown_handler: None,
            scope,
            state: Mutex::new(LifecycleState::default()),
        }
    }

    pub fn singleton(creator: Arc<dyn BeanProvider>) -> Self {
        Self::new(BeanScope::Singleton, creator)
    }

    pub fn factory(creator: Arc<dyn BeanProvider>) -> Self {
        Self::new(BeanScope::Factory, creator)
    }

    /// Singleton whose creator is a closure with declared dependencies.
    pub fn singleton_fn<T, F>(dependencies: Vec<Dependency>, create: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&mut ResolutionContext<'_>) -> InjectionResult<T> + Send + Sync + 'static,
    {
        Self::singleton(Arc::new(FnBeanProvider::new(dependencies, create)))
    }

    /// Factory whose creator is a closure with declared dependencies.
    pub fn factory_fn<T, F>(dependencies: Vec<Dependency>, create: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&mut ResolutionContext<'_>) -> InjectionResult<T> + Send + Sync + 'static,
    {
        Self::factory(Arc::new(FnBeanProvider::new(dependencies, create)))
    }

    pub fn with_initializer(mut self, initializer: Invokable) -> Self {
        self.initializer = Some(initializer);
        self
    }

    pub fn with_shutdown(mut self, handler: Invokable) -> Self {
        self.shutdown_handler = Some(handler);
        self
    }

    pub fn scope(&self) -> BeanScope {
        self.scope
    }

    fn has_bean(&self) -> bool {
        self.state.lock().instance_created
    }

    /// Runs the creator and the initializer, honoring postponed
    /// initialization when the initializer's dependencies are not available.
    fn create_bean(&self, ctx: &mut ResolutionContext<'_>) -> InjectionResult<BeanValue> {
        {
            let state = self.state.lock();
            if state.creating {
                return Err(InjectionError::CircularDependency {
                    chain: ctx.dependency_chain(),
                });
            }
            if state.initializing {
                // initialization is postponed; hand out the raw instance
                if let Some(bean) = state.bean.clone() {
                    return Ok(bean);
                }
            }
        }

        {
            let mut state = self.state.lock();
            state.creating = true;
            state.initializing = true;
        }

        let bean = match self.creator.bean(ctx) {
            Ok(bean) => bean,
            Err(err) => {
                let mut state = self.state.lock();
                state.creating = false;
                state.initializing = false;
                return Err(err);
            }
        };

        {
            let mut state = self.state.lock();
            state.creating = false;
            state.bean = Some(bean.clone());
        }

        let can_init = match self.can_initialize(ctx) {
            Ok(can_init) => can_init,
            Err(err) => {
                self.state.lock().initializing = false;
                return Err(err);
            }
        };

        if can_init {
            match self.run_initializer(ctx, bean) {
                Ok(initialized) => {
                    let mut state = self.state.lock();
                    state.bean = Some(initialized.clone());
                    state.instance_created = true;
                    state.initializing = false;
                    Ok(initialized)
                }
                Err(err) => {
                    self.state.lock().initializing = false;
                    Err(err)
                }
            }
        } else {
            ctx.defer_initialization();
            Ok(bean)
        }
    }

    fn can_initialize(&self, ctx: &ResolutionContext<'_>) -> InjectionResult<bool> {
        let Some(initializer) = &self.initializer else {
            return Ok(true);
        };
        for dependency in initializer.dependencies() {
            if !ctx.is_bean_available(dependency)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Invokes the initializer (if any) and fires the creation event.
    fn run_initializer(
        &self,
        ctx: &mut ResolutionContext<'_>,
        bean: BeanValue,
    ) -> InjectionResult<BeanValue> {
        let replacement = match &self.initializer {
            Some(initializer) => initializer.invoke(ctx, &bean)?,
            None => None,
        };
        let initialized = replacement.unwrap_or(bean);
        ctx.bean_created(&initialized);
        Ok(initialized)
    }
}

impl BeanProvider for LifecycleBeanProvider {
    fn bean(&self, ctx: &mut ResolutionContext<'_>) -> InjectionResult<BeanValue> {
        match self.scope {
            BeanScope::Singleton => {
                if let Some(bean) = self.state.lock().bean.clone() {
                    return Ok(bean);
                }
                self.create_bean(ctx)
            }
            BeanScope::Factory => {
                {
                    let mut state = self.state.lock();
                    state.bean = None;
                    state.instance_created = false;
                }
                self.create_bean(ctx)
            }
        }
    }

    fn bean_type(&self, types: &TypeRegistry) -> InjectionResult<BeanType> {
        self.creator.bean_type(types)
    }

    fn dependencies(&self) -> Option<Vec<Dependency>> {
        if self.scope == BeanScope::Singleton && self.has_bean() {
            // a produced singleton never blocks other transactions
            return None;
        }

        let creator_deps = self.creator.dependencies().unwrap_or_default();
        let init_deps = self
            .initializer
            .iter()
            .flat_map(|initializer| initializer.dependencies().iter().cloned());

        let mut merged = creator_deps;
        for dependency in init_deps {
            if !merged.contains(&dependency) {
                merged.push(dependency);
            }
        }

        if merged.is_empty() {
            None
        } else {
            Some(merged)
        }
    }

    fn lock_id(&self) -> Option<u64> {
        if self.scope == BeanScope::Singleton && self.has_bean() {
            return None;
        }
        self.state.lock().lock_id
    }

    fn set_lock_id(&self, id: Option<u64>) {
        self.state.lock().lock_id = id;
    }

    fn is_bean_available(&self) -> bool {
        !self.state.lock().creating
    }

    fn initialize(&self, ctx: &mut ResolutionContext<'_>) -> InjectionResult<()> {
        let bean = self.state.lock().bean.clone();
        let Some(bean) = bean else {
            return Ok(());
        };

        let result = self.run_initializer(ctx, bean);
        let mut state = self.state.lock();
        state.initializing = false;
        match result {
            Ok(initialized) => {
                state.bean = Some(initialized);
                state.instance_created = true;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn shutdown(&self, ctx: &mut ResolutionContext<'_>) {
        if self.scope != BeanScope::Singleton || !self.has_bean() {
            return;
        }
        let bean = self.state.lock().bean.clone();
        if let (Some(handler), Some(bean)) = (&self.shutdown_handler, bean) {
            if let Err(err) = handler.invoke(ctx, &bean) {
                warn!("shutdown handler failed: {err}");
            }
        }
    }
}
