//! The bean production contract.

use std::sync::Arc;

use crate::bean::{BeanType, BeanValue, Dependency};
use crate::context::ResolutionContext;
use crate::error::InjectionResult;
use crate::loader::TypeRegistry;

/// A strategy object able to produce one bean value.
///
/// Providers are registered in a bean store during assembly and queried
/// arbitrarily often afterwards. Production is lazy: a provider does no work
/// until [`bean`](BeanProvider::bean) is first called, and its declared
/// [`dependencies`](BeanProvider::dependencies) are only resolved at that
/// point.
///
/// The lock-id methods implement the resolution transaction protocol: while a
/// dependency graph is being produced, every provider in it is locked with
/// the transaction's id so concurrent resolutions wait instead of observing a
/// half-built graph. Providers without mutable production state can keep the
/// defaults.
pub trait BeanProvider: Send + Sync {
    /// Produces or returns the bean managed by this provider.
    fn bean(&self, ctx: &mut ResolutionContext<'_>) -> InjectionResult<BeanValue>;

    /// The type of the produced bean. Providers for dynamically described
    /// types may need `types` to resolve it.
    fn bean_type(&self, types: &TypeRegistry) -> InjectionResult<BeanType>;

    /// Dependencies that must be part of the resolution transaction before
    /// this provider can produce.
    fn dependencies(&self) -> Option<Vec<Dependency>> {
        None
    }

    /// Id of the transaction currently holding this provider, if any.
    fn lock_id(&self) -> Option<u64> {
        None
    }

    /// Locks or unlocks this provider for a transaction.
    fn set_lock_id(&self, _id: Option<u64>) {}

    /// Re-entrant query of whether the bean can be handed out right now;
    /// `false` while the provider is in the middle of producing.
    fn is_bean_available(&self) -> bool {
        true
    }

    /// Postponed-initialization hook, invoked at the end of a transaction for
    /// providers that registered themselves via
    /// [`ResolutionContext::defer_initialization`].
    fn initialize(&self, _ctx: &mut ResolutionContext<'_>) -> InjectionResult<()> {
        Ok(())
    }

    /// Releases resources held by a produced bean. Default: nothing to do.
    fn shutdown(&self, _ctx: &mut ResolutionContext<'_>) {}
}

type InvokeFn =
    dyn Fn(&mut ResolutionContext<'_>, &BeanValue) -> InjectionResult<Option<BeanValue>>
        + Send
        + Sync;

/// A deferred invocation on a bean, with its own parameter dependencies.
///
/// Used for initializer and shutdown hooks of lifecycle providers: the
/// closure receives the resolution context and the bean and may return a
/// replacement value (`None` keeps the original instance).
#[derive(Clone)]
pub struct Invokable {
    dependencies: Vec<Dependency>,
    func: Arc<InvokeFn>,
}

impl Invokable {
    pub fn new<F>(dependencies: Vec<Dependency>, func: F) -> Self
    where
        F: Fn(&mut ResolutionContext<'_>, &BeanValue) -> InjectionResult<Option<BeanValue>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            dependencies,
            func: Arc::new(func),
        }
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn invoke(
        &self,
        ctx: &mut ResolutionContext<'_>,
        bean: &BeanValue,
    ) -> InjectionResult<Option<BeanValue>> {
        (self.func)(ctx, bean)
    }
}
