//! Provider producing beans from a closure.

use std::any::Any;
use std::sync::Arc;

use crate::bean::{BeanType, BeanValue, Dependency};
use crate::context::ResolutionContext;
use crate::error::InjectionResult;
use crate::loader::TypeRegistry;
use crate::provider::BeanProvider;

type CreateFn = dyn Fn(&mut ResolutionContext<'_>) -> InjectionResult<BeanValue> + Send + Sync;

/// A stateless provider invoking a closure on every request.
///
/// Typically used as the creator inside a
/// [`LifecycleBeanProvider`](crate::providers::LifecycleBeanProvider), which
/// adds scoping, locking and creation events on top. Registered directly, it
/// behaves like a bare factory without lifecycle support.
pub struct FnBeanProvider {
    bean_type: BeanType,
    dependencies: Vec<Dependency>,
    create: Box<CreateFn>,
}

impl FnBeanProvider {
    pub fn new<T, F>(dependencies: Vec<Dependency>, create: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&mut ResolutionContext<'_>) -> InjectionResult<T> + Send + Sync + 'static,
    {
        Self {
            bean_type: BeanType::of::<T>(),
            dependencies,
            create: Box::new(move |ctx| create(ctx).map(|bean| Arc::new(bean) as BeanValue)),
        }
    }
}

impl BeanProvider for FnBeanProvider {
    fn bean(&self, ctx: &mut ResolutionContext<'_>) -> InjectionResult<BeanValue> {
        (self.create)(ctx)
    }

    fn bean_type(&self, _types: &TypeRegistry) -> InjectionResult<BeanType> {
        Ok(self.bean_type.clone())
    }

    fn dependencies(&self) -> Option<Vec<Dependency>> {
        if self.dependencies.is_empty() {
            None
        } else {
            Some(self.dependencies.clone())
        }
    }
}
