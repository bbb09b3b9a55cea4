//! Provider instantiating dynamically described types.

use once_cell::sync::OnceCell;

use crate::bean::{BeanType, BeanValue, Dependency};
use crate::context::ResolutionContext;
use crate::error::InjectionResult;
use crate::loader::{TypeDescriptor, TypeReference, TypeRegistry};
use crate::provider::BeanProvider;

/// A creator resolving a symbolic [`TypeReference`] through the transaction's
/// type registry and instantiating the resulting descriptor.
///
/// The reference is resolved once on first use and cached; the declared
/// dependencies are supplied at registration because they cannot be derived
/// from the symbolic name.
pub struct DescribedBeanProvider {
    type_ref: TypeReference,
    dependencies: Vec<Dependency>,
    descriptor: OnceCell<TypeDescriptor>,
}

impl DescribedBeanProvider {
    pub fn new(type_ref: TypeReference, dependencies: Vec<Dependency>) -> Self {
        Self {
            type_ref,
            dependencies,
            descriptor: OnceCell::new(),
        }
    }

    pub fn type_ref(&self) -> &TypeReference {
        &self.type_ref
    }

    fn descriptor(&self, types: &TypeRegistry) -> InjectionResult<&TypeDescriptor> {
        self.descriptor
            .get_or_try_init(|| self.type_ref.resolve(types))
    }
}

impl BeanProvider for DescribedBeanProvider {
    fn bean(&self, ctx: &mut ResolutionContext<'_>) -> InjectionResult<BeanValue> {
        let descriptor = self.descriptor(ctx.types())?.clone();
        descriptor.instantiate(ctx)
    }

    fn bean_type(&self, types: &TypeRegistry) -> InjectionResult<BeanType> {
        Ok(self.descriptor(types)?.bean_type().clone())
    }

    fn dependencies(&self) -> Option<Vec<Dependency>> {
        if self.dependencies.is_empty() {
            None
        } else {
            Some(self.dependencies.clone())
        }
    }
}
