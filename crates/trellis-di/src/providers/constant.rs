//! Provider for fixed values.

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::bean::{BeanType, BeanValue};
use crate::context::ResolutionContext;
use crate::error::InjectionResult;
use crate::loader::TypeRegistry;
use crate::provider::BeanProvider;

/// A provider handing out a constant value.
///
/// Constants sit outside the lifecycle machinery: they declare no
/// dependencies, never lock, and are always available. When a target type is
/// declared, the value is converted through the store chain's conversion
/// helper on first access and the result is cached.
pub struct ConstantBeanProvider {
    value: BeanValue,
    bean_type: BeanType,
    needs_conversion: bool,
    converted: Mutex<Option<BeanValue>>,
}

impl ConstantBeanProvider {
    /// Wraps `value` as-is; the bean type is the value's own type.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            bean_type: BeanType::of::<T>(),
            needs_conversion: false,
            converted: Mutex::new(None),
        }
    }

    /// Wraps a type-erased value with a declared target type; the value is
    /// converted to `target` when the bean is first requested.
    pub fn with_type(target: BeanType, value: BeanValue) -> Self {
        Self {
            value,
            bean_type: target,
            needs_conversion: true,
            converted: Mutex::new(None),
        }
    }

    /// The raw value this provider was created with.
    pub fn value(&self) -> &BeanValue {
        &self.value
    }
}

impl BeanProvider for ConstantBeanProvider {
    fn bean(&self, ctx: &mut ResolutionContext<'_>) -> InjectionResult<BeanValue> {
        if !self.needs_conversion {
            return Ok(self.value.clone());
        }

        if let Some(cached) = self.converted.lock().clone() {
            return Ok(cached);
        }

        let converted = ctx.conversion_helper().convert(&self.bean_type, &self.value)?;
        *self.converted.lock() = Some(converted.clone());
        Ok(converted)
    }

    fn bean_type(&self, _types: &TypeRegistry) -> InjectionResult<BeanType> {
        Ok(self.bean_type.clone())
    }
}
