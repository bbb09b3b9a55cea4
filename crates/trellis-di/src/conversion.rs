//! Value conversion between bean types.
//!
//! A [`ConversionHelper`] can be attached to a bean store; lookups walk the
//! store chain and fall back to a default helper when no store carries one.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::bean::{BeanType, BeanValue};
use crate::error::{InjectionError, InjectionResult};

type ConverterFn = dyn Fn(&BeanValue) -> Option<BeanValue> + Send + Sync;

/// Registry of conversion functions keyed by target type.
///
/// A converter receives the source value and returns the converted bean, or
/// `None` when the source is not convertible. Values already holding the
/// target type pass through unchanged.
#[derive(Default)]
pub struct ConversionHelper {
    converters: RwLock<HashMap<TypeId, Arc<ConverterFn>>>,
}

impl ConversionHelper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a converter producing values of type `T`.
    pub fn register<T, F>(&self, converter: F)
    where
        T: Any + Send + Sync,
        F: Fn(&BeanValue) -> Option<T> + Send + Sync + 'static,
    {
        let erased: Arc<ConverterFn> =
            Arc::new(move |value| converter(value).map(|out| Arc::new(out) as BeanValue));
        self.converters.write().insert(TypeId::of::<T>(), erased);
    }

    /// Converts `value` to `target`, passing through values that already hold
    /// the target type.
    pub fn convert(&self, target: &BeanType, value: &BeanValue) -> InjectionResult<BeanValue> {
        if target.matches(value) {
            return Ok(value.clone());
        }

        let converter = self.converters.read().get(&target.id()).cloned();
        if let Some(converter) = converter {
            if let Some(converted) = converter(value) {
                return Ok(converted);
            }
        }

        Err(InjectionError::Conversion {
            target: target.name().to_string(),
        })
    }

    /// Whether a converter for `target` is registered.
    pub fn has_converter(&self, target: &BeanType) -> bool {
        self.converters.read().contains_key(&target.id())
    }
}
