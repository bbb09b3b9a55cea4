//! Named type-loading strategies.
//!
//! A [`TypeRegistry`] maps symbolic loader names to [`TypeLoader`]
//! strategies. Resolving a symbolic type name without a loader name uses the
//! registry's designated default loader if one is set, otherwise the ambient
//! loader: the table of descriptors registered directly with the registry.
//! The reserved name [`CONTEXT_LOADER`] always refers to the ambient loader.

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::bean::{BeanType, BeanValue};
use crate::context::ResolutionContext;
use crate::error::{InjectionError, InjectionResult};

/// Reserved loader name selecting the registry's ambient loader.
pub const CONTEXT_LOADER: &str = "CONTEXT";

type ConstructorFn =
    dyn Fn(&mut ResolutionContext<'_>) -> InjectionResult<BeanValue> + Send + Sync;

/// A loadable description of a bean type: the type itself plus an optional
/// constructor able to instantiate it inside a resolution transaction.
#[derive(Clone)]
pub struct TypeDescriptor {
    bean_type: BeanType,
    constructor: Option<Arc<ConstructorFn>>,
}

impl TypeDescriptor {
    /// Descriptor for `T` without a constructor (type queries only).
    pub fn of<T: Any>() -> Self {
        Self {
            bean_type: BeanType::of::<T>(),
            constructor: None,
        }
    }

    /// Descriptor for `T` with a constructor closure.
    pub fn with_constructor<T, F>(constructor: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&mut ResolutionContext<'_>) -> InjectionResult<T> + Send + Sync + 'static,
    {
        Self {
            bean_type: BeanType::of::<T>(),
            constructor: Some(Arc::new(move |ctx| {
                constructor(ctx).map(|bean| Arc::new(bean) as BeanValue)
            })),
        }
    }

    pub fn bean_type(&self) -> &BeanType {
        &self.bean_type
    }

    /// Creates an instance of the described type.
    pub fn instantiate(&self, ctx: &mut ResolutionContext<'_>) -> InjectionResult<BeanValue> {
        match &self.constructor {
            Some(constructor) => constructor(ctx),
            None => Err(InjectionError::NotInstantiable {
                type_name: self.bean_type.name().to_string(),
            }),
        }
    }
}

/// A strategy resolving symbolic type names to loadable descriptors.
pub trait TypeLoader: Send + Sync {
    fn load(&self, type_name: &str) -> Option<TypeDescriptor>;
}

/// Table-backed [`TypeLoader`].
#[derive(Default)]
pub struct SimpleTypeLoader {
    types: RwLock<HashMap<String, TypeDescriptor>>,
}

impl SimpleTypeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, type_name: impl Into<String>, descriptor: TypeDescriptor) {
        self.types.write().insert(type_name.into(), descriptor);
    }
}

impl TypeLoader for SimpleTypeLoader {
    fn load(&self, type_name: &str) -> Option<TypeDescriptor> {
        self.types.read().get(type_name).cloned()
    }
}

/// Registry of named type loaders with a designated default.
pub struct TypeRegistry {
    loaders: RwLock<HashMap<String, Arc<dyn TypeLoader>>>,
    default_name: RwLock<Option<String>>,
    ambient: Arc<SimpleTypeLoader>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self {
            loaders: RwLock::new(HashMap::new()),
            default_name: RwLock::new(None),
            ambient: Arc::new(SimpleTypeLoader::new()),
        }
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor with the ambient loader.
    pub fn register_type(&self, type_name: impl Into<String>, descriptor: TypeDescriptor) {
        let type_name = type_name.into();
        debug!("registered ambient type: {type_name}");
        self.ambient.register(type_name, descriptor);
    }

    /// Registers a loader under `name`; passing `None` unregisters the name.
    pub fn register_loader(&self, name: &str, loader: Option<Arc<dyn TypeLoader>>) {
        match loader {
            Some(loader) => {
                debug!("registered type loader: {name}");
                self.loaders.write().insert(name.to_string(), loader);
            }
            None => {
                debug!("unregistered type loader: {name}");
                self.loaders.write().remove(name);
            }
        }
    }

    /// The registered loader names, excluding the reserved ambient name.
    pub fn loader_names(&self) -> BTreeSet<String> {
        self.loaders.read().keys().cloned().collect()
    }

    /// Resolves a loader name. `None` selects the default loader name if one
    /// is set, otherwise the ambient loader; [`CONTEXT_LOADER`] always
    /// selects the ambient loader.
    pub fn get_loader(&self, name: Option<&str>) -> InjectionResult<Arc<dyn TypeLoader>> {
        let resolved = match name {
            Some(name) => Some(name.to_string()),
            None => self.default_name.read().clone(),
        };

        match resolved {
            None => Ok(self.ambient.clone() as Arc<dyn TypeLoader>),
            Some(name) if name == CONTEXT_LOADER => Ok(self.ambient.clone() as Arc<dyn TypeLoader>),
            Some(name) => self
                .loaders
                .read()
                .get(&name)
                .cloned()
                .ok_or(InjectionError::UnknownLoader { name }),
        }
    }

    pub fn default_loader_name(&self) -> Option<String> {
        self.default_name.read().clone()
    }

    pub fn set_default_loader_name(&self, name: Option<String>) {
        *self.default_name.write() = name;
    }

    /// Resolves `type_name` through the loader selected by `loader_name`.
    pub fn load_class(
        &self,
        type_name: &str,
        loader_name: Option<&str>,
    ) -> InjectionResult<TypeDescriptor> {
        let loader = self.get_loader(loader_name)?;
        loader
            .load(type_name)
            .ok_or_else(|| InjectionError::ClassNotFound {
                type_name: type_name.to_string(),
            })
    }
}

/// A symbolic reference to a type: the type name plus an optional loader
/// name, resolved against a [`TypeRegistry`] when needed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeReference {
    type_name: String,
    loader_name: Option<String>,
}

impl TypeReference {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            loader_name: None,
        }
    }

    pub fn with_loader(type_name: impl Into<String>, loader_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            loader_name: Some(loader_name.into()),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn loader_name(&self) -> Option<&str> {
        self.loader_name.as_deref()
    }

    pub fn resolve(&self, types: &TypeRegistry) -> InjectionResult<TypeDescriptor> {
        types.load_class(&self.type_name, self.loader_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambient_loader_serves_registered_types() {
        let registry = TypeRegistry::new();
        registry.register_type("widget.Label", TypeDescriptor::of::<String>());

        let descriptor = registry.load_class("widget.Label", None).unwrap();
        assert_eq!(descriptor.bean_type(), &BeanType::of::<String>());

        let descriptor = registry
            .load_class("widget.Label", Some(CONTEXT_LOADER))
            .unwrap();
        assert_eq!(descriptor.bean_type(), &BeanType::of::<String>());
    }

    #[test]
    fn unknown_loader_is_reported() {
        let registry = TypeRegistry::new();
        let result = registry.get_loader(Some("plugin"));
        assert!(matches!(result, Err(InjectionError::UnknownLoader { .. })));
    }

    #[test]
    fn unregister_via_none() {
        let registry = TypeRegistry::new();
        let loader = Arc::new(SimpleTypeLoader::new());
        registry.register_loader("plugin", Some(loader));
        assert!(registry.loader_names().contains("plugin"));

        registry.register_loader("plugin", None);
        assert!(registry.loader_names().is_empty());
        assert!(matches!(
            registry.get_loader(Some("plugin")),
            Err(InjectionError::UnknownLoader { .. })
        ));
    }

    #[test]
    fn default_loader_name_applies_when_unset() {
        let registry = TypeRegistry::new();
        let loader = Arc::new(SimpleTypeLoader::new());
        loader.register("a.B", TypeDescriptor::of::<u32>());
        registry.register_loader("plugin", Some(loader));
        registry.set_default_loader_name(Some("plugin".to_string()));

        let descriptor = registry.load_class("a.B", None).unwrap();
        assert_eq!(descriptor.bean_type(), &BeanType::of::<u32>());
    }

    #[test]
    fn missing_type_is_class_not_found() {
        let registry = TypeRegistry::new();
        let result = registry.load_class("ghost.Type", None);
        assert!(matches!(result, Err(InjectionError::ClassNotFound { .. })));
    }
}
