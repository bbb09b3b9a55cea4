//! Core value and reference types shared across the container.

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Type-erased, shared handle to a managed bean.
///
/// Every value produced by the container is handed out behind this alias.
/// Typed access goes through the downcasting accessors on
/// [`BeanContext`](crate::BeanContext).
pub type BeanValue = Arc<dyn Any + Send + Sync>;

/// Runtime type descriptor of a bean: a `TypeId` paired with a readable name.
///
/// Equality and hashing consider the `TypeId` only; the name exists for
/// diagnostics and deterministic ordering.
#[derive(Clone)]
pub struct BeanType {
    id: TypeId,
    name: Arc<str>,
}

impl BeanType {
    /// Describes the concrete Rust type `T`.
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: Arc::from(std::any::type_name::<T>()),
        }
    }

    /// Builds a descriptor from raw parts, e.g. for dynamically loaded types.
    pub fn from_parts(id: TypeId, name: &str) -> Self {
        Self {
            id,
            name: Arc::from(name),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `value` holds an instance of this type.
    pub fn matches(&self, value: &BeanValue) -> bool {
        (**value).type_id() == self.id
    }
}

impl PartialEq for BeanType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for BeanType {}

impl Hash for BeanType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Ord for BeanType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for BeanType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for BeanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BeanType({})", self.name)
    }
}

impl fmt::Display for BeanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A reference to another bean, resolvable against a store chain.
///
/// Dependencies are plain values: they can be declared when a provider is
/// registered and are only resolved when a bean is actually produced.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// Reference by registration name.
    Name(String),
    /// Reference by produced bean type.
    Type(BeanType),
}

impl Dependency {
    pub fn on_name(name: impl Into<String>) -> Self {
        Dependency::Name(name.into())
    }

    pub fn on_type<T: Any>() -> Self {
        Dependency::Type(BeanType::of::<T>())
    }

    pub fn of_type(bean_type: BeanType) -> Self {
        Dependency::Type(bean_type)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::Name(name) => write!(f, "'{name}'"),
            Dependency::Type(ty) => write!(f, "[type {ty}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bean_type_equality_ignores_name() {
        let a = BeanType::of::<String>();
        let b = BeanType::from_parts(TypeId::of::<String>(), "alias");
        assert_eq!(a, b);
    }

    #[test]
    fn bean_type_matches_value() {
        let value: BeanValue = Arc::new(42_u32);
        assert!(BeanType::of::<u32>().matches(&value));
        assert!(!BeanType::of::<i64>().matches(&value));
    }

    #[test]
    fn dependency_display() {
        assert_eq!(Dependency::on_name("db").to_string(), "'db'");
        let ty = Dependency::on_type::<u8>().to_string();
        assert!(ty.contains("u8"));
    }
}
