//! Error taxonomy of the container.
//!
//! Lookup and argument errors fail fast at the call that triggered them.
//! Failures during bean production are wrapped once at the top-level
//! `get_bean` call into [`InjectionError::Production`], naming the requested
//! bean and preserving the root cause.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type InjectionResult<T> = Result<T, InjectionError>;

/// Errors raised by the bean container.
#[derive(Debug, Error)]
pub enum InjectionError {
    /// A required argument was empty or otherwise unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No provider satisfies the requested dependency anywhere in the chain.
    #[error("no bean provider found for {dependency}")]
    NotFound { dependency: String },

    /// A bean store name did not resolve during assembly.
    #[error("unknown bean store: {name}")]
    UnknownStore { name: String },

    /// A type loader name is not registered.
    #[error("type loader is not registered: {name}")]
    UnknownLoader { name: String },

    /// A symbolic type name could not be resolved by the selected loader.
    #[error("type could not be loaded: {type_name}")]
    ClassNotFound { type_name: String },

    /// A type descriptor without a constructor was asked to instantiate.
    #[error("type cannot be instantiated: {type_name}")]
    NotInstantiable { type_name: String },

    /// Production re-entered a provider that is already producing.
    #[error("unresolvable cyclic dependency: {chain}")]
    CircularDependency { chain: String },

    /// A bean store name collided in the builder's flat namespace.
    #[error("a bean store with this name already exists: {name}")]
    DuplicateName { name: String },

    /// A bean exists but does not hold the requested Rust type.
    #[error("bean {name} is not of the requested type {expected}")]
    TypeMismatch { name: String, expected: String },

    /// A value could not be converted to the requested target type.
    #[error("value cannot be converted to {target}")]
    Conversion { target: String },

    /// Umbrella for failures while producing a bean, carrying the bean that
    /// was being requested and the underlying cause.
    #[error("production of bean {name} failed")]
    Production {
        name: String,
        #[source]
        source: Box<InjectionError>,
    },

    /// Open-ended failure reported by a user-supplied factory or initializer.
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}

impl InjectionError {
    /// Wraps `source` as a production failure of `name`, unless it already is
    /// one or identifies a dependency cycle (those are reported as-is).
    pub(crate) fn wrap_production(name: String, source: InjectionError) -> InjectionError {
        match source {
            wrapped @ (InjectionError::Production { .. }
            | InjectionError::CircularDependency { .. }) => wrapped,
            other => InjectionError::Production {
                name,
                source: Box::new(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_wrap_preserves_cause() {
        let cause = InjectionError::NotFound {
            dependency: "'db'".into(),
        };
        let wrapped = InjectionError::wrap_production("'svc'".into(), cause);
        match wrapped {
            InjectionError::Production { name, source } => {
                assert_eq!(name, "'svc'");
                assert!(matches!(*source, InjectionError::NotFound { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cycles_are_never_double_wrapped() {
        let cycle = InjectionError::CircularDependency {
            chain: "'a' -> 'b' -> 'a'".into(),
        };
        let wrapped = InjectionError::wrap_production("'a'".into(), cycle);
        assert!(matches!(
            wrapped,
            InjectionError::CircularDependency { .. }
        ));
    }
}
