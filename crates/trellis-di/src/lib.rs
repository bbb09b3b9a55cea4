//! Hierarchical dependency-injection bean container.
//!
//! This crate is the wiring core of the Trellis application framework: a
//! registry that resolves named and typed bean definitions into live
//! instances on demand, manages creation order and caching per scope, guards
//! against unresolvable dependency cycles, and lets callers register named
//! type-loading strategies for dynamically described types.
//!
//! Assembly and runtime are split into two phases. A single-threaded
//! [`ContainerBuilder`] collects [`MutableBeanStore`]s and their providers,
//! then freezes them into an immutable store tree; a thread-safe
//! [`BeanContext`] attached to that tree serves lookups, notifies creation
//! listeners and owns the [`TypeRegistry`].
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis_di::{
//!     BeanContext, ConstantBeanProvider, ContainerBuilder, Dependency, LifecycleBeanProvider,
//! };
//!
//! # fn main() -> trellis_di::InjectionResult<()> {
//! let mut builder = ContainerBuilder::new();
//! builder.add_bean_provider(
//!     None,
//!     "greeting",
//!     Arc::new(ConstantBeanProvider::new("hello".to_string())),
//! )?;
//! builder.add_bean_provider(
//!     None,
//!     "message",
//!     Arc::new(LifecycleBeanProvider::singleton_fn(
//!         vec![Dependency::on_name("greeting")],
//!         |ctx| {
//!             let greeting = ctx.get_dependent_bean(&Dependency::on_name("greeting"))?;
//!             let greeting = greeting.downcast::<String>().expect("greeting is a string");
//!             Ok(format!("{greeting}, world"))
//!         },
//!     )),
//! )?;
//!
//! let stores = builder.build();
//! let context = BeanContext::new(stores.root());
//! let message = context.get_named_bean::<String>("message")?;
//! assert_eq!(message.as_str(), "hello, world");
//! # Ok(())
//! # }
//! ```

pub mod bean;
pub mod builder;
pub mod context;
pub mod conversion;
pub mod error;
pub mod listener;
pub mod loader;
pub mod provider;
pub mod providers;
pub mod store;
pub mod usage;

pub use bean::{BeanType, BeanValue, Dependency};
pub use builder::{ContainerBuilder, FrozenStores, MutableBeanStore};
pub use context::{BeanContext, ResolutionContext};
pub use conversion::ConversionHelper;
pub use error::{InjectionError, InjectionResult};
pub use listener::{BeanCreationEvent, BeanCreationListener};
pub use loader::{
    SimpleTypeLoader, TypeDescriptor, TypeLoader, TypeReference, TypeRegistry, CONTEXT_LOADER,
};
pub use provider::{BeanProvider, Invokable};
pub use providers::{
    BeanScope, ConstantBeanProvider, DescribedBeanProvider, FnBeanProvider, LifecycleBeanProvider,
};
pub use store::{fetch_root, BeanStore, CombinedBeanStore, DefaultBeanStore, ResolutionSync};
