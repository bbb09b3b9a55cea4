//! # Trellis DI Usage Guide
//!
//! The container wires an application together in two phases: a
//! single-threaded assembly phase driven by a [`ContainerBuilder`], and a
//! thread-safe runtime phase behind a [`BeanContext`].
//!
//! [`ContainerBuilder`]: crate::ContainerBuilder
//! [`BeanContext`]: crate::BeanContext
//!
//! ## Assembling a store hierarchy
//!
//! Stores form a tree: lookups walk from the requested store towards the
//! root, so a child store can shadow any name an ancestor defines.
//!
//! ```rust
//! use std::sync::Arc;
//! use trellis_di::{BeanContext, ConstantBeanProvider, ContainerBuilder};
//!
//! # fn main() -> trellis_di::InjectionResult<()> {
//! let mut builder = ContainerBuilder::new();
//! builder.add_bean_store("window", None)?;
//! builder.add_bean_provider(None, "title", Arc::new(ConstantBeanProvider::new("app".to_string())))?;
//! builder.add_bean_provider(
//!     Some("window"),
//!     "title",
//!     Arc::new(ConstantBeanProvider::new("window".to_string())),
//! )?;
//!
//! let stores = builder.build();
//! let context = BeanContext::new(stores.store("window")?);
//! assert_eq!(context.get_named_bean::<String>("title")?.as_str(), "window");
//!
//! context.set_default_store(stores.root());
//! assert_eq!(context.get_named_bean::<String>("title")?.as_str(), "app");
//! # Ok(())
//! # }
//! ```
//!
//! ## Scopes
//!
//! A [`LifecycleBeanProvider`] carries the caching policy: singletons are
//! produced once and shared, factories produce per request.
//!
//! [`LifecycleBeanProvider`]: crate::LifecycleBeanProvider
//!
//! ```rust
//! use std::sync::Arc;
//! use trellis_di::{BeanContext, ContainerBuilder, LifecycleBeanProvider};
//!
//! # fn main() -> trellis_di::InjectionResult<()> {
//! let mut builder = ContainerBuilder::new();
//! builder.add_bean_provider(
//!     None,
//!     "shared",
//!     Arc::new(LifecycleBeanProvider::singleton_fn(vec![], |_| Ok(42_u64))),
//! )?;
//!
//! let context = BeanContext::new(builder.build().root());
//! let first = context.get_named_bean::<u64>("shared")?;
//! let second = context.get_named_bean::<u64>("shared")?;
//! assert!(Arc::ptr_eq(&first, &second));
//! # Ok(())
//! # }
//! ```
//!
//! ## Declaring dependencies
//!
//! Providers declare what they need; the container collects the transitive
//! graph before production, locks it against concurrent resolutions and
//! serves nested requests through the [`ResolutionContext`]. Cycles that
//! cannot be resolved fail with a `CircularDependency` error instead of
//! overflowing the stack.
//!
//! [`ResolutionContext`]: crate::ResolutionContext
//!
//! ## Creation listeners
//!
//! Listeners registered with the context observe every fresh production
//! synchronously, before the bean is handed to the caller; cache hits are
//! silent. See [`BeanCreationListener`](crate::BeanCreationListener).
//!
//! ## Dynamically described types
//!
//! Named [`TypeLoader`](crate::TypeLoader) strategies registered with the
//! [`TypeRegistry`](crate::TypeRegistry) resolve symbolic type names to
//! instantiable descriptors; `DescribedBeanProvider` builds beans from such
//! references at production time.
