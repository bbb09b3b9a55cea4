//! Bean provider implementations shipped with the crate.

mod constant;
mod described;
mod func;
mod lifecycle;

pub use constant::ConstantBeanProvider;
pub use described::DescribedBeanProvider;
pub use func::FnBeanProvider;
pub use lifecycle::{BeanScope, LifecycleBeanProvider};
