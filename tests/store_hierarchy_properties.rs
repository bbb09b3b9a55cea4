//! Property tests over the published API: delegation and shadowing hold for
//! arbitrary store depths.

use std::sync::Arc;

use proptest::prelude::*;
use trellis_di::{BeanContext, ConstantBeanProvider, ContainerBuilder};

proptest! {
    /// A bean defined at the root is visible from a chain of child stores of
    /// any depth.
    #[test]
    fn delegation_spans_arbitrary_depth(depth in 1usize..6, value in any::<i32>()) {
        let mut builder = ContainerBuilder::new();
        builder
            .add_bean_provider(None, "shared", Arc::new(ConstantBeanProvider::new(value)))
            .unwrap();

        let mut parent: Option<String> = None;
        for level in 0..depth {
            let name = format!("level{level}");
            builder.add_bean_store(&name, parent.as_deref()).unwrap();
            parent = Some(name);
        }

        let stores = builder.build();
        let deepest = stores.store(&format!("level{}", depth - 1)).unwrap();
        let context = BeanContext::new(deepest);

        prop_assert_eq!(*context.get_named_bean::<i32>("shared").unwrap(), value);
    }

    /// The definition closest to the lookup store always wins when every
    /// level redefines the same name.
    #[test]
    fn nearest_definition_wins(depth in 1usize..6) {
        let mut builder = ContainerBuilder::new();
        builder
            .add_bean_provider(None, "value", Arc::new(ConstantBeanProvider::new(-1_i32)))
            .unwrap();

        let mut parent: Option<String> = None;
        for level in 0..depth {
            let name = format!("level{level}");
            builder.add_bean_store(&name, parent.as_deref()).unwrap();
            builder
                .add_bean_provider(
                    Some(name.as_str()),
                    "value",
                    Arc::new(ConstantBeanProvider::new(level as i32)),
                )
                .unwrap();
            parent = Some(name);
        }

        let stores = builder.build();
        for level in 0..depth {
            let store = stores.store(&format!("level{level}")).unwrap();
            let context = BeanContext::new(store);
            prop_assert_eq!(*context.get_named_bean::<i32>("value").unwrap(), level as i32);
        }
    }
}
