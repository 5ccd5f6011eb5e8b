//! Commonly used items.
//!
//! ```ignore
//! use tessera_pages::prelude::*;
//! ```

pub use crate::component::{Component, class};
pub use crate::hooks::{SetState, use_state};
pub use crate::host::{HostTree, MemoryHost};
pub use crate::renderer::{RenderEvent, Renderer};
pub use crate::router::{Navigator, Router};
pub use crate::scheduler::{IdleDriver, Scheduler, SliceDriver};
pub use crate::ssr::{SsrOptions, SsrRenderer};
pub use crate::vnode::{Event, PropValue, Props, VNode, component, element, text};
pub use tessera_reactive::{ReactiveObject, computed, effect};

#[cfg(target_arch = "wasm32")]
pub use crate::host::{DomHost, IdleCallbackDriver};
