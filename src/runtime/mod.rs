mod channel;
mod component;
mod context;

pub use channel::{Channel, ChannelEvent, ChannelOptions};
pub use component::{Component, ComponentHandle, ComponentId, ComponentKind, ComponentResolver, Refresh, resolver_from_handles};
pub use context::LinkageContext;
