//! Component model seen by the linkage engine.
//!
//! Components are owned by the hosting application; the engine only reaches
//! them through a caller-supplied resolver and mutates them through shared
//! handles. Capabilities the engine may invoke (currently only [`Refresh`])
//! attach explicitly to a handle instead of being probed by field existence.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, ShareLock, common::Vars};

/// component id
pub type ComponentId = String;

/// The kind of widget a component renders as.
///
/// The engine never interprets the kind; it exists so hosts can round-trip
/// their component records through the same document as the linkages.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComponentKind {
    #[default]
    Form,
    Table,
    Chart,
    Text,
    Image,
}

/// Externally owned component state the engine can read and mutate.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: ComponentId,
    pub kind: ComponentKind,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub disabled: bool,
    /// Widget configuration fields; the surface `update_config` may overwrite.
    #[serde(default)]
    pub config: Vars,
    /// Parameters merged in by `refresh` actions, read by the owning widget
    /// when it re-fetches its data.
    #[serde(default)]
    pub linkage_params: Vars,
}

fn default_visible() -> bool {
    true
}

impl Component {
    pub fn new(
        id: &str,
        kind: ComponentKind,
    ) -> Self {
        Self {
            id: id.to_string(),
            kind,
            name: String::new(),
            visible: true,
            disabled: false,
            config: Vars::new(),
            linkage_params: Vars::new(),
        }
    }

    pub fn with_config(
        mut self,
        config: Vars,
    ) -> Self {
        self.config = config;
        self
    }
}

/// Optional capability: a component that can re-fetch its data on demand.
///
/// `refresh` actions invoke and await this when the target handle carries it.
#[async_trait]
pub trait Refresh: Send + Sync {
    async fn refresh(
        &self,
        params: Vars,
    ) -> Result<()>;
}

/// Shared handle to a component plus its optional capabilities.
#[derive(Clone)]
pub struct ComponentHandle {
    state: ShareLock<Component>,
    refresh: Option<Arc<dyn Refresh>>,
}

impl ComponentHandle {
    pub fn new(component: Component) -> Self {
        Self {
            state: Arc::new(RwLock::new(component)),
            refresh: None,
        }
    }

    /// Attach a [`Refresh`] capability to this handle.
    pub fn with_refresh(
        mut self,
        capability: Arc<dyn Refresh>,
    ) -> Self {
        self.refresh = Some(capability);
        self
    }

    pub fn id(&self) -> ComponentId {
        self.state.read().unwrap().id.clone()
    }

    /// A point-in-time copy of the component state.
    pub fn snapshot(&self) -> Component {
        self.state.read().unwrap().clone()
    }

    /// Mutate the component state under the write lock.
    pub fn update<F>(
        &self,
        f: F,
    ) where
        F: FnOnce(&mut Component),
    {
        let mut state = self.state.write().unwrap();
        f(&mut state);
    }

    pub fn refresh_capability(&self) -> Option<Arc<dyn Refresh>> {
        self.refresh.clone()
    }

    /// JSON snapshot handed to handler code as the `component` binding.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self.snapshot()).unwrap_or(Value::Null)
    }
}

/// Resolver handed to the dispatcher at call time.
///
/// The engine never owns component storage; a `None` result at dispatch time
/// degrades to a logged failure for that linkage.
pub type ComponentResolver = Arc<dyn Fn(&str) -> Option<ComponentHandle> + Send + Sync>;

/// Build a resolver over a fixed set of handles.
pub fn resolver_from_handles(handles: impl IntoIterator<Item = ComponentHandle>) -> ComponentResolver {
    let map: HashMap<ComponentId, ComponentHandle> = handles.into_iter().map(|h| (h.id(), h)).collect();
    Arc::new(move |id| map.get(id).cloned())
}
