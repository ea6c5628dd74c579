//! # Linkflow
//!
//! Linkflow is a lightweight, event-driven component linkage engine written in Rust.
//! It is designed to be embedded in report/dashboard designers to wire independent
//! visual components (forms, tables, charts) together: an event on a source
//! component drives mapped actions on target components.
//!
//! ## Core Features
//!
//! - **Declarative Linkages**: Plain-data linkage records connect a source event to a target action
//! - **Parameter Mapping**: Direct/rename/fixed/expression derivations from the source payload
//! - **Sandboxed Handlers**: User-supplied expressions and custom actions run in an embedded JavaScript interpreter
//! - **Ordered Dispatch**: Matched linkages execute strictly one at a time, with optional per-linkage delay
//! - **Observable**: Every dispatch attempt lands in an append-only execution log; actions publish notifications on an injected channel
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use linkflow::{ActionType, Component, ComponentHandle, ComponentKind, EngineBuilder, Linkage, resolver_from_handles};
//!
//! let engine = EngineBuilder::new().build().unwrap();
//! engine.launch();
//!
//! let form = ComponentHandle::new(Component::new("form1", ComponentKind::Form));
//! let chart = ComponentHandle::new(Component::new("chart1", ComponentKind::Chart));
//! let resolver = resolver_from_handles([form, chart]);
//!
//! engine.registry().add(Linkage::new("form1", "chart1", "form.submit", ActionType::Refresh))?;
//! engine.trigger_blocking("form1", "form.submit", serde_json::json!({}), serde_json::json!({"city": "Seattle"}), &resolver);
//! ```

mod builder;
mod common;
mod config;
mod dispatcher;
mod engine;
mod error;
mod events;
mod linkage;
mod log;
mod model;
mod registry;
mod runtime;
mod utils;

use std::sync::{Arc, RwLock};

pub use builder::EngineBuilder;
pub use common::{MemCache, Vars};
pub use config::Config;
pub use dispatcher::Dispatcher;
pub use engine::{Engine, TriggerRequest};
pub use error::LinkflowError;
pub use events::{Event, HandlerLog, Notification};
pub use linkage::actions::{Action, create_action};
pub use linkage::mapper;
pub use linkage::runner::{HandlerBindings, HandlerOutcome, HandlerRunner};
pub use log::{ExecutionLog, ExecutionRecord};
pub use model::*;
pub use registry::{ComponentLinkages, LinkageRegistry};
pub use runtime::{
    Channel, ChannelEvent, ChannelOptions, Component, ComponentHandle, ComponentId, ComponentKind, ComponentResolver, LinkageContext, Refresh, resolver_from_handles,
};

/// Result type alias for Linkflow operations.
pub type Result<T> = std::result::Result<T, LinkflowError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;
