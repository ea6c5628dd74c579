//! Linkage engine - the main entry point for Linkflow.
//!
//! The engine owns the session-wide machinery around the dispatcher:
//! - The linkage registry and the execution log
//! - The notification channel widgets subscribe to
//! - The environment table exposed to handler code
//! - A tokio runtime, and a queue for fire-and-forget trigger requests

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use serde_json::Value;
use tokio::runtime::{Builder, Runtime};

use crate::{
    Config, LinkflowError, Result,
    common::{MemCache, Queue, Shutdown},
    dispatcher::Dispatcher,
    log::ExecutionLog,
    registry::LinkageRegistry,
    runtime::{Channel, ComponentResolver},
};

/// Capacity of the engine environment table.
const ENV_CACHE_SIZE: usize = 1024;

/// A trigger submission for the fire-and-forget [`Engine::post`] path.
///
/// Carries its own resolver because the engine never owns component storage;
/// the resolver is consulted when the request is drained, not when it is
/// posted.
pub struct TriggerRequest {
    pub source_id: String,
    pub trigger_event: String,
    pub event_data: Value,
    pub source_value: Value,
    pub resolver: ComponentResolver,
}

impl TriggerRequest {
    pub fn new(
        source_id: &str,
        trigger_event: &str,
        event_data: Value,
        source_value: Value,
        resolver: ComponentResolver,
    ) -> Self {
        Self {
            source_id: source_id.to_string(),
            trigger_event: trigger_event.to_string(),
            event_data,
            source_value,
            resolver,
        }
    }
}

/// The main linkage engine.
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new().build()?;
/// engine.launch();
///
/// engine.registry().add(linkage)?;
/// engine.trigger_blocking("form1", "form.submit", event_data, source_value, &resolver);
///
/// // Inspect outcomes
/// for record in engine.logs().records() {
///     println!("{} -> success: {}", record.linkage_id, record.success);
/// }
///
/// engine.shutdown();
/// ```
pub struct Engine {
    /// Configured linkages.
    registry: Arc<LinkageRegistry>,
    /// Append-only dispatch outcome log.
    log: Arc<ExecutionLog>,
    /// Notification channel for widget subscriptions.
    channel: Arc<Channel>,
    /// Environment table exposed to handler code.
    env: Arc<MemCache<String, String>>,
    /// The trigger dispatcher.
    dispatcher: Arc<Dispatcher>,
    /// Queue of posted trigger requests, drained sequentially.
    trigger_queue: Arc<Queue<TriggerRequest>>,

    /// Flag indicating if the engine is running.
    running: Arc<AtomicBool>,
    /// Tokio runtime for async task execution.
    runtime: Arc<Runtime>,
    /// Shutdown coordinator for graceful termination.
    shutdown: Arc<Shutdown>,
}

impl Engine {
    /// Creates a new engine with the given configuration.
    pub fn new_with_config(config: Config) -> Self {
        let runtime = Arc::new(Builder::new_multi_thread().worker_threads(config.async_worker_thread_number.into()).enable_all().build().unwrap());

        Self::with_runtime(config, runtime)
    }

    pub(crate) fn with_runtime(
        config: Config,
        runtime: Arc<Runtime>,
    ) -> Self {
        let registry = Arc::new(LinkageRegistry::new());
        let log = Arc::new(ExecutionLog::new());
        let channel = Arc::new(Channel::new(runtime.clone()));

        let env = Arc::new(MemCache::new(ENV_CACHE_SIZE));
        config.env.iter().for_each(|(k, v)| env.set(k.clone(), v.clone()));

        let dispatcher = Arc::new(Dispatcher::new(registry.clone(), log.clone(), channel.clone(), env.clone()));
        let trigger_queue = Queue::new(config.trigger_queue_size);

        Self {
            registry,
            log,
            channel,
            env,
            dispatcher,
            trigger_queue,
            running: Arc::new(AtomicBool::new(false)),
            runtime,
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    /// Starts the engine.
    ///
    /// This method:
    /// - Begins fanning out channel events to subscribers
    /// - Spawns the background task that drains posted trigger requests,
    ///   one at a time in submission order
    pub fn launch(&self) {
        if self.running.swap(true, Ordering::Relaxed) {
            return;
        }

        self.channel.listen();

        let trigger_queue = self.trigger_queue.clone();
        let dispatcher = self.dispatcher.clone();
        let shutdown = self.shutdown.clone();
        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    Some(req) = trigger_queue.next_async() => {
                        dispatcher.trigger(&req.source_id, &req.trigger_event, req.event_data, req.source_value, &req.resolver).await;
                    }
                }
            }
        });
    }

    /// Gracefully shuts down the engine.
    ///
    /// An in-flight linkage batch runs to completion; only the queue drain
    /// and channel fan-out loops stop.
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::Relaxed) {
            return;
        }

        self.shutdown.shutdown();
        self.channel.shutdown();
    }

    /// Dispatch a source event through the matched linkages and wait for the
    /// whole batch to finish or fail.
    pub async fn trigger(
        &self,
        source_id: &str,
        trigger_event: &str,
        event_data: Value,
        source_value: Value,
        resolver: &ComponentResolver,
    ) {
        self.dispatcher.trigger(source_id, trigger_event, event_data, source_value, resolver).await
    }

    /// Blocking variant of [`Engine::trigger`] for non-async hosts.
    ///
    /// Must not be called from inside the engine runtime.
    pub fn trigger_blocking(
        &self,
        source_id: &str,
        trigger_event: &str,
        event_data: Value,
        source_value: Value,
        resolver: &ComponentResolver,
    ) {
        self.runtime.block_on(self.trigger(source_id, trigger_event, event_data, source_value, resolver))
    }

    /// Submit a trigger request without waiting for it.
    ///
    /// Posted requests are drained by a background task one at a time in
    /// submission order.
    pub fn post(
        &self,
        request: TriggerRequest,
    ) -> Result<()> {
        if !self.running.load(Ordering::Relaxed) {
            return Err(LinkflowError::Engine("Engine is not running".to_string()));
        }
        self.trigger_queue.send(request)
    }

    /// Returns the linkage registry.
    pub fn registry(&self) -> Arc<LinkageRegistry> {
        self.registry.clone()
    }

    /// Returns the execution log.
    pub fn logs(&self) -> Arc<ExecutionLog> {
        self.log.clone()
    }

    /// Returns a reference to the notification channel.
    pub fn channel(&self) -> Arc<Channel> {
        self.channel.clone()
    }

    /// Returns the environment table.
    pub fn env(&self) -> Arc<MemCache<String, String>> {
        self.env.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering as AtomicOrdering},
        time::Duration,
    };

    use serde_json::json;

    use super::*;
    use crate::{
        EngineBuilder,
        model::{ActionType, Linkage},
        runtime::{ChannelEvent, ChannelOptions, Component, ComponentHandle, ComponentKind, resolver_from_handles},
    };

    fn wait_until(f: impl Fn() -> bool) -> bool {
        for _ in 0..100 {
            if f() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        false
    }

    #[test]
    fn test_trigger_delivers_notification() {
        let engine = EngineBuilder::new().async_worker_thread_number(2).build().unwrap();
        engine.launch();

        let chart = ComponentHandle::new(Component::new("chart1", ComponentKind::Chart));
        let resolver = resolver_from_handles([ComponentHandle::new(Component::new("form1", ComponentKind::Form)), chart.clone()]);

        let mut linkage = Linkage::new("form1", "chart1", "form.submit", ActionType::Refresh);
        linkage.id = "l1".to_string();
        engine.registry().add(linkage).unwrap();

        let received = Arc::new(AtomicUsize::new(0));
        let counter = received.clone();
        ChannelEvent::channel(engine.channel(), ChannelOptions::with_cid("chart1".to_string())).on_refresh(move |e| {
            assert_eq!(e.linkage_id, "l1");
            counter.fetch_add(1, AtomicOrdering::SeqCst);
        });

        engine.trigger_blocking("form1", "form.submit", json!({}), json!({"city": "Seattle"}), &resolver);

        assert!(wait_until(|| received.load(AtomicOrdering::SeqCst) == 1));
        assert_eq!(engine.logs().len(), 1);
        assert!(engine.logs().records()[0].success);
        assert_eq!(chart.snapshot().linkage_params.get::<String>("city"), Some("Seattle".to_string()));

        engine.shutdown();
    }

    #[test]
    fn test_post_requires_running_engine() {
        let engine = EngineBuilder::new().async_worker_thread_number(2).build().unwrap();
        let resolver = resolver_from_handles([]);

        let result = engine.post(TriggerRequest::new("form1", "form.submit", json!({}), json!({}), resolver));
        assert!(result.is_err());
    }

    #[test]
    fn test_posted_trigger_is_drained() {
        let engine = EngineBuilder::new().async_worker_thread_number(2).build().unwrap();
        engine.launch();

        let chart = ComponentHandle::new(Component::new("chart1", ComponentKind::Chart));
        let resolver = resolver_from_handles([ComponentHandle::new(Component::new("form1", ComponentKind::Form)), chart.clone()]);

        engine.registry().add(Linkage::new("form1", "chart1", "form.submit", ActionType::Refresh)).unwrap();

        engine.post(TriggerRequest::new("form1", "form.submit", json!({}), json!({"page": 2}), resolver)).unwrap();

        let logs = engine.logs();
        assert!(wait_until(|| logs.len() == 1));
        assert_eq!(chart.snapshot().linkage_params.get::<i64>("page"), Some(2));

        engine.shutdown();
    }

    #[test]
    fn test_handler_env_via_engine() {
        let engine = EngineBuilder::new().async_worker_thread_number(2).env("API_BASE", "http://localhost:8080").build().unwrap();
        engine.launch();

        let chart = ComponentHandle::new(Component::new("chart1", ComponentKind::Chart));
        let resolver = resolver_from_handles([ComponentHandle::new(Component::new("form1", ComponentKind::Form)), chart.clone()]);

        let code = r#"
        function handle(context, params, component) {
            component.linkageParams.endpoint = host.env.API_BASE + "/data";
        }
        "#;
        engine.registry().add(Linkage::new("form1", "chart1", "form.submit", ActionType::Custom).with_handler(code)).unwrap();

        engine.trigger_blocking("form1", "form.submit", json!({}), json!({}), &resolver);

        assert_eq!(
            chart.snapshot().linkage_params.get::<String>("endpoint"),
            Some("http://localhost:8080/data".to_string())
        );

        engine.shutdown();
    }
}
