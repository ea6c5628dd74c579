//! Trigger dispatcher: the entry point of the linkage engine.
//!
//! The dispatcher is responsible for:
//! - Matching enabled linkages against a source event
//! - Resolving component handles through the caller-supplied resolver
//! - Driving each matched linkage through the mapper and its action
//! - Recording every outcome in the execution log

use std::{sync::Arc, time::Duration};

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::{
    LinkflowError, Result,
    common::MemCache,
    linkage::{actions, mapper},
    log::{ExecutionLog, ExecutionRecord},
    model::Linkage,
    registry::LinkageRegistry,
    runtime::{Channel, ComponentResolver, LinkageContext},
};

/// Linkage execution dispatcher.
///
/// Within one [`Dispatcher::trigger`] call, matched linkages execute strictly
/// one at a time in registry order: a linkage's `delay` postpones the start
/// of the next matched linkage in the same batch. This ordering guarantee
/// gives deterministic replay for a fixed configuration and event sequence.
/// Distinct `trigger` calls are not mutually ordered.
pub struct Dispatcher {
    /// Configured linkages.
    registry: Arc<LinkageRegistry>,
    /// Dispatch outcome log.
    log: Arc<ExecutionLog>,
    /// Notification channel handed to action contexts.
    channel: Arc<Channel>,
    /// Engine environment table exposed to handler code.
    env: Arc<MemCache<String, String>>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<LinkageRegistry>,
        log: Arc<ExecutionLog>,
        channel: Arc<Channel>,
        env: Arc<MemCache<String, String>>,
    ) -> Self {
        Self {
            registry,
            log,
            channel,
            env,
        }
    }

    /// Dispatch a source event to every matching enabled linkage.
    ///
    /// No match is a silent no-op. A failing linkage is logged and never
    /// aborts the remaining batch; `trigger` itself does not return errors
    /// for linkage failures. The execution log is the error surface.
    pub async fn trigger(
        &self,
        source_id: &str,
        trigger_event: &str,
        event_data: Value,
        source_value: Value,
        resolver: &ComponentResolver,
    ) {
        let matched: Vec<Linkage> = self.registry.linkages_from_source(source_id).into_iter().filter(|l| l.trigger_event == trigger_event).collect();

        if matched.is_empty() {
            trace!(source = source_id, event = trigger_event, "no matched linkages");
            return;
        }

        debug!(source = source_id, event = trigger_event, count = matched.len(), "dispatching linkages");

        for linkage in matched {
            let source = resolver(&linkage.source_component_id);
            let target = resolver(&linkage.target_component_id);

            let (source, target) = match (source, target) {
                (Some(source), Some(target)) => (source, target),
                _ => {
                    let reason = LinkflowError::ComponentNotFound(format!(
                        "linkage {}: source '{}' or target '{}' is not resolvable",
                        linkage.id, linkage.source_component_id, linkage.target_component_id
                    ));
                    warn!(linkage = %linkage.id, "{}", reason);
                    self.log.append(ExecutionRecord::failure(&linkage, reason.to_string()));
                    continue;
                }
            };

            let ctx = LinkageContext::new(
                linkage.id.clone(),
                source,
                target,
                event_data.clone(),
                source_value.clone(),
                self.env.clone(),
                self.channel.clone(),
            );

            match self.execute_linkage(&linkage, &ctx).await {
                Ok(()) => self.log.append(ExecutionRecord::success(&linkage)),
                Err(e) => {
                    warn!(linkage = %linkage.id, "linkage execution failed: {}", e);
                    self.log.append(ExecutionRecord::failure(&linkage, e.to_string()));
                }
            }
        }
    }

    /// Run one linkage: resolve parameters, honor the delay, apply the action.
    async fn execute_linkage(
        &self,
        linkage: &Linkage,
        ctx: &LinkageContext,
    ) -> Result<()> {
        let params = mapper::resolve_mappings(&linkage.parameter_mappings, ctx.source_value());

        if let Some(delay) = linkage.delay {
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        let action = actions::create_action(linkage);
        action.apply(ctx, params).await
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Instant,
    };

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::{
        common::Vars,
        model::{ActionType, ParameterMapping},
        runtime::{Component, ComponentHandle, ComponentKind, Refresh, resolver_from_handles},
    };

    struct Harness {
        dispatcher: Dispatcher,
        log: Arc<ExecutionLog>,
        runtime: Arc<tokio::runtime::Runtime>,
    }

    fn harness(registry: LinkageRegistry) -> Harness {
        let runtime = Arc::new(tokio::runtime::Runtime::new().unwrap());
        let channel = Arc::new(Channel::new(runtime.clone()));
        let log = Arc::new(ExecutionLog::new());
        let env = Arc::new(MemCache::new(1024));
        let dispatcher = Dispatcher::new(Arc::new(registry), log.clone(), channel, env);
        Harness {
            dispatcher,
            log,
            runtime,
        }
    }

    fn linkage(
        id: &str,
        source: &str,
        target: &str,
        event: &str,
        action: ActionType,
    ) -> Linkage {
        let mut l = Linkage::new(source, target, event, action);
        l.id = id.to_string();
        l
    }

    /// Records the instant and params of every refresh call.
    struct Recorder(Mutex<Vec<(Instant, Vars)>>);

    #[async_trait]
    impl Refresh for Recorder {
        async fn refresh(
            &self,
            params: Vars,
        ) -> crate::Result<()> {
            self.0.lock().unwrap().push((Instant::now(), params));
            Ok(())
        }
    }

    #[test]
    fn test_unmatched_trigger_is_a_no_op() {
        let registry = LinkageRegistry::new();
        registry.add(linkage("l1", "form1", "chart1", "form.submit", ActionType::Refresh)).unwrap();
        let h = harness(registry);

        let resolver = resolver_from_handles([ComponentHandle::new(Component::new("form1", ComponentKind::Form))]);

        // unknown source
        h.runtime.block_on(h.dispatcher.trigger("formA", "button.click", json!({}), json!({}), &resolver));
        // known source, wrong event
        h.runtime.block_on(h.dispatcher.trigger("form1", "button.click", json!({}), json!({}), &resolver));

        assert!(h.log.is_empty());
    }

    #[test]
    fn test_disabled_linkage_is_invisible() {
        let registry = LinkageRegistry::new();
        let mut l = linkage("l1", "form1", "chart1", "form.submit", ActionType::Refresh);
        l.enabled = false;
        registry.add(l).unwrap();
        let h = harness(registry);

        let chart = ComponentHandle::new(Component::new("chart1", ComponentKind::Chart));
        let resolver = resolver_from_handles([ComponentHandle::new(Component::new("form1", ComponentKind::Form)), chart.clone()]);

        h.runtime.block_on(h.dispatcher.trigger("form1", "form.submit", json!({}), json!({"city": "Seattle"}), &resolver));

        assert!(h.log.is_empty());
        assert!(chart.snapshot().linkage_params.is_empty());
    }

    #[test]
    fn test_missing_component_logs_failure_and_continues() {
        let registry = LinkageRegistry::new();
        registry.add(linkage("l1", "form1", "ghost", "form.submit", ActionType::Refresh)).unwrap();
        registry.add(linkage("l2", "form1", "chart1", "form.submit", ActionType::Refresh)).unwrap();
        let h = harness(registry);

        let chart = ComponentHandle::new(Component::new("chart1", ComponentKind::Chart));
        let resolver = resolver_from_handles([ComponentHandle::new(Component::new("form1", ComponentKind::Form)), chart.clone()]);

        h.runtime.block_on(h.dispatcher.trigger("form1", "form.submit", json!({}), json!({"city": "Seattle"}), &resolver));

        let records = h.log.records();
        assert_eq!(records.len(), 2);
        assert!(!records[0].success);
        assert!(records[0].error.as_deref().unwrap_or_default().contains("not resolvable"));
        assert!(records[1].success);
        assert_eq!(chart.snapshot().linkage_params.get::<String>("city"), Some("Seattle".to_string()));
    }

    #[test]
    fn test_pass_through_bag_does_not_alias_source_value() {
        let registry = LinkageRegistry::new();
        registry.add(linkage("l1", "form1", "chart1", "form.submit", ActionType::Refresh)).unwrap();
        let h = harness(registry);

        let chart = ComponentHandle::new(Component::new("chart1", ComponentKind::Chart));
        let resolver = resolver_from_handles([ComponentHandle::new(Component::new("form1", ComponentKind::Form)), chart.clone()]);

        let source_value = json!({"filters": {"region": "west"}});
        h.runtime.block_on(h.dispatcher.trigger("form1", "form.submit", json!({}), source_value.clone(), &resolver));

        chart.update(|c| c.linkage_params.set("filters", json!({"region": "east"})));
        assert_eq!(source_value["filters"]["region"], "west");
    }

    #[test]
    fn test_mappings_applied_before_action() {
        let registry = LinkageRegistry::new();
        registry
            .add(
                linkage("l1", "form1", "table1", "form.submit", ActionType::Refresh).with_mappings(vec![
                    ParameterMapping::rename("formData.city", "city"),
                    ParameterMapping::fixed("pageSize", json!(20)),
                ]),
            )
            .unwrap();
        let h = harness(registry);

        let table = ComponentHandle::new(Component::new("table1", ComponentKind::Table));
        let resolver = resolver_from_handles([ComponentHandle::new(Component::new("form1", ComponentKind::Form)), table.clone()]);

        h.runtime.block_on(h.dispatcher.trigger("form1", "form.submit", json!({}), json!({"formData": {"city": "Seattle"}}), &resolver));

        let params = table.snapshot().linkage_params;
        assert_eq!(params.get::<String>("city"), Some("Seattle".to_string()));
        assert_eq!(params.get::<i64>("pageSize"), Some(20));
    }

    #[test]
    fn test_delay_postpones_the_next_linkage() {
        let registry = LinkageRegistry::new();
        registry.add(linkage("l1", "form1", "x", "form.submit", ActionType::Refresh).with_delay(200)).unwrap();
        registry.add(linkage("l2", "form1", "y", "form.submit", ActionType::Refresh)).unwrap();
        let h = harness(registry);

        let y_recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let resolver = resolver_from_handles([
            ComponentHandle::new(Component::new("form1", ComponentKind::Form)),
            ComponentHandle::new(Component::new("x", ComponentKind::Chart)),
            ComponentHandle::new(Component::new("y", ComponentKind::Chart)).with_refresh(y_recorder.clone()),
        ]);

        let start = Instant::now();
        h.runtime.block_on(h.dispatcher.trigger("form1", "form.submit", json!({}), json!({}), &resolver));

        let calls = y_recorder.0.lock().unwrap();
        assert_eq!(calls.len(), 1);
        // the delayed first linkage blocks the second one in the batch
        assert!(calls[0].0.duration_since(start) >= Duration::from_millis(200));

        let records = h.log.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].linkage_id, "l1");
        assert_eq!(records[1].linkage_id, "l2");
    }

    #[test]
    fn test_failing_custom_handler_does_not_abort_batch() {
        let registry = LinkageRegistry::new();
        registry
            .add(linkage("l1", "form1", "chart1", "form.submit", ActionType::Custom).with_handler("throw new Error('boom');"))
            .unwrap();
        registry.add(linkage("l2", "form1", "chart1", "form.submit", ActionType::Refresh)).unwrap();
        let h = harness(registry);

        let chart = ComponentHandle::new(Component::new("chart1", ComponentKind::Chart));
        let resolver = resolver_from_handles([ComponentHandle::new(Component::new("form1", ComponentKind::Form)), chart.clone()]);

        h.runtime.block_on(h.dispatcher.trigger("form1", "form.submit", json!({}), json!({}), &resolver));

        let records = h.log.records();
        assert_eq!(records.len(), 2);
        assert!(!records[0].success);
        assert!(records[0].error.as_deref().unwrap_or_default().contains("boom"));
        assert!(records[1].success);
    }

    #[test]
    fn test_toggle_visible_through_dispatch() {
        let registry = LinkageRegistry::new();
        registry
            .add(linkage("l1", "form1", "chart1", "value.change", ActionType::ToggleVisible).with_mappings(vec![ParameterMapping::direct("show", "visible")]))
            .unwrap();
        let h = harness(registry);

        let chart = ComponentHandle::new(Component::new("chart1", ComponentKind::Chart));
        let resolver = resolver_from_handles([ComponentHandle::new(Component::new("form1", ComponentKind::Form)), chart.clone()]);

        h.runtime.block_on(h.dispatcher.trigger("form1", "value.change", json!({}), json!({"show": false}), &resolver));

        assert!(!chart.snapshot().visible);
        assert!(h.log.records()[0].success);
    }
}
