use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::{
    LinkflowError, Result,
    common::Vars,
    linkage::{
        actions::Action,
        runner::{HandlerBindings, HandlerRunner},
    },
    model::ActionType,
    runtime::{ComponentHandle, LinkageContext},
};

/// Run a user-supplied handler against the standard bindings.
///
/// Unlike the built-in actions this one may fail: a missing handler or a
/// throwing snippet propagates to the dispatcher's per-linkage catch, which
/// records it as a failed execution.
///
/// The handler receives the target as a `component` snapshot; its
/// post-execution state is read back and applied to the real target, so
/// in-place mutations made by the handler take effect without the sandbox
/// ever holding a live reference.
pub struct CustomAction {
    code: Option<String>,
}

impl CustomAction {
    pub fn new(code: Option<String>) -> Self {
        Self {
            code,
        }
    }
}

#[async_trait]
impl Action for CustomAction {
    fn action_type(&self) -> ActionType {
        ActionType::Custom
    }

    async fn apply(
        &self,
        ctx: &LinkageContext,
        params: Vars,
    ) -> Result<()> {
        let code = self.code.as_deref().ok_or_else(|| LinkflowError::Action("custom handler is not defined".to_string()))?;

        let target = ctx.target();
        debug!(component = %target.id(), "custom action");

        let bindings = HandlerBindings {
            context: json!({
                "sourceComponent": ctx.source().to_json(),
                "targetComponent": target.to_json(),
                "eventData": ctx.event_data().clone(),
                "sourceValue": ctx.source_value().clone(),
            }),
            params: params.into(),
            component: target.to_json(),
            host: json!({ "env": ctx.env_snapshot() }),
        };

        let outcome = HandlerRunner::run(code, &bindings).map_err(|e| LinkflowError::Handler(format!("custom handler execution failed: {}", e)))?;

        for line in &outcome.logs {
            ctx.emit_log(line.clone());
        }

        apply_component_state(target, &outcome.component);

        Ok(())
    }
}

/// Apply the post-execution `component` binding back to the target.
///
/// The same permissive rule as `update_config`: boolean flags, the name, and
/// existing config fields; linkage params merge wholesale. Keys that do not
/// exist on the target do not materialize.
fn apply_component_state(
    target: &ComponentHandle,
    state: &Value,
) {
    let Value::Object(map) = state else {
        return;
    };

    target.update(|c| {
        if let Some(Value::Bool(b)) = map.get("visible") {
            c.visible = *b;
        }
        if let Some(Value::Bool(b)) = map.get("disabled") {
            c.disabled = *b;
        }
        if let Some(Value::String(s)) = map.get("name") {
            c.name = s.clone();
        }
        if let Some(Value::Object(config)) = map.get("config") {
            for (key, value) in config {
                if c.config.contains_key(key) {
                    c.config.set_value(key, value.clone());
                }
            }
        }
        if let Some(Value::Object(linkage_params)) = map.get("linkageParams") {
            for (key, value) in linkage_params {
                c.linkage_params.set_value(key, value.clone());
            }
        }
    });
}
