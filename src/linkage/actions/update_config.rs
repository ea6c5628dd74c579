use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::{
    Result,
    common::Vars,
    events::{Event, Notification},
    linkage::actions::Action,
    model::ActionType,
    runtime::LinkageContext,
};

/// Overwrite target fields that already exist; ignore everything else.
///
/// Unknown keys are dropped silently; this is a permissive surface, not a
/// validation layer. Identity fields (`id`, `kind`) are never overwritten.
pub struct UpdateConfigAction;

#[async_trait]
impl Action for UpdateConfigAction {
    fn action_type(&self) -> ActionType {
        ActionType::UpdateConfig
    }

    async fn apply(
        &self,
        ctx: &LinkageContext,
        params: Vars,
    ) -> Result<()> {
        let target = ctx.target();
        debug!(component = %target.id(), "update config action");

        target.update(|c| {
            for (key, value) in params.iter() {
                match key.as_str() {
                    "visible" => {
                        if let Value::Bool(b) = value {
                            c.visible = *b;
                        }
                    }
                    "disabled" => {
                        if let Value::Bool(b) = value {
                            c.disabled = *b;
                        }
                    }
                    "name" => {
                        if let Value::String(s) = value {
                            c.name = s.clone();
                        }
                    }
                    _ => {
                        if c.config.contains_key(key) {
                            c.config.set_value(key, value.clone());
                        }
                    }
                }
            }
        });

        let _ = ctx.channel().notification_queue().send(Event::new(&Notification {
            component_id: target.id(),
            linkage_id: ctx.linkage_id().to_string(),
            action: ActionType::UpdateConfig,
            params,
        }));

        Ok(())
    }
}
