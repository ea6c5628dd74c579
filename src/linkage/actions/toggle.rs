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

/// Set the target's visibility flag from `params.visible`.
///
/// A missing or non-boolean value leaves visibility unchanged.
pub struct ToggleVisibleAction;

#[async_trait]
impl Action for ToggleVisibleAction {
    fn action_type(&self) -> ActionType {
        ActionType::ToggleVisible
    }

    async fn apply(
        &self,
        ctx: &LinkageContext,
        params: Vars,
    ) -> Result<()> {
        let target = ctx.target();
        debug!(component = %target.id(), "toggle visible action");

        if let Some(Value::Bool(visible)) = params.get_value("visible") {
            let visible = *visible;
            target.update(|c| c.visible = visible);
        }

        let _ = ctx.channel().notification_queue().send(Event::new(&Notification {
            component_id: target.id(),
            linkage_id: ctx.linkage_id().to_string(),
            action: ActionType::ToggleVisible,
            params,
        }));

        Ok(())
    }
}

/// Set the target's disabled flag from `params.disabled`, same pattern as
/// [`ToggleVisibleAction`].
pub struct ToggleDisabledAction;

#[async_trait]
impl Action for ToggleDisabledAction {
    fn action_type(&self) -> ActionType {
        ActionType::ToggleDisabled
    }

    async fn apply(
        &self,
        ctx: &LinkageContext,
        params: Vars,
    ) -> Result<()> {
        let target = ctx.target();
        debug!(component = %target.id(), "toggle disabled action");

        if let Some(Value::Bool(disabled)) = params.get_value("disabled") {
            let disabled = *disabled;
            target.update(|c| c.disabled = disabled);
        }

        let _ = ctx.channel().notification_queue().send(Event::new(&Notification {
            component_id: target.id(),
            linkage_id: ctx.linkage_id().to_string(),
            action: ActionType::ToggleDisabled,
            params,
        }));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        linkage::actions::test_support::context_for,
        runtime::{Component, ComponentHandle, ComponentKind},
    };

    #[test]
    fn test_toggle_visible() {
        let target = ComponentHandle::new(Component::new("chart1", ComponentKind::Chart));
        let source = ComponentHandle::new(Component::new("form1", ComponentKind::Form));
        let (ctx, runtime) = context_for(source, target.clone(), json!({}));

        let mut params = Vars::new();
        params.set("visible", false);
        runtime.block_on(ToggleVisibleAction.apply(&ctx, params)).unwrap();
        assert!(!target.snapshot().visible);

        // non-boolean value leaves the flag unchanged
        let mut params = Vars::new();
        params.set("visible", 1);
        runtime.block_on(ToggleVisibleAction.apply(&ctx, params)).unwrap();
        assert!(!target.snapshot().visible);

        // missing value leaves the flag unchanged
        runtime.block_on(ToggleVisibleAction.apply(&ctx, Vars::new())).unwrap();
        assert!(!target.snapshot().visible);
    }

    #[test]
    fn test_toggle_disabled() {
        let target = ComponentHandle::new(Component::new("form2", ComponentKind::Form));
        let source = ComponentHandle::new(Component::new("form1", ComponentKind::Form));
        let (ctx, runtime) = context_for(source, target.clone(), json!({}));

        let mut params = Vars::new();
        params.set("disabled", true);
        runtime.block_on(ToggleDisabledAction.apply(&ctx, params)).unwrap();
        assert!(target.snapshot().disabled);
    }
}
