use async_trait::async_trait;
use tracing::debug;

use crate::{
    Result,
    common::Vars,
    events::{Event, Notification},
    linkage::actions::Action,
    model::ActionType,
    runtime::LinkageContext,
};

/// Merge the parameter bag into the target's linkage params and ask the
/// owning widget to re-fetch its data.
///
/// The merged params stay on the component so the widget can read them on its
/// next fetch; the notification tells it to fetch now. When the target handle
/// carries a [`crate::Refresh`] capability it is invoked directly and awaited.
pub struct RefreshAction;

#[async_trait]
impl Action for RefreshAction {
    fn action_type(&self) -> ActionType {
        ActionType::Refresh
    }

    async fn apply(
        &self,
        ctx: &LinkageContext,
        params: Vars,
    ) -> Result<()> {
        let target = ctx.target();
        debug!(component = %target.id(), "refresh action");

        target.update(|c| c.linkage_params.extend(params.clone()));

        let _ = ctx.channel().notification_queue().send(Event::new(&Notification {
            component_id: target.id(),
            linkage_id: ctx.linkage_id().to_string(),
            action: ActionType::Refresh,
            params: params.clone(),
        }));

        if let Some(capability) = target.refresh_capability() {
            capability.refresh(params).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;
    use crate::{
        Refresh,
        linkage::actions::test_support::context_for,
        runtime::{Component, ComponentHandle, ComponentKind},
    };

    #[test]
    fn test_refresh_merges_linkage_params() {
        let target = ComponentHandle::new(Component::new("chart1", ComponentKind::Chart));
        let source = ComponentHandle::new(Component::new("form1", ComponentKind::Form));
        let (ctx, runtime) = context_for(source, target.clone(), json!({}));

        let mut params = Vars::new();
        params.set("city", "Seattle");
        runtime.block_on(RefreshAction.apply(&ctx, params)).unwrap();

        let mut params = Vars::new();
        params.set("page", 2);
        runtime.block_on(RefreshAction.apply(&ctx, params)).unwrap();

        let snapshot = target.snapshot();
        assert_eq!(snapshot.linkage_params.get::<String>("city"), Some("Seattle".to_string()));
        assert_eq!(snapshot.linkage_params.get::<i64>("page"), Some(2));
    }

    #[test]
    fn test_refresh_invokes_capability() {
        struct Recorder(Mutex<Vec<Vars>>);

        #[async_trait]
        impl Refresh for Recorder {
            async fn refresh(
                &self,
                params: Vars,
            ) -> Result<()> {
                self.0.lock().unwrap().push(params);
                Ok(())
            }
        }

        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let target = ComponentHandle::new(Component::new("table1", ComponentKind::Table)).with_refresh(recorder.clone());
        let source = ComponentHandle::new(Component::new("form1", ComponentKind::Form));
        let (ctx, runtime) = context_for(source, target, json!({}));

        let mut params = Vars::new();
        params.set("region", "west");
        runtime.block_on(RefreshAction.apply(&ctx, params)).unwrap();

        let calls = recorder.0.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].get::<String>("region"), Some("west".to_string()));
    }
}
