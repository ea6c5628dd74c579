mod custom;
mod refresh;
mod toggle;
mod update_config;

use async_trait::async_trait;

use crate::{
    Result,
    common::Vars,
    model::{ActionType, Linkage},
    runtime::LinkageContext,
};

pub use custom::CustomAction;
pub use refresh::RefreshAction;
pub use toggle::{ToggleDisabledAction, ToggleVisibleAction};
pub use update_config::UpdateConfigAction;

/// One effect kind applied to a target component.
///
/// Every branch except `custom` is total over its inputs: bad or missing
/// parameters leave the target unchanged rather than failing the linkage.
#[async_trait]
pub trait Action: Send + Sync {
    /// Returns the type of the action.
    fn action_type(&self) -> ActionType;

    /// Applies the action to the context's target component with the
    /// resolved parameter bag.
    async fn apply(
        &self,
        ctx: &LinkageContext,
        params: Vars,
    ) -> Result<()>;
}

/// Build the action implementation for a linkage.
pub fn create_action(linkage: &Linkage) -> Box<dyn Action> {
    match linkage.action_type {
        ActionType::Refresh => Box::new(RefreshAction),
        ActionType::UpdateConfig => Box::new(UpdateConfigAction),
        ActionType::ToggleVisible => Box::new(ToggleVisibleAction),
        ActionType::ToggleDisabled => Box::new(ToggleDisabledAction),
        ActionType::Custom => Box::new(CustomAction::new(linkage.custom_handler.clone())),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use serde_json::Value;

    use crate::{
        common::MemCache,
        runtime::{Channel, ComponentHandle, LinkageContext},
        utils,
    };

    /// Build a context over the given handles with a standalone channel.
    pub fn context_for(
        source: ComponentHandle,
        target: ComponentHandle,
        source_value: Value,
    ) -> (LinkageContext, Arc<tokio::runtime::Runtime>) {
        let runtime = Arc::new(tokio::runtime::Runtime::new().unwrap());
        let channel = Arc::new(Channel::new(runtime.clone()));
        let env = Arc::new(MemCache::new(1024));
        let ctx = LinkageContext::new(utils::longid(), source, target, Value::Null, source_value, env, channel);
        (ctx, runtime)
    }
}
