use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{LinkflowError, Result, model::ParameterMapping, utils};

/// The kind of effect a linkage applies to its target component.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionType {
    /// Merge parameters into the target and ask it to re-fetch its data.
    #[default]
    Refresh,
    /// Overwrite existing target configuration fields.
    UpdateConfig,
    /// Set the target's visibility flag.
    ToggleVisible,
    /// Set the target's disabled flag.
    ToggleDisabled,
    /// Run a user-supplied handler.
    Custom,
}

impl ActionType {
    /// Parse an action type from its document string, reporting unrecognized
    /// strings as [`LinkflowError::UnknownAction`].
    pub fn parse(s: &str) -> Result<Self> {
        Self::from_str(s).map_err(|_| LinkflowError::UnknownAction(s.to_string()))
    }
}

/// A directed edge in the component graph.
///
/// A linkage connects one source component/event to one target
/// component/action. Field names serialize camelCase, matching the designer
/// document format this engine is embedded in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Linkage {
    /// Unique identifier of the linkage itself.
    pub id: String,
    /// Source component reference. Not validated for existence at creation
    /// time; a dangling reference degrades to a logged failure at dispatch.
    pub source_component_id: String,
    /// Target component reference, same leniency as the source.
    pub target_component_id: String,
    /// Event name on the source that activates this linkage. Exact-string match.
    pub trigger_event: String,
    pub action_type: ActionType,
    /// Ordered derivations of the target parameter bag. Empty means
    /// pass-through of the whole source payload.
    #[serde(default)]
    pub parameter_mappings: Vec<ParameterMapping>,
    /// Disabled linkages are invisible to the trigger dispatcher.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Milliseconds to wait after mapping resolution, before the action runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
    /// Handler source text, required when `action_type` is `custom`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_handler: Option<String>,
    /// Free text, not interpreted.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

fn default_enabled() -> bool {
    true
}

impl Linkage {
    /// Creates an enabled linkage with a freshly minted id and no mappings.
    pub fn new(
        source_component_id: &str,
        target_component_id: &str,
        trigger_event: &str,
        action_type: ActionType,
    ) -> Self {
        Self {
            id: utils::longid(),
            source_component_id: source_component_id.to_string(),
            target_component_id: target_component_id.to_string(),
            trigger_event: trigger_event.to_string(),
            action_type,
            parameter_mappings: Vec::new(),
            enabled: true,
            delay: None,
            custom_handler: None,
            description: String::new(),
        }
    }

    pub fn with_mappings(
        mut self,
        mappings: Vec<ParameterMapping>,
    ) -> Self {
        self.parameter_mappings = mappings;
        self
    }

    pub fn with_delay(
        mut self,
        delay: u64,
    ) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_handler(
        mut self,
        code: &str,
    ) -> Self {
        self.custom_handler = Some(code.to_string());
        self
    }

    /// Creates a linkage from an untyped JSON value, validated against
    /// [`Linkage::schema`] before deserialization.
    pub fn create(value: Value) -> Result<Self> {
        jsonschema::validate(&Self::schema(), &value)?;
        let linkage = serde_json::from_value::<Self>(value)?;
        Ok(linkage)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let linkage = serde_json::from_str::<Linkage>(s);
        match linkage {
            Ok(v) => Ok(v),
            Err(e) => Err(LinkflowError::Linkage(format!("{}", e))),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn schema() -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "id": { "type": "string", "minLength": 1 },
                "sourceComponentId": { "type": "string", "minLength": 1 },
                "targetComponentId": { "type": "string", "minLength": 1 },
                "triggerEvent": {
                    "type": "string",
                    "minLength": 1,
                    "description": "Source event name, matched by exact string equality"
                },
                "actionType": {
                    "type": "string",
                    "enum": ["refresh", "update_config", "toggle_visible", "toggle_disabled", "custom"]
                },
                "parameterMappings": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "type": {
                                "type": "string",
                                "enum": ["direct", "rename", "fixed", "expression"]
                            },
                            "sourceField": { "type": "string" },
                            "targetParam": { "type": "string", "minLength": 1 },
                            "expression": { "type": "string" }
                        },
                        "required": ["type", "targetParam"]
                    }
                },
                "enabled": { "type": "boolean" },
                "delay": { "type": "integer", "minimum": 0 },
                "customHandler": { "type": "string" },
                "description": { "type": "string" }
            },
            "required": ["id", "sourceComponentId", "targetComponentId", "triggerEvent", "actionType"]
        })
    }
}

/// Partial update applied to a registered linkage.
///
/// Mirrors the shape configuration UIs send: any subset of linkage fields,
/// absent fields left untouched.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct LinkagePatch {
    pub source_component_id: Option<String>,
    pub target_component_id: Option<String>,
    pub trigger_event: Option<String>,
    pub action_type: Option<ActionType>,
    pub parameter_mappings: Option<Vec<ParameterMapping>>,
    pub enabled: Option<bool>,
    pub delay: Option<u64>,
    pub custom_handler: Option<String>,
    pub description: Option<String>,
}

impl LinkagePatch {
    /// Parse a patch from an untyped JSON value.
    ///
    /// An unrecognized `actionType` string is reported as
    /// [`LinkflowError::UnknownAction`] rather than a generic conversion error,
    /// so configuration UIs can tell a typo from a malformed document.
    pub fn from_json(value: Value) -> Result<Self> {
        if let Some(action) = value.get("actionType").and_then(Value::as_str) {
            ActionType::parse(action)?;
        }
        let patch = serde_json::from_value::<Self>(value)?;
        Ok(patch)
    }

    pub fn apply_to(
        &self,
        linkage: &mut Linkage,
    ) {
        if let Some(v) = &self.source_component_id {
            linkage.source_component_id = v.clone();
        }
        if let Some(v) = &self.target_component_id {
            linkage.target_component_id = v.clone();
        }
        if let Some(v) = &self.trigger_event {
            linkage.trigger_event = v.clone();
        }
        if let Some(v) = self.action_type {
            linkage.action_type = v;
        }
        if let Some(v) = &self.parameter_mappings {
            linkage.parameter_mappings = v.clone();
        }
        if let Some(v) = self.enabled {
            linkage.enabled = v;
        }
        if let Some(v) = self.delay {
            linkage.delay = Some(v);
        }
        if let Some(v) = &self.custom_handler {
            linkage.custom_handler = Some(v.clone());
        }
        if let Some(v) = &self.description {
            linkage.description = v.clone();
        }
    }
}
