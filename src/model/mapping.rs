use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How one target parameter is derived from the source event payload.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MappingType {
    /// Read `source_field` from the payload, write it unchanged.
    #[default]
    Direct,
    /// Read `source_field` from the payload under a new parameter name.
    Rename,
    /// Write a literal value regardless of the payload.
    Fixed,
    /// Evaluate an expression against the payload.
    Expression,
}

/// One output field derivation of a linkage.
///
/// Mappings are applied in list order; later entries overwrite earlier writes
/// to the same `target_param`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParameterMapping {
    #[serde(rename = "type")]
    pub mapping_type: MappingType,
    /// Dot-delimited path into the source payload (`direct`/`rename`).
    #[serde(default)]
    pub source_field: String,
    /// Key written into the resolved parameter bag.
    pub target_param: String,
    /// Literal value (`fixed`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_value: Option<Value>,
    /// Snippet evaluated against the payload (`expression`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    /// Substituted when resolution yields null/missing or raises an error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl ParameterMapping {
    pub fn direct(
        source_field: &str,
        target_param: &str,
    ) -> Self {
        Self {
            mapping_type: MappingType::Direct,
            source_field: source_field.to_string(),
            target_param: target_param.to_string(),
            ..Default::default()
        }
    }

    pub fn rename(
        source_field: &str,
        target_param: &str,
    ) -> Self {
        Self {
            mapping_type: MappingType::Rename,
            source_field: source_field.to_string(),
            target_param: target_param.to_string(),
            ..Default::default()
        }
    }

    pub fn fixed(
        target_param: &str,
        value: Value,
    ) -> Self {
        Self {
            mapping_type: MappingType::Fixed,
            target_param: target_param.to_string(),
            fixed_value: Some(value),
            ..Default::default()
        }
    }

    pub fn expression(
        expression: &str,
        target_param: &str,
    ) -> Self {
        Self {
            mapping_type: MappingType::Expression,
            target_param: target_param.to_string(),
            expression: Some(expression.to_string()),
            ..Default::default()
        }
    }

    pub fn with_default(
        mut self,
        value: Value,
    ) -> Self {
        self.default_value = Some(value);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_mapping_type_serialization() {
        assert_eq!(serde_json::to_string(&MappingType::Direct).unwrap(), "\"direct\"");
        assert_eq!(serde_json::to_string(&MappingType::Expression).unwrap(), "\"expression\"");

        let parsed: MappingType = serde_json::from_str("\"rename\"").unwrap();
        assert_eq!(parsed, MappingType::Rename);
    }

    #[test]
    fn test_mapping_document_format() {
        let mapping = ParameterMapping::fixed("pageSize", json!(20)).with_default(json!(10));
        let value = serde_json::to_value(&mapping).unwrap();

        assert_eq!(value["type"], "fixed");
        assert_eq!(value["targetParam"], "pageSize");
        assert_eq!(value["fixedValue"], 20);
        assert_eq!(value["defaultValue"], 10);
    }
}
