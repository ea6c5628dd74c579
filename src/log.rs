//! Append-only, in-memory execution log.
//!
//! Every dispatch attempt, success or failure, lands here for observability
//! and test assertions. The engine never mutates or removes entries;
//! retention is a caller concern (see [`ExecutionLog::clear`]).

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::{ShareLock, model::ActionType, model::Linkage, utils};

/// Immutable record of one linkage dispatch attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub id: String,
    pub linkage_id: String,
    pub source_id: String,
    pub target_id: String,
    pub action_type: ActionType,
    /// Epoch milliseconds of the dispatch outcome.
    pub timestamp: i64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionRecord {
    pub fn success(linkage: &Linkage) -> Self {
        Self {
            id: utils::longid(),
            linkage_id: linkage.id.clone(),
            source_id: linkage.source_component_id.clone(),
            target_id: linkage.target_component_id.clone(),
            action_type: linkage.action_type,
            timestamp: utils::time::time_millis(),
            success: true,
            error: None,
        }
    }

    pub fn failure(
        linkage: &Linkage,
        error: String,
    ) -> Self {
        Self {
            id: utils::longid(),
            linkage_id: linkage.id.clone(),
            source_id: linkage.source_component_id.clone(),
            target_id: linkage.target_component_id.clone(),
            action_type: linkage.action_type,
            timestamp: utils::time::time_millis(),
            success: false,
            error: Some(error),
        }
    }
}

/// Append-only record of dispatch outcomes, unbounded by design.
#[derive(Clone)]
pub struct ExecutionLog {
    entries: ShareLock<Vec<ExecutionRecord>>,
}

impl Default for ExecutionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn append(
        &self,
        record: ExecutionRecord,
    ) {
        self.entries.write().unwrap().push(record);
    }

    /// A point-in-time copy of all entries, oldest first.
    pub fn records(&self) -> Vec<ExecutionRecord> {
        self.entries.read().unwrap().clone()
    }

    pub fn last(&self) -> Option<ExecutionRecord> {
        self.entries.read().unwrap().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }

    /// Drop all entries. The engine never calls this itself.
    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ActionType;

    #[test]
    fn test_append_and_read() {
        let log = ExecutionLog::new();
        let linkage = Linkage::new("form1", "chart1", "form.submit", ActionType::Refresh);

        log.append(ExecutionRecord::success(&linkage));
        log.append(ExecutionRecord::failure(&linkage, "boom".to_string()));

        assert_eq!(log.len(), 2);
        let records = log.records();
        assert!(records[0].success);
        assert!(records[0].error.is_none());
        assert!(!records[1].success);
        assert_eq!(records[1].error.as_deref(), Some("boom"));
        assert_eq!(log.last().unwrap(), records[1]);
    }

    #[test]
    fn test_records_is_a_copy() {
        let log = ExecutionLog::new();
        let linkage = Linkage::new("form1", "chart1", "form.submit", ActionType::Refresh);
        log.append(ExecutionRecord::success(&linkage));

        let mut records = log.records();
        records.clear();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_record_document_format() {
        let linkage = Linkage::new("form1", "chart1", "form.submit", ActionType::ToggleVisible);
        let record = ExecutionRecord::failure(&linkage, "missing target".to_string());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["linkageId"], linkage.id);
        assert_eq!(value["actionType"], "toggle_visible");
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "missing target");
    }
}
