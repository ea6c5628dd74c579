//! Linkage registry: the in-memory set of configured linkages.
//!
//! Linkages are created and edited here by the hosting application
//! (typically through a configuration UI) and serialized as part of the
//! surrounding document by an external persistence layer; the registry holds
//! them only for the session.

use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::trace;

use crate::{
    LinkflowError, Result, ShareLock,
    model::{Linkage, LinkagePatch},
};

/// Both directions of a component's linkage relationships.
#[derive(Debug, Clone, Default)]
pub struct ComponentLinkages {
    pub as_source: Vec<Linkage>,
    pub as_target: Vec<Linkage>,
}

/// Registry of linkage definitions with indexed source/target lookup.
///
/// Component references are not validated here: a linkage may be authored
/// before its target exists, and a dangling reference degrades to a logged
/// failure at dispatch time.
#[derive(Clone)]
pub struct LinkageRegistry {
    linkages: ShareLock<Vec<Linkage>>,
}

impl Default for LinkageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkageRegistry {
    pub fn new() -> Self {
        Self {
            linkages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register a linkage. A duplicate id is rejected.
    pub fn add(
        &self,
        linkage: Linkage,
    ) -> Result<()> {
        trace!("registry::add({})", linkage.id);
        let mut linkages = self.linkages.write().unwrap();
        if linkages.iter().any(|l| l.id == linkage.id) {
            return Err(LinkflowError::DuplicateId(linkage.id));
        }
        linkages.push(linkage);
        Ok(())
    }

    /// Remove a linkage by id. Returns whether it existed.
    pub fn remove(
        &self,
        id: &str,
    ) -> bool {
        trace!("registry::remove({})", id);
        let mut linkages = self.linkages.write().unwrap();
        let before = linkages.len();
        linkages.retain(|l| l.id != id);
        linkages.len() != before
    }

    /// Apply a partial update to a linkage. Returns whether it was found.
    pub fn update(
        &self,
        id: &str,
        patch: LinkagePatch,
    ) -> bool {
        let mut linkages = self.linkages.write().unwrap();
        match linkages.iter_mut().find(|l| l.id == id) {
            Some(linkage) => {
                patch.apply_to(linkage);
                true
            }
            None => false,
        }
    }

    /// Apply a partial update given as raw JSON, as configuration UIs send it.
    pub fn update_from_json(
        &self,
        id: &str,
        patch: Value,
    ) -> Result<bool> {
        let patch = LinkagePatch::from_json(patch)?;
        Ok(self.update(id, patch))
    }

    pub fn get(
        &self,
        id: &str,
    ) -> Option<Linkage> {
        self.linkages.read().unwrap().iter().find(|l| l.id == id).cloned()
    }

    /// Enabled linkages originating from a source component, in registration
    /// order. This is the dispatch query: disabled linkages are invisible.
    pub fn linkages_from_source(
        &self,
        source_id: &str,
    ) -> Vec<Linkage> {
        self.linkages.read().unwrap().iter().filter(|l| l.source_component_id == source_id && l.enabled).cloned().collect()
    }

    /// All linkages pointing at a target component, regardless of `enabled`.
    /// Inspection/editing UIs need to see disabled entries too.
    pub fn linkages_to_target(
        &self,
        target_id: &str,
    ) -> Vec<Linkage> {
        self.linkages.read().unwrap().iter().filter(|l| l.target_component_id == target_id).cloned().collect()
    }

    /// A component's linkages in both directions.
    pub fn component_linkages(
        &self,
        component_id: &str,
    ) -> ComponentLinkages {
        ComponentLinkages {
            as_source: self.linkages_from_source(component_id),
            as_target: self.linkages_to_target(component_id),
        }
    }

    /// Replace the whole registry content, e.g. when a document is loaded.
    pub fn import(
        &self,
        linkages: Vec<Linkage>,
    ) {
        trace!("registry::import({} linkages)", linkages.len());
        *self.linkages.write().unwrap() = linkages;
    }

    /// All registered linkages, in registration order.
    pub fn export(&self) -> Vec<Linkage> {
        self.linkages.read().unwrap().clone()
    }

    pub fn clear(&self) {
        self.linkages.write().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.linkages.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.linkages.read().unwrap().is_empty()
    }
}
