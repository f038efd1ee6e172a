//! Draft storage seen by the rendering core.
//!
//! The core only needs two calls: read a snapshot of the active document and
//! apply a mutation to it. [`MemoryStore`] is the in-process implementation
//! used by the CLI and tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{InvoiceDocument, InvoiceTheme};

pub trait DocumentStore {
    /// Owned snapshot of the active document.
    fn active_document(&self) -> Result<InvoiceDocument, StoreError>;

    /// Apply `mutator` to the active document and bump its `updated_at`.
    fn update_active_document(
        &mut self,
        mutator: &mut dyn FnMut(&mut InvoiceDocument),
    ) -> Result<(), StoreError>;

    /// Theme of the surrounding application.
    fn app_theme(&self) -> InvoiceTheme {
        InvoiceTheme::Light
    }
}

pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    #[serde(default)]
    active_id: Option<String>,
    #[serde(default)]
    documents: Vec<InvoiceDocument>,
}

pub struct MemoryStore {
    documents: Vec<InvoiceDocument>,
    active: Option<String>,
    app_theme: InvoiceTheme,
    clock: Clock,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Box::new(Utc::now))
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            documents: Vec::new(),
            active: None,
            app_theme: InvoiceTheme::Light,
            clock,
        }
    }

    pub fn set_app_theme(&mut self, theme: InvoiceTheme) {
        self.app_theme = theme;
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.documents.iter().position(|d| d.id == id)
    }

    /// Start a fresh draft and make it active.
    pub fn create(&mut self, id: &str) -> Result<&InvoiceDocument, StoreError> {
        let doc = InvoiceDocument::new(id, (self.clock)());
        self.insert(doc)
    }

    /// Add an existing document and make it active.
    pub fn insert(&mut self, doc: InvoiceDocument) -> Result<&InvoiceDocument, StoreError> {
        if self.position(&doc.id).is_some() {
            return Err(StoreError::AlreadyExists(doc.id));
        }
        self.active = Some(doc.id.clone());
        self.documents.push(doc);
        let last = self.documents.len() - 1;
        Ok(&self.documents[last])
    }

    pub fn get(&self, id: &str) -> Option<&InvoiceDocument> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Drafts in insertion order.
    pub fn list(&self) -> &[InvoiceDocument] {
        &self.documents
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn set_active(&mut self, id: &str) -> Result<(), StoreError> {
        if self.position(id).is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.active = Some(id.to_string());
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<InvoiceDocument, StoreError> {
        let index = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        Ok(self.documents.remove(index))
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        let snapshot = Snapshot {
            active_id: self.active.clone(),
            documents: self.documents.clone(),
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Replace all drafts with the contents of `json`. An unknown active id
    /// falls back to the first draft.
    pub fn load_json(&mut self, json: &str) -> Result<(), StoreError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        self.documents = snapshot.documents;
        self.active = snapshot
            .active_id
            .filter(|id| self.position(id).is_some())
            .or_else(|| self.documents.first().map(|d| d.id.clone()));
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn active_document(&self) -> Result<InvoiceDocument, StoreError> {
        let id = self.active.as_deref().ok_or(StoreError::NoActiveDocument)?;
        self.get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn update_active_document(
        &mut self,
        mutator: &mut dyn FnMut(&mut InvoiceDocument),
    ) -> Result<(), StoreError> {
        let id = self.active.clone().ok_or(StoreError::NoActiveDocument)?;
        let now = (self.clock)();
        let doc = self
            .documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(StoreError::NotFound(id))?;
        mutator(doc);
        doc.updated_at = now;
        Ok(())
    }

    fn app_theme(&self) -> InvoiceTheme {
        self.app_theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    fn ticking_store() -> MemoryStore {
        let tick = Arc::new(AtomicI64::new(1_700_000_000));
        MemoryStore::with_clock(Box::new(move || {
            let secs = tick.fetch_add(60, Ordering::SeqCst);
            Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
        }))
    }

    #[test]
    fn empty_store_has_no_active_document() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.active_document(),
            Err(StoreError::NoActiveDocument)
        ));
    }

    #[test]
    fn update_mutates_and_bumps_timestamp() {
        let mut store = ticking_store();
        let created = store.create("a").unwrap().updated_at;
        store
            .update_active_document(&mut |d| d.client.name = "Globex".to_string())
            .unwrap();
        let doc = store.active_document().unwrap();
        assert_eq!(doc.client.name, "Globex");
        assert!(doc.updated_at > created);
        assert_eq!(doc.created_at, created);
    }

    #[test]
    fn snapshot_is_detached() {
        let mut store = ticking_store();
        store.create("a").unwrap();
        let snapshot = store.active_document().unwrap();
        store
            .update_active_document(&mut |d| d.notes = "changed".to_string())
            .unwrap();
        assert_eq!(snapshot.notes, "");
    }

    #[test]
    fn multiple_drafts_and_active_switching() {
        let mut store = ticking_store();
        store.create("a").unwrap();
        store.create("b").unwrap();
        assert_eq!(store.active_id(), Some("b"));
        store.set_active("a").unwrap();
        assert_eq!(store.active_document().unwrap().id, "a");
        assert!(matches!(store.create("a"), Err(StoreError::AlreadyExists(_))));
        assert!(matches!(store.set_active("zzz"), Err(StoreError::NotFound(_))));
        store.delete("a").unwrap();
        assert_eq!(store.active_id(), None);
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn json_round_trip_keeps_active() {
        let mut store = ticking_store();
        store.create("a").unwrap();
        store.create("b").unwrap();
        store.set_active("a").unwrap();
        let json = store.to_json().unwrap();

        let mut restored = MemoryStore::new();
        restored.load_json(&json).unwrap();
        assert_eq!(restored.active_id(), Some("a"));
        assert_eq!(restored.list(), store.list());
    }

    #[test]
    fn app_theme_is_reported() {
        let mut store = MemoryStore::new();
        assert_eq!(store.app_theme(), InvoiceTheme::Light);
        store.set_app_theme(InvoiceTheme::Dark);
        assert_eq!(store.app_theme(), InvoiceTheme::Dark);
    }

    #[test]
    fn load_rejects_garbage() {
        let mut store = MemoryStore::new();
        assert!(matches!(store.load_json("not json"), Err(StoreError::Parse(_))));
    }
}
