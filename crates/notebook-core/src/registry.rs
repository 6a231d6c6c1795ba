//! Concurrent registry of open notebooks.
//!
//! The registry is keyed by notebook uri and backed by a sharded concurrent
//! map, so a background projection reading one notebook never blocks on a
//! mutation of another. Mutations *within* one notebook remain the caller's
//! responsibility to serialize (single writer per notebook); the per-entry
//! guards returned by [`NotebookRegistry::get_mut`] only keep concurrent
//! readers of other notebooks from seeing torn state.

use crate::notebook::Notebook;
use dashmap::DashMap;
use dashmap::mapref::one::{Ref, RefMut};

/// Thread-safe map from notebook uri to open [`Notebook`] state.
#[derive(Debug, Default)]
pub struct NotebookRegistry {
    notebooks: DashMap<String, Notebook>,
}

impl NotebookRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            notebooks: DashMap::new(),
        }
    }

    /// Register an open notebook, replacing any previous entry for its uri.
    pub fn open(&self, notebook: Notebook) {
        self.notebooks
            .insert(notebook.uri().to_string(), notebook);
    }

    /// Remove a notebook, returning its final state.
    ///
    /// Idempotent: closing an unknown (or already closed) uri is a no-op that
    /// returns `None`.
    pub fn close(&self, uri: &str) -> Option<Notebook> {
        self.notebooks.remove(uri).map(|(_, notebook)| notebook)
    }

    /// Shared access to a notebook.
    pub fn get(&self, uri: &str) -> Option<Ref<'_, String, Notebook>> {
        self.notebooks.get(uri)
    }

    /// Exclusive access to a notebook (for caller-serialized mutation).
    pub fn get_mut(&self, uri: &str) -> Option<RefMut<'_, String, Notebook>> {
        self.notebooks.get_mut(uri)
    }

    /// Returns `true` if the uri names an open notebook.
    pub fn contains(&self, uri: &str) -> bool {
        self.notebooks.contains_key(uri)
    }

    /// Returns `true` if `cell_uri` names a cell of any open notebook.
    pub fn is_known_cell_uri(&self, cell_uri: &str) -> bool {
        self.notebooks
            .iter()
            .any(|notebook| notebook.contains_cell(cell_uri))
    }

    /// Find the uri of the open notebook owning `cell_uri`.
    pub fn find_owning_notebook(&self, cell_uri: &str) -> Option<String> {
        self.notebooks
            .iter()
            .find(|notebook| notebook.contains_cell(cell_uri))
            .map(|notebook| notebook.uri().to_string())
    }

    /// Number of open notebooks.
    pub fn len(&self) -> usize {
        self.notebooks.len()
    }

    /// Returns `true` if no notebook is open.
    pub fn is_empty(&self) -> bool {
        self.notebooks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::NotebookCell;
    use std::sync::Arc;
    use std::thread;

    fn notebook(uri: &str, cell_uri: &str) -> Notebook {
        Notebook::open(uri, vec![NotebookCell::new(cell_uri, 1, "x\n")]).unwrap()
    }

    #[test]
    fn test_open_get_close() {
        let registry = NotebookRegistry::new();
        registry.open(notebook("nb:1", "cell:1"));

        assert!(registry.contains("nb:1"));
        assert_eq!(registry.get("nb:1").unwrap().cell_count(), 1);

        let closed = registry.close("nb:1").unwrap();
        assert_eq!(closed.uri(), "nb:1");
        assert!(!registry.contains("nb:1"));
    }

    #[test]
    fn test_close_is_idempotent() {
        let registry = NotebookRegistry::new();
        registry.open(notebook("nb:1", "cell:1"));
        assert!(registry.close("nb:1").is_some());
        assert!(registry.close("nb:1").is_none());
        assert!(registry.close("nb:never-opened").is_none());
    }

    #[test]
    fn test_cell_uri_reverse_lookup() {
        let registry = NotebookRegistry::new();
        registry.open(notebook("nb:1", "cell:a"));
        registry.open(notebook("nb:2", "cell:b"));

        assert!(registry.is_known_cell_uri("cell:a"));
        assert!(registry.is_known_cell_uri("cell:b"));
        assert!(!registry.is_known_cell_uri("cell:c"));
        assert_eq!(
            registry.find_owning_notebook("cell:b").as_deref(),
            Some("nb:2")
        );
        assert_eq!(registry.find_owning_notebook("cell:c"), None);
    }

    #[test]
    fn test_concurrent_access_to_different_notebooks() {
        let registry = Arc::new(NotebookRegistry::new());
        for i in 0..8 {
            registry.open(notebook(&format!("nb:{}", i), &format!("cell:{}", i)));
        }

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let uri = format!("nb:{}", i);
                    for _ in 0..100 {
                        let mut nb = registry.get_mut(&uri).unwrap();
                        let _ = nb.virtual_text().len();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 8);
    }
}
