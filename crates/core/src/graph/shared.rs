#![forbid(unsafe_code)]

use super::RelationshipGraph;
use crate::config::SchemaDescription;
use crate::error::ConfigError;
use std::sync::{Arc, PoisonError, RwLock};

/// Process-wide handle to the current graph.
///
/// Readers take an `Arc` and keep using that instance for the whole request;
/// a reload builds a complete new graph first and only then swaps the
/// pointer, so nobody ever sees a half-updated graph.
#[derive(Debug)]
pub struct SharedGraph {
    current: RwLock<Arc<RelationshipGraph>>,
}

impl SharedGraph {
    pub fn new(graph: RelationshipGraph) -> Self {
        Self {
            current: RwLock::new(Arc::new(graph)),
        }
    }

    pub fn load(&self) -> Arc<RelationshipGraph> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the graph wholesale and returns the previous instance.
    pub fn swap(&self, graph: RelationshipGraph) -> Arc<RelationshipGraph> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(graph))
    }

    /// Builds from `description`; on failure the current graph stays in place.
    pub fn reload(&self, description: &SchemaDescription) -> Result<(), ConfigError> {
        let graph = RelationshipGraph::build(description)?;
        self.swap(graph);
        Ok(())
    }
}
