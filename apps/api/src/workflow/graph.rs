//! Directed graph of named stages.
//!
//! Build with `GraphBuilder`, then `compile()` to validate. A compiled graph
//! only answers two questions: which stage runs at a node, and where the run
//! goes next given the current state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;

use crate::models::conversation::ConversationState;
use crate::stages::Stage;
use crate::workflow::routers::RoutingError;

pub const START: &str = "__start__";
pub const END: &str = "__end__";

/// Maps a state to a route name. The graph maps route names to nodes.
pub type RouterFn = fn(&ConversationState) -> Result<&'static str, RoutingError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("node '{0}' is defined twice")]
    DuplicateNode(String),

    #[error("node '{0}' has more than one outgoing edge")]
    DuplicateEdge(String),

    #[error("'{0}' is a reserved node name")]
    ReservedName(String),

    #[error("edge references unknown node '{0}'")]
    UnknownNode(String),

    #[error("node '{0}' has no outgoing edge")]
    MissingEdge(String),

    #[error("graph has no entry edge from {START}")]
    MissingEntry,
}

enum Edge {
    Fixed(String),
    Conditional {
        router: RouterFn,
        branches: HashMap<&'static str, String>,
    },
}

impl Edge {
    fn targets(&self) -> Vec<&str> {
        match self {
            Edge::Fixed(to) => vec![to.as_str()],
            Edge::Conditional { branches, .. } => branches.values().map(String::as_str).collect(),
        }
    }
}

#[derive(Default)]
pub struct GraphBuilder {
    nodes: HashMap<String, Arc<dyn Stage>>,
    edges: HashMap<String, Edge>,
    interrupts: HashSet<String>,
    errors: Vec<GraphError>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(mut self, name: &str, stage: Arc<dyn Stage>) -> Self {
        if name == START || name == END {
            self.errors.push(GraphError::ReservedName(name.to_string()));
        } else if self.nodes.insert(name.to_string(), stage).is_some() {
            self.errors.push(GraphError::DuplicateNode(name.to_string()));
        }
        self
    }

    pub fn add_edge(self, from: &str, to: &str) -> Self {
        self.insert_edge(from, Edge::Fixed(to.to_string()))
    }

    /// `branches` pairs each route name the router can return with a target node.
    pub fn add_conditional_edges(
        self,
        from: &str,
        router: RouterFn,
        branches: &[(&'static str, &str)],
    ) -> Self {
        let branches = branches
            .iter()
            .map(|(route, to)| (*route, to.to_string()))
            .collect();
        self.insert_edge(from, Edge::Conditional { router, branches })
    }

    /// The run halts before entering `node` and resumes into it.
    pub fn interrupt_before(mut self, node: &str) -> Self {
        self.interrupts.insert(node.to_string());
        self
    }

    fn insert_edge(mut self, from: &str, edge: Edge) -> Self {
        if self.edges.insert(from.to_string(), edge).is_some() {
            self.errors.push(GraphError::DuplicateEdge(from.to_string()));
        }
        self
    }

    pub fn compile(mut self) -> Result<CompiledGraph, GraphError> {
        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }

        let entry = match self.edges.get(START) {
            Some(Edge::Fixed(to)) => to.clone(),
            Some(Edge::Conditional { .. }) | None => return Err(GraphError::MissingEntry),
        };

        let known = |name: &str| name == END || self.nodes.contains_key(name);
        for (from, edge) in &self.edges {
            if from != START && !self.nodes.contains_key(from) {
                return Err(GraphError::UnknownNode(from.clone()));
            }
            if let Some(target) = edge.targets().into_iter().find(|t| !known(*t)) {
                return Err(GraphError::UnknownNode(target.to_string()));
            }
        }
        if let Some(node) = self.interrupts.iter().find(|n| !self.nodes.contains_key(*n)) {
            return Err(GraphError::UnknownNode(node.clone()));
        }
        if let Some(node) = self.nodes.keys().find(|n| !self.edges.contains_key(*n)) {
            return Err(GraphError::MissingEdge(node.clone()));
        }

        Ok(CompiledGraph {
            entry,
            nodes: self.nodes,
            edges: self.edges,
            interrupts: self.interrupts,
        })
    }
}

pub struct CompiledGraph {
    entry: String,
    nodes: HashMap<String, Arc<dyn Stage>>,
    edges: HashMap<String, Edge>,
    interrupts: HashSet<String>,
}

impl CompiledGraph {
    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn stage(&self, node: &str) -> Option<&Arc<dyn Stage>> {
        self.nodes.get(node)
    }

    pub fn is_interrupt(&self, node: &str) -> bool {
        self.interrupts.contains(node)
    }

    pub fn contains(&self, node: &str) -> bool {
        node == END || self.nodes.contains_key(node)
    }

    /// Follows the outgoing edge of `from`, consulting its router if any.
    pub fn next(&self, from: &str, state: &ConversationState) -> Result<&str, RoutingError> {
        match self.edges.get(from) {
            Some(Edge::Fixed(to)) => Ok(to.as_str()),
            Some(Edge::Conditional { router, branches }) => {
                let route = router(state)?;
                branches
                    .get(route)
                    .map(String::as_str)
                    .ok_or_else(|| RoutingError::UnmappedRoute {
                        node: from.to_string(),
                        route: route.to_string(),
                    })
            }
            None => Err(RoutingError::NoEdge(from.to_string())),
        }
    }
}
