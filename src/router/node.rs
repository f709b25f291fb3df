use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::protocol::{Method, RouteError};

use super::handler::{DynHandler, DynMiddleware};

/// The middleware lists visible from a group, outermost (root) first.
/// Shared handles, so additions after registration still apply.
pub(crate) type MiddlewareChain = Vec<Arc<RwLock<Vec<DynMiddleware>>>>;

/// One path segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PathToken {
    Static(String),
    Param(String),
}

/// A handler registered at a terminal node, together with the middleware
/// chain of the group it was registered through.
pub(crate) struct RouteEntry {
    pub handler: DynHandler,
    pub chain: MiddlewareChain,
}

/// A node in the path trie. Any number of static children with distinct
/// tokens; at most one parameter child, whose token is the capture name.
pub(crate) struct RouteNode {
    token: String,
    is_param: bool,
    children: Vec<RouteNode>,
    handlers: HashMap<Method, RouteEntry>,
}

impl RouteNode {
    pub fn root() -> Self {
        Self {
            token: String::new(),
            is_param: false,
            children: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Walks (and extends) the trie along `tokens`, then records the entry
    /// for `method` at the terminal node. Re-registering the same method on
    /// the same node is last-write-wins, not an error.
    pub fn insert(
        &mut self,
        tokens: &[PathToken],
        method: Method,
        entry: RouteEntry,
    ) -> Result<(), RouteError> {
        let mut node = self;

        for token in tokens {
            let idx = match token {
                PathToken::Param(name) => {
                    match node.children.iter().position(|child| child.is_param) {
                        Some(idx) => {
                            let existing = &node.children[idx];
                            if existing.token != *name {
                                return Err(RouteError::AmbiguousPathParams {
                                    existing: existing.token.clone(),
                                    conflicting: name.clone(),
                                });
                            }
                            idx
                        }
                        None => {
                            node.children.push(RouteNode {
                                token: name.clone(),
                                is_param: true,
                                children: Vec::new(),
                                handlers: HashMap::new(),
                            });
                            node.children.len() - 1
                        }
                    }
                }
                PathToken::Static(segment) => {
                    match node
                        .children
                        .iter()
                        .position(|child| !child.is_param && child.token == *segment)
                    {
                        Some(idx) => idx,
                        None => {
                            node.children.push(RouteNode {
                                token: segment.clone(),
                                is_param: false,
                                children: Vec::new(),
                                handlers: HashMap::new(),
                            });
                            node.children.len() - 1
                        }
                    }
                }
            };
            node = &mut node.children[idx];
        }

        node.handlers.insert(method, entry);
        Ok(())
    }

    /// Follows `segments` down the trie. A static child always wins over
    /// the parameter child at the same depth; parameter captures land in
    /// `params`.
    pub fn lookup(
        &self,
        segments: &[String],
        params: &mut HashMap<String, String>,
    ) -> Option<&RouteNode> {
        let mut node = self;

        for segment in segments {
            if let Some(child) = node
                .children
                .iter()
                .find(|child| !child.is_param && child.token == *segment)
            {
                node = child;
            } else if let Some(child) = node.children.iter().find(|child| child.is_param) {
                params.insert(child.token.clone(), segment.clone());
                node = child;
            } else {
                return None;
            }
        }

        Some(node)
    }

    pub fn entry(&self, method: Method) -> Option<&RouteEntry> {
        self.handlers.get(&method)
    }

    pub fn has_any_handler(&self) -> bool {
        !self.handlers.is_empty()
    }
}
