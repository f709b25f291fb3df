mod handler;
mod node;

pub use handler::{handler_fn, DynHandler, DynMiddleware, Handler, HandlerFn, Middleware};

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::protocol::{Method, Request, RouteError};

use handler::{MethodNotAllowedHandler, NotFoundHandler};
use node::{MiddlewareChain, PathToken, RouteEntry, RouteNode};

/// A path-trie router.
///
/// Groups made with [`Router::group`] are lightweight views over the same
/// node graph carrying their own prefix and middleware list, so routes may
/// be registered through any of them. Registration is expected to finish
/// before the server starts accepting; the node graph sits behind a
/// read-many/write-rare lock.
#[derive(Clone)]
pub struct Router {
    root: Arc<RwLock<RouteNode>>,
    prefix: String,
    middleware: Arc<RwLock<Vec<DynMiddleware>>>,
    parents: Vec<Arc<RwLock<Vec<DynMiddleware>>>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            root: Arc::new(RwLock::new(RouteNode::root())),
            prefix: String::new(),
            middleware: Arc::new(RwLock::new(Vec::new())),
            parents: Vec::new(),
        }
    }

    /// Returns a view sharing this router's routes, with `prefix` appended
    /// to the view's prefix and a fresh middleware list of its own.
    pub fn group(&self, prefix: &str) -> Router {
        let mut parents = self.parents.clone();
        parents.push(Arc::clone(&self.middleware));
        Router {
            root: Arc::clone(&self.root),
            prefix: format!("{}{}", self.prefix, normalize_prefix(prefix)),
            middleware: Arc::new(RwLock::new(Vec::new())),
            parents,
        }
    }

    /// Appends middleware to this router/group. The effective stack is
    /// recomputed at dispatch, so additions made after routes were
    /// registered apply to subsequent requests.
    pub fn use_middleware(&self, middleware: impl Middleware + 'static) {
        self.middleware
            .write()
            .expect("middleware list lock poisoned")
            .push(Arc::new(middleware));
    }

    pub fn add(
        &self,
        path: &str,
        method: Method,
        handler: impl Handler + 'static,
    ) -> Result<(), RouteError> {
        self.add_handler(path, method, Arc::new(handler))
    }

    pub fn get(&self, path: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.add(path, Method::Get, handler)
    }

    pub fn post(&self, path: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.add(path, Method::Post, handler)
    }

    pub fn put(&self, path: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.add(path, Method::Put, handler)
    }

    pub fn delete(&self, path: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.add(path, Method::Delete, handler)
    }

    pub fn patch(&self, path: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.add(path, Method::Patch, handler)
    }

    pub fn head(&self, path: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.add(path, Method::Head, handler)
    }

    pub fn options(&self, path: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.add(path, Method::Options, handler)
    }

    pub fn connect(&self, path: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.add(path, Method::Connect, handler)
    }

    pub fn trace(&self, path: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        self.add(path, Method::Trace, handler)
    }

    fn add_handler(
        &self,
        path: &str,
        method: Method,
        handler: DynHandler,
    ) -> Result<(), RouteError> {
        let full = self.join_path(path)?;
        let tokens = tokenize(&full)?;
        let entry = RouteEntry {
            handler,
            chain: self.chain(),
        };
        self.root
            .write()
            .expect("route table lock poisoned")
            .insert(&tokens, method, entry)
    }

    /// Resolves the handler for a request, filling `path_params` on a
    /// match. Unrecognized methods and unknown paths get the not-found
    /// handler; a known path without the method gets method-not-allowed.
    /// The matched handler comes back wrapped in the middleware visible on
    /// its group chain, root-first.
    pub fn get_handler(&self, request: &mut Request) -> DynHandler {
        let Some(method) = Method::from_token(request.method()) else {
            return Arc::new(NotFoundHandler);
        };
        let Ok(segments) = split_segments(request.target()) else {
            return Arc::new(NotFoundHandler);
        };

        let mut params = HashMap::new();
        let (handler, chain) = {
            let root = self.root.read().expect("route table lock poisoned");
            let Some(node) = root.lookup(&segments, &mut params) else {
                return Arc::new(NotFoundHandler);
            };
            match node.entry(method) {
                Some(entry) => (entry.handler.clone(), entry.chain.clone()),
                None if node.has_any_handler() => return Arc::new(MethodNotAllowedHandler),
                None => return Arc::new(NotFoundHandler),
            }
        };

        request.path_params = params;
        compose(&chain, handler)
    }

    fn join_path(&self, path: &str) -> Result<String, RouteError> {
        if path.is_empty() {
            return Err(RouteError::RequestTargetEmpty);
        }
        if !path.starts_with('/') {
            return Err(RouteError::MalformedRequestTarget {
                target: path.to_string(),
            });
        }
        Ok(format!("{}{}", self.prefix, path))
    }

    /// Middleware lists visible from this group, outermost first.
    fn chain(&self) -> MiddlewareChain {
        let mut chain = self.parents.clone();
        chain.push(Arc::clone(&self.middleware));
        chain
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn compose(chain: &MiddlewareChain, handler: DynHandler) -> DynHandler {
    let mut middleware: Vec<DynMiddleware> = Vec::new();
    for list in chain {
        middleware.extend(
            list.read()
                .expect("middleware list lock poisoned")
                .iter()
                .cloned(),
        );
    }

    let mut composed = handler;
    for mw in middleware.iter().rev() {
        composed = mw.wrap(composed);
    }
    composed
}

/// `""` and `"/"` mean no prefix; anything else gets exactly one leading
/// `/` and no trailing `/`.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Splits a path into segments: `/` is the empty sequence; one leading and
/// at most one trailing `/` are stripped.
fn split_segments(path: &str) -> Result<Vec<String>, RouteError> {
    if path.is_empty() {
        return Err(RouteError::RequestTargetEmpty);
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(RouteError::MalformedRequestTarget {
            target: path.to_string(),
        });
    };
    if rest.is_empty() {
        return Ok(Vec::new());
    }
    let rest = rest.strip_suffix('/').unwrap_or(rest);
    if rest.is_empty() {
        return Ok(Vec::new());
    }
    Ok(rest.split('/').map(str::to_string).collect())
}

fn tokenize(path: &str) -> Result<Vec<PathToken>, RouteError> {
    let segments = split_segments(path)?;
    Ok(segments
        .into_iter()
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':') {
                PathToken::Param(name.to_string())
            } else {
                PathToken::Static(segment)
            }
        })
        .collect())
}
