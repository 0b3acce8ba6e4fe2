//! Endpoint registration.
//!
//! Components expose their HTTP endpoints through an [`EndpointRegistrar`]
//! rather than building routers themselves. The registrar keeps privileged
//! routes (reachable only by trusted internal callers on the admin
//! listener) apart from public ones.

use axum::{routing::MethodRouter, Router};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

/// Which listener an endpoint is served on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Trusted-caller-only admin listener.
    Private,

    /// Public listener.
    Public,
}

/// A registered endpoint, kept for startup logging and introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescription {
    pub path: String,
    pub description: String,
    pub visibility: Visibility,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrarError {
    #[error("Endpoint already registered: {0}")]
    DuplicatePath(String),

    #[error("Invalid endpoint path: {0}")]
    InvalidPath(String),
}

/// Registration surface that separates privileged from public routes.
pub trait EndpointRegistrar {
    /// Register a route on the privileged (admin) surface.
    fn register_private(
        &mut self,
        path: &str,
        description: &str,
        handler: MethodRouter,
    ) -> Result<(), RegistrarError>;

    /// Register a route on the public surface.
    fn register_public(
        &mut self,
        path: &str,
        description: &str,
        handler: MethodRouter,
    ) -> Result<(), RegistrarError>;
}

/// Registrar that assembles two axum routers.
#[derive(Default)]
pub struct AxumRegistrar {
    private: Router,
    public: Router,
    endpoints: Vec<EndpointDescription>,
    seen: HashSet<(Visibility, String)>,
}

/// Output of an [`AxumRegistrar`].
pub struct RegisteredRoutes {
    pub private: Router,
    pub public: Router,
    pub endpoints: Vec<EndpointDescription>,
}

impl AxumRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Endpoints registered so far.
    pub fn endpoints(&self) -> &[EndpointDescription] {
        &self.endpoints
    }

    /// Consume the registrar, yielding the assembled routers.
    pub fn finish(self) -> RegisteredRoutes {
        RegisteredRoutes {
            private: self.private,
            public: self.public,
            endpoints: self.endpoints,
        }
    }

    fn register(
        &mut self,
        visibility: Visibility,
        path: &str,
        description: &str,
        handler: MethodRouter,
    ) -> Result<(), RegistrarError> {
        validate_path(path)?;

        // axum panics on duplicate routes, so reject them first.
        if !self.seen.insert((visibility, path.to_string())) {
            return Err(RegistrarError::DuplicatePath(path.to_string()));
        }

        let router = match visibility {
            Visibility::Private => &mut self.private,
            Visibility::Public => &mut self.public,
        };
        *router = std::mem::take(router).route(path, handler);

        debug!(
            target: "auth.routes.registrar",
            path,
            visibility = ?visibility,
            "Registered endpoint"
        );

        self.endpoints.push(EndpointDescription {
            path: path.to_string(),
            description: description.to_string(),
            visibility,
        });
        Ok(())
    }
}

impl EndpointRegistrar for AxumRegistrar {
    fn register_private(
        &mut self,
        path: &str,
        description: &str,
        handler: MethodRouter,
    ) -> Result<(), RegistrarError> {
        self.register(Visibility::Private, path, description, handler)
    }

    fn register_public(
        &mut self,
        path: &str,
        description: &str,
        handler: MethodRouter,
    ) -> Result<(), RegistrarError> {
        self.register(Visibility::Public, path, description, handler)
    }
}

/// Only absolute, static paths are accepted: no empty segments and no
/// capture or wildcard segments.
fn validate_path(path: &str) -> Result<(), RegistrarError> {
    let Some(rest) = path.strip_prefix('/') else {
        return Err(RegistrarError::InvalidPath(path.to_string()));
    };

    if rest.is_empty() {
        return Ok(());
    }

    let valid = rest
        .split('/')
        .all(|segment| !segment.is_empty() && !segment.starts_with(&[':', '*'][..]));

    if valid {
        Ok(())
    } else {
        Err(RegistrarError::InvalidPath(path.to_string()))
    }
}

/// Join a route prefix and a leaf segment the way a URL path join does.
///
/// Empty segments collapse and the result always starts with `/`:
/// `("", "create")` gives `/create`, `("/auth/", "join")` gives `/auth/join`.
pub fn join_route(prefix: &str, leaf: &str) -> String {
    let segments: Vec<&str> = prefix
        .split('/')
        .chain(leaf.split('/'))
        .filter(|s| !s.is_empty())
        .collect();

    format!("/{}", segments.join("/"))
}
