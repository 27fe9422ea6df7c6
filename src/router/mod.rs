//! Request router
//!
//! Classifies incoming requests: the single upload endpoint, static file
//! paths, and everything else.

use thiserror::Error;

/// Router errors
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),
}

/// Routed request types
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// POST /upload
    Upload,
    /// GET/HEAD anything else, served from the static root
    Static { path: String },
}

impl Route {
    /// Classify an HTTP request by method and path.
    ///
    /// The root path maps to `index.html`, matching how the original
    /// served its upload page.
    pub fn parse(method: &str, path: &str) -> Result<Route, RouterError> {
        match method {
            "POST" if path == "/upload" => Ok(Route::Upload),
            "GET" | "HEAD" => {
                let path = if path == "/" { "/index.html" } else { path };
                Ok(Route::Static { path: path.into() })
            }
            _ => Err(RouterError::MethodNotAllowed(format!(
                "{} {} not allowed",
                method, path
            ))),
        }
    }

    /// Label used for the per-route request counter
    pub fn label(&self) -> &'static str {
        match self {
            Route::Upload => "upload",
            Route::Static { .. } => "static",
        }
    }
}
