//! Error types reported by registration, response lookup and configuration.
//!
//! Lookups never fail: a miss always resolves to some fallback handler. The
//! errors here are raised while a router is being built or configured.

use thiserror::Error;

/// Errors raised while registering routes or resolving predefined responses
#[derive(Debug, Error)]
pub enum RouterError {
    /// A route or middleware path that does not start with `/` (and is not `*`)
    #[error("path must start with '/': {path:?}")]
    InvalidPath {
        /// The rejected path as given by the caller
        path: String,
    },

    /// A method name that is neither `*` nor a valid HTTP token
    #[error("invalid method {method:?}")]
    InvalidMethod {
        /// The rejected method name
        method: String,
    },

    /// A predefined response was requested by a name that was never defined
    #[error("response {name:?} is not predefined (define it in the response registry first)")]
    NameNotFound {
        /// The missing name
        name: String,
    },

    /// A response was defined with a status outside the HTTP range
    #[error("invalid HTTP status code {status}")]
    InvalidStatus {
        /// The rejected status code
        status: u16,
    },

    /// A route table document could not be parsed
    #[error("invalid route table: {0}")]
    Config(#[from] serde_yaml::Error),

    /// A route table file could not be read
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RouterError {
    pub(crate) fn invalid_path(path: impl Into<String>) -> Self {
        RouterError::InvalidPath { path: path.into() }
    }

    pub(crate) fn invalid_method(method: impl Into<String>) -> Self {
        RouterError::InvalidMethod {
            method: method.into(),
        }
    }

    pub fn name_not_found(name: impl Into<String>) -> Self {
        RouterError::NameNotFound { name: name.into() }
    }
}
