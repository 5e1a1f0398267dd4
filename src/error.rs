//! Rich diagnostic error types for the symbol registry.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. [`SymbolError`] carries the taxonomy every
//! proxy and registry operation reports; storage faults reach callers wrapped in
//! [`SymbolError::ResourceFailure`].

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the crate.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum SymdbError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Symbol(#[from] SymbolError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Symbol errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SymbolError {
    #[error("invalid input: {message}")]
    #[diagnostic(
        code(symdb::symbol::invalid_input),
        help(
            "The name, source type, or namespace is not acceptable for this symbol. \
             Names must be non-empty, contain no whitespace, and must not look like \
             an address-derived default name."
        )
    )]
    InvalidInput { message: String },

    #[error("duplicate name \"{name}\" in {namespace} at {address}")]
    #[diagnostic(
        code(symdb::symbol::duplicate_name),
        help(
            "Another non-default symbol of the same type already uses this name at \
             the same address and namespace. Pick a different name or namespace."
        )
    )]
    DuplicateName {
        name: String,
        namespace: String,
        address: String,
    },

    #[error("circular namespace: {message}")]
    #[diagnostic(
        code(symdb::symbol::circular_dependency),
        help("A symbol cannot be moved into a namespace that it contains.")
    )]
    CircularDependency { message: String },

    #[error("unsupported operation: {message}")]
    #[diagnostic(
        code(symdb::symbol::unsupported),
        help("This symbol type does not have the requested capability.")
    )]
    UnsupportedOperation { message: String },

    #[error("illegal state: {message}")]
    #[diagnostic(
        code(symdb::symbol::illegal_state),
        help(
            "The symbol was deleted, its record disappeared (for example after an \
             undo), or the operation is not allowed for its type. Look the symbol \
             up again from the registry."
        )
    )]
    IllegalState { message: String },

    #[error("record store failure: {source}")]
    #[diagnostic(
        code(symdb::symbol::resource_failure),
        help(
            "The persistent write did not complete. Abort the enclosing transaction; \
             the store may be corrupt or the disk unavailable."
        )
    )]
    ResourceFailure {
        #[from]
        source: StoreError,
    },
}

impl SymbolError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        SymbolError::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn illegal_state(message: impl Into<String>) -> Self {
        SymbolError::IllegalState {
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        SymbolError::UnsupportedOperation {
            message: message.into(),
        }
    }

    pub(crate) fn circular(message: impl Into<String>) -> Self {
        SymbolError::CircularDependency {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(symdb::store::io),
        help(
            "A filesystem operation failed. Check that the data directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("redb transaction error: {message}")]
    #[diagnostic(
        code(symdb::store::redb),
        help(
            "The embedded database encountered a transaction error. \
             This may indicate corruption. If the problem persists, file a bug report."
        )
    )]
    Redb { message: String },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(symdb::store::serde),
        help(
            "Failed to serialize or deserialize a symbol record. \
             This usually means the stored format changed between versions."
        )
    )]
    Serialization { message: String },

    #[error("symbol key space exhausted")]
    #[diagnostic(
        code(symdb::store::exhausted),
        help("No more symbol ids can be allocated from this store.")
    )]
    KeysExhausted,
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read registry config: {path}")]
    #[diagnostic(
        code(symdb::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse registry config: {message}")]
    #[diagnostic(
        code(symdb::config::parse),
        help("Check the TOML syntax and field names in the registry config.")
    )]
    Parse { message: String },

    #[error("invalid registry config: {message}")]
    #[diagnostic(code(symdb::config::invalid), help("{message}"))]
    Invalid { message: String },
}

/// Result alias for symbol and registry operations.
pub type SymbolResult<T> = std::result::Result<T, SymbolError>;

/// Convenience alias for crate-level results.
pub type SymdbResult<T> = std::result::Result<T, SymdbError>;
