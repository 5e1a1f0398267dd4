// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # symdb
//!
//! A cached, lock-synchronized symbol registry for program analysis: named and
//! anonymous bindings of program locations, backed by a persistent record store.
//!
//! ## Architecture
//!
//! - **Record store** (`store`): memory (DashMap) or durable (redb) symbol rows
//! - **Proxies** (`proxy`): one live [`Symbol`](proxy::Symbol) per key, lazily revalidated
//! - **Registry** (`registry`): reentrant lock, object cache, naming and namespace invariants
//! - **Collaborators**: references (`reference`), primary/entry-point state
//!   (`context`), label history (`history`), change events (`event`)
//! - **Type rules** (`rules`): per-type capability table
//!
//! ## Library usage
//!
//! ```no_run
//! use symdb::address::Address;
//! use symdb::registry::{SymbolRegistry, SymbolSpec};
//! use symdb::symbol::{Namespace, SourceType};
//!
//! let registry = SymbolRegistry::new();
//! let ns = registry.create_symbol(SymbolSpec::namespace("net")).unwrap();
//! let connect = registry
//!     .create_symbol(SymbolSpec::function("connect", Address::ram(0x401000)))
//!     .unwrap();
//! connect
//!     .set_name_and_namespace("open", Namespace::from(ns.id().unwrap()), SourceType::UserDefined)
//!     .unwrap();
//! assert_eq!(connect.name_with_namespace(true).unwrap(), "net::open");
//! ```

pub mod address;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod history;
pub mod monitor;
pub mod name;
pub mod proxy;
pub mod record;
pub mod reference;
pub mod registry;
pub mod rules;
pub mod store;
pub mod symbol;
