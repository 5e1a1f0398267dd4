//! Persistence tests for the durable (redb) registry.
//!
//! These verify that symbols, names, namespaces and the id counter survive a
//! close + reopen cycle.

use std::sync::Arc;

use symdb::address::Address;
use symdb::config::RegistryConfig;
use symdb::registry::{SymbolRegistry, SymbolSpec};
use symdb::symbol::{Namespace, SourceType, SymbolType};

fn persistent_registry(dir: &std::path::Path) -> Arc<SymbolRegistry> {
    SymbolRegistry::open(&RegistryConfig::persistent(dir)).unwrap()
}

#[test]
fn symbols_survive_reopen() {
    let dir = tempfile::TempDir::new().unwrap();

    // First session: a namespace, a function inside it, and a default label.
    {
        let registry = persistent_registry(dir.path());
        let ns = registry.create_symbol(SymbolSpec::namespace("crt")).unwrap();
        registry
            .create_symbol(
                SymbolSpec::function("init", Address::ram(0x1000))
                    .in_namespace(Namespace::from(ns.id().unwrap())),
            )
            .unwrap();
        registry
            .create_symbol(
                SymbolSpec::label("", Address::ram(0x1040)).with_source(SourceType::Default),
            )
            .unwrap();
    }

    // Second session: everything is still there.
    {
        let registry = persistent_registry(dir.path());
        assert_eq!(registry.all_symbols().unwrap().len(), 3);

        let init = registry
            .symbols_at(Address::ram(0x1000))
            .unwrap()
            .pop()
            .unwrap();
        assert_eq!(init.symbol_type(), SymbolType::Function);
        assert_eq!(init.name_with_namespace(true).unwrap(), "crt::init");

        let label = registry
            .symbols_at(Address::ram(0x1040))
            .unwrap()
            .pop()
            .unwrap();
        assert_eq!(label.name().unwrap(), "LAB_00001040");
        assert_eq!(label.source().unwrap(), SourceType::Default);
    }
}

#[test]
fn ids_are_not_reused_after_reopen() {
    let dir = tempfile::TempDir::new().unwrap();

    let deleted_id;
    {
        let registry = persistent_registry(dir.path());
        registry
            .create_symbol(SymbolSpec::label("a", Address::ram(0x10)))
            .unwrap();
        let b = registry
            .create_symbol(SymbolSpec::label("b", Address::ram(0x20)))
            .unwrap();
        deleted_id = b.id().unwrap();
        assert!(b.delete().unwrap());
    }

    {
        let registry = persistent_registry(dir.path());
        let c = registry
            .create_symbol(SymbolSpec::label("c", Address::ram(0x30)))
            .unwrap();
        assert!(c.id().unwrap() > deleted_id);
        assert!(registry.symbol(deleted_id).unwrap().is_none());
    }
}

#[test]
fn renames_and_reparenting_persist() {
    let dir = tempfile::TempDir::new().unwrap();

    let id;
    {
        let registry = persistent_registry(dir.path());
        let ns = registry.create_symbol(SymbolSpec::namespace("net")).unwrap();
        let sym = registry
            .create_symbol(SymbolSpec::function("connect", Address::ram(0x500)))
            .unwrap();
        sym.set_name_and_namespace(
            "open",
            Namespace::from(ns.id().unwrap()),
            SourceType::Imported,
        )
        .unwrap();
        sym.set_pinned(true).unwrap();
        sym.set_symbol_data3(Some("ordinal 7")).unwrap();
        id = sym.id().unwrap();
    }

    {
        let registry = persistent_registry(dir.path());
        let sym = registry.symbol(id).unwrap().unwrap();
        assert_eq!(sym.path().unwrap(), vec!["net", "open"]);
        assert_eq!(sym.source().unwrap(), SourceType::Imported);
        assert!(sym.is_pinned().unwrap());
        assert_eq!(sym.symbol_data3().unwrap().as_deref(), Some("ordinal 7"));
    }
}

#[test]
fn promoted_dynamic_symbol_persists() {
    let dir = tempfile::TempDir::new().unwrap();
    let addr = Address::ram(0x401000);

    {
        let registry = persistent_registry(dir.path());
        let dynamic = registry.dynamic_symbol(addr).unwrap().unwrap();
        dynamic
            .set_name_and_namespace("main", Namespace::Global, SourceType::UserDefined)
            .unwrap();
    }

    {
        let registry = persistent_registry(dir.path());
        assert!(registry.dynamic_symbol(addr).unwrap().is_none());
        let at = registry.symbols_at(addr).unwrap();
        assert_eq!(at.len(), 1);
        assert_eq!(at[0].name().unwrap(), "main");
        assert!(!at[0].is_dynamic());
    }
}

#[test]
fn config_file_opens_durable_registry() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("symdb.toml");
    let data = dir.path().join("data");
    std::fs::write(
        &path,
        format!(
            "data_dir = {:?}\nmax_name_length = 64\n",
            data.display().to_string()
        ),
    )
    .unwrap();

    let config = RegistryConfig::load(&path).unwrap();
    assert_eq!(config.max_name_length, 64);
    let registry = SymbolRegistry::open(&config).unwrap();
    registry
        .create_symbol(SymbolSpec::label("x", Address::ram(0x10)))
        .unwrap();
    let info = registry.info().unwrap();
    assert!(info.persistent);
    assert_eq!(info.symbols, 1);
    assert!(data.join("symbols.redb").exists());
}
