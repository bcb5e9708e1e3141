#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Manifest policy tests for the cube-four client.
//!
//! These tests verify that Cargo.toml keeps the panic-free lint policy, the
//! feature layout and the demo wiring the project relies on. If one fails,
//! the manifest has drifted from the agreed-upon standards.
//!
//! All checks are synchronous filesystem reads; no async runtime needed.

use std::path::PathBuf;

/// Returns the project root directory (where Cargo.toml lives).
fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Reads and parses the project's Cargo.toml.
fn manifest() -> toml::Table {
    let path = project_root().join("Cargo.toml");
    let contents = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read '{}': {e}", path.display()));
    contents
        .parse::<toml::Table>()
        .unwrap_or_else(|e| panic!("Cargo.toml is not valid TOML: {e}"))
}

fn table<'a>(parent: &'a toml::Table, key: &str) -> &'a toml::Table {
    parent
        .get(key)
        .and_then(toml::Value::as_table)
        .unwrap_or_else(|| panic!("Cargo.toml is missing the [{key}] table"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Module: lint_policy
// ─────────────────────────────────────────────────────────────────────────────

mod lint_policy {
    use super::*;

    const REQUIRED_DENY_LINTS: &[&str] = &[
        "unwrap_used",
        "expect_used",
        "panic",
        "todo",
        "unimplemented",
        "indexing_slicing",
    ];

    #[test]
    fn all_panic_prone_lints_are_denied() {
        let manifest = manifest();
        let clippy = table(table(&manifest, "lints"), "clippy");

        for lint in REQUIRED_DENY_LINTS {
            assert_eq!(
                clippy.get(*lint).and_then(toml::Value::as_str),
                Some("deny"),
                "[lints.clippy] must set `{lint} = \"deny\"` to keep library \
                 code panic-free."
            );
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Module: feature_policy
// ─────────────────────────────────────────────────────────────────────────────

mod feature_policy {
    use super::*;

    #[test]
    fn http_service_is_default_and_optional() {
        let manifest = manifest();
        let features = table(&manifest, "features");
        let default = features["default"].as_array().unwrap();
        assert!(default.iter().any(|f| f.as_str() == Some("service-http")));

        let reqwest = table(&manifest, "dependencies")
            .get("reqwest")
            .and_then(toml::Value::as_table)
            .expect("reqwest must be declared as a table dependency");
        assert_eq!(reqwest.get("optional").and_then(toml::Value::as_bool), Some(true));
    }

    #[test]
    fn msrv_is_declared() {
        let manifest = manifest();
        let version = table(&manifest, "package")
            .get("rust-version")
            .and_then(toml::Value::as_str)
            .expect("Cargo.toml must declare a rust-version");
        assert!(version.split('.').count() >= 2, "rust-version '{version}' is malformed");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Module: demo_policy
// ─────────────────────────────────────────────────────────────────────────────

mod demo_policy {
    use super::*;

    #[test]
    fn every_declared_demo_exists() {
        let manifest = manifest();
        let examples = manifest["example"].as_array().expect("[[example]] entries");
        assert!(!examples.is_empty());

        for example in examples {
            let path = example["path"].as_str().unwrap();
            assert!(
                path.starts_with("demos/"),
                "demo '{path}' must live under demos/"
            );
            assert!(
                project_root().join(path).is_file(),
                "demo '{path}' is declared in Cargo.toml but does not exist"
            );
        }
    }
}
