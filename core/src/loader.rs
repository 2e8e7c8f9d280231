//! Module loader
//!
//! Reads a compiled WebAssembly guest from storage and validates it into an
//! instantiable handle. Nothing is executed here.

use crate::errors::{HarnessError, Result};
use crate::hashing::keccak256;
use crate::types::Hash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use wasmi::{Engine, Module};

/// A single function or global the module expects the host to provide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
    pub module: String,
    pub name: String,
}

/// Shape of a loaded module, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub imports: Vec<ImportSpec>,
    pub exports: Vec<String>,
}

impl ModuleInfo {
    pub fn exports_fn(&self, name: &str) -> bool {
        self.exports.iter().any(|e| e == name)
    }
}

/// A validated guest module bound to the engine that will run it
pub struct LoadedModule {
    label: String,
    engine: Engine,
    module: Module,
    code_hash: Hash,
    size: usize,
}

impl fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModule")
            .field("label", &self.label)
            .field("size", &self.size)
            .field("code_hash", &self.code_hash)
            .finish()
    }
}

impl LoadedModule {
    /// Where the module came from, for diagnostics
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Keccak256 of the module bytes
    pub fn code_hash(&self) -> Hash {
        self.code_hash
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn info(&self) -> ModuleInfo {
        ModuleInfo {
            imports: self
                .module
                .imports()
                .map(|import| ImportSpec {
                    module: import.module().to_string(),
                    name: import.name().to_string(),
                })
                .collect(),
            exports: self
                .module
                .exports()
                .map(|export| export.name().to_string())
                .collect(),
        }
    }
}

/// Loads guest modules into a fresh interpreter engine
#[derive(Debug, Default)]
pub struct ModuleLoader;

impl ModuleLoader {
    /// Read and validate the module at `path`
    ///
    /// # Errors
    /// * `HarnessError::Load` - the file is missing or unreadable
    /// * `HarnessError::MalformedModule` - the bytes are not a valid module
    pub fn load<P: AsRef<Path>>(path: P) -> Result<LoadedModule> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| HarnessError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path.display().to_string(), &bytes)
    }

    /// Validate an in-memory module
    pub fn from_bytes(label: impl Into<String>, bytes: &[u8]) -> Result<LoadedModule> {
        let label = label.into();
        let engine = Engine::default();
        let module = Module::new(&engine, bytes).map_err(|err| HarnessError::MalformedModule {
            label: label.clone(),
            reason: err.to_string(),
        })?;

        let loaded = LoadedModule {
            label,
            engine,
            module,
            code_hash: keccak256(bytes),
            size: bytes.len(),
        };
        tracing::debug!(
            module = %loaded.label,
            size = loaded.size,
            imports = loaded.module.imports().count(),
            "module loaded"
        );
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUEST: &str = r#"
        (module
            (import "env" "wasm_input" (func $input (param i32) (result i64)))
            (import "env" "wasm_output" (func $output (param i64)))
            (func (export "zkmain") (result i64)
                (call $output (call $input (i32.const 1)))
                (i64.const 0)))
    "#;

    #[test]
    fn test_load_from_bytes() {
        let bytes = wat::parse_str(GUEST).unwrap();
        let loaded = ModuleLoader::from_bytes("guest", &bytes).unwrap();

        let info = loaded.info();
        assert_eq!(info.imports.len(), 2);
        assert_eq!(info.imports[0].module, "env");
        assert_eq!(info.imports[0].name, "wasm_input");
        assert!(info.exports_fn("zkmain"));
        assert_eq!(loaded.size(), bytes.len());
        assert_eq!(loaded.code_hash(), keccak256(&bytes));
    }

    #[test]
    fn test_loading_twice_is_identical() {
        let bytes = wat::parse_str(GUEST).unwrap();
        let a = ModuleLoader::from_bytes("guest", &bytes).unwrap();
        let b = ModuleLoader::from_bytes("guest", &bytes).unwrap();

        assert_eq!(a.info(), b.info());
        assert_eq!(a.code_hash(), b.code_hash());
    }

    #[test]
    fn test_malformed_module() {
        let err = ModuleLoader::from_bytes("junk", b"not a wasm module").unwrap_err();
        assert!(matches!(err, HarnessError::MalformedModule { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_missing_file() {
        let err = ModuleLoader::load("/nonexistent/zkwasm/guest.wasm").unwrap_err();
        assert!(matches!(err, HarnessError::Load { .. }));
    }
}
