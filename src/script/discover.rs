//! Procedure discovery.
//!
//! Public script functions whose name starts with an ASCII uppercase letter
//! are exposed under their lowercased name. Names that collide after
//! lowercasing (including overloads of different arity) share one entry and
//! the definition that comes last in the source wins.

use rhai::{AST, FnAccess};
use std::collections::BTreeMap;

/// Mapping from exposed procedure name to script binding name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionTable {
    entries: BTreeMap<String, String>,
}

impl FunctionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `binding` under `procedure`, returning the binding it replaced.
    pub fn insert(&mut self, procedure: String, binding: String) -> Option<String> {
        self.entries.insert(procedure, binding)
    }

    /// Script binding backing a procedure.
    pub fn resolve(&self, procedure: &str) -> Option<&str> {
        self.entries.get(procedure).map(String::as_str)
    }

    /// Whether the table exposes `procedure`.
    pub fn contains(&self, procedure: &str) -> bool {
        self.entries.contains_key(procedure)
    }

    /// Exposed procedure names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `(procedure, binding)` pairs, sorted by procedure.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(procedure, binding)| (procedure.as_str(), binding.as_str()))
    }

    /// Number of exposed procedures.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no procedure is exposed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Procedure name for a script binding, if the binding is exported.
pub fn procedure_name(binding: &str) -> Option<String> {
    binding
        .chars()
        .next()
        .filter(char::is_ascii_uppercase)
        .map(|_| binding.to_lowercase())
}

/// Build the procedure table for a compiled program.
pub fn discover_functions(ast: &AST) -> FunctionTable {
    // The AST stores functions by hash; walk them in source order instead.
    let mut definitions: Vec<_> = ast
        .iter_fn_def()
        .filter(|def| !matches!(def.access, FnAccess::Private))
        .collect();
    definitions.sort_by_key(|def| {
        let position = def.body.start_position();
        (position.line(), position.position())
    });

    let mut table = FunctionTable::new();
    for def in definitions {
        let binding = def.name.as_str();
        let Some(procedure) = procedure_name(binding) else {
            continue;
        };
        if let Some(previous) = table.insert(procedure.clone(), binding.to_string()) {
            tracing::debug!(
                procedure = %procedure,
                previous = %previous,
                binding,
                "procedure name collision, keeping the later binding"
            );
        }
    }
    table
}
