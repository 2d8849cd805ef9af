//! Compiled script programs.

use rhai::{AST, Dynamic, Engine, Scope};

use super::{FunctionTable, ScriptError, ScriptResult, discover_functions};

/// Script source compiled once and shared read-only between calls.
pub struct ScriptProgram {
    engine: Engine,
    ast: AST,
    fingerprint: String,
    strict: bool,
}

impl ScriptProgram {
    /// Compile `source` and evaluate its top-level statements once.
    ///
    /// With `strict` set, use of undeclared variables is a compile error.
    pub fn compile(source: &str, strict: bool) -> ScriptResult<Self> {
        let engine = build_engine(strict);
        let ast = engine.compile(source).map_err(ScriptError::Compile)?;
        engine
            .run_ast_with_scope(&mut Scope::new(), &ast)
            .map_err(ScriptError::Evaluate)?;

        Ok(Self {
            engine,
            ast,
            fingerprint: blake3::hash(source.as_bytes()).to_hex().to_string(),
            strict,
        })
    }

    /// Procedures exposed by this program.
    pub fn functions(&self) -> FunctionTable {
        discover_functions(&self.ast)
    }

    /// Call the script function `binding` in a fresh evaluation context.
    ///
    /// Top-level statements are re-run in a new scope before the call, so
    /// nothing a previous call did to script globals is visible.
    pub fn call(&self, binding: &str, args: Vec<Dynamic>) -> ScriptResult<Dynamic> {
        let mut scope = Scope::new();
        self.engine
            .call_fn::<Dynamic>(&mut scope, &self.ast, binding, args)
            .map_err(ScriptError::Call)
    }

    /// Hex blake3 digest of the source text.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Whether the program was compiled in strict mode.
    pub fn is_strict(&self) -> bool {
        self.strict
    }
}

impl std::fmt::Debug for ScriptProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptProgram")
            .field("fingerprint", &self.fingerprint)
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

fn build_engine(strict: bool) -> Engine {
    let mut engine = Engine::new();
    engine.set_strict_variables(strict);
    // stdout belongs to the host protocol; script output goes to the log.
    engine.on_print(|text| tracing::info!(target: "scriptfn::script", "{text}"));
    engine.on_debug(|text, source, pos| {
        tracing::debug!(target: "scriptfn::script", source = ?source, position = %pos, "{text}");
    });
    engine
}
