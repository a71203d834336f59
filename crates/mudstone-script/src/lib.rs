//! # mudstone-script: the embedded script VM boundary
//!
//! The scripting runtime is an external collaborator; the simulation
//! depends only on the calling contract defined here:
//!
//! * [`ScriptVm::compile`] turns source text into a [`Closure`];
//! * [`ScriptVm::invoke`] runs a closure with arguments;
//! * [`ScriptVm::gc_protect`] / [`ScriptVm::gc_protect_clear`] root
//!   values for the current request;
//! * [`ScriptVm::collect_garbage_nongrowing`] runs a bounded collection
//!   at scheduler quiescence.
//!
//! Execution carries an [`ExecContext`] naming the acting mobile. All
//! re-entry into the simulation from a script goes back through the
//! command dispatcher, so position and trust checks apply uniformly.
//!
//! The bundled implementation is deliberately small: closures are bound
//! to native functions registered at boot under global names. A full
//! bytecode runtime can replace it behind the same contract.

use std::collections::HashMap;

use thiserror::Error;

/// Result alias for VM operations.
pub type ScriptResult<T> = Result<T, ScriptError>;

/// Script boundary errors. A failing script aborts only itself.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Source text rejected at compile time.
    #[error("compile error at line {line}: {message}")]
    Compile { line: u32, message: String },

    /// A runtime fault inside a closure.
    #[error("runtime error in '{closure}': {message}")]
    Runtime { closure: String, message: String },

    /// Lookup of an unbound global.
    #[error("unknown global '{0}'")]
    UnknownGlobal(String),

    /// The named global exists but is not callable.
    #[error("'{0}' is not callable")]
    NotCallable(String),
}

/// A value crossing the VM boundary.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Boolean(bool),
    Number(f64),
    Text(String),
    /// A runtime entity id (mobile or object), passed opaquely.
    Entity(u64),
}

/// Execution context for one invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecContext {
    /// Runtime id of the acting mobile, when a mobile is acting.
    pub self_actor: Option<u64>,
    /// Set for interactive evaluation; never set by the simulation.
    pub is_repl: bool,
}

/// A compiled script handle. Cheap to clone; identity is the handle id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closure {
    id: u64,
    name: String,
}

impl Closure {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Signature of a native function callable from the VM.
pub type NativeFn = fn(&ExecContext, &[Value]) -> ScriptResult<Value>;

enum Global {
    Native(NativeFn),
    Compiled(u64),
}

/// The VM instance. One per process, owned by the server.
#[derive(Default)]
pub struct ScriptVm {
    globals: HashMap<String, Global>,
    chunks: HashMap<u64, String>,
    protected: Vec<Value>,
    next_id: u64,
    /// Live-heap estimate driving the collection ceiling.
    heap_cells: usize,
}

impl ScriptVm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a native function under a global name. Used at boot to
    /// expose command natives.
    pub fn register_native(&mut self, name: &str, function: NativeFn) {
        self.globals.insert(name.to_string(), Global::Native(function));
    }

    /// Compiles source into a closure bound to a fresh chunk. The only
    /// compile-time validation the stub performs is rejecting empty
    /// source and unbalanced braces, with a line number for diagnostics.
    pub fn compile(&mut self, name: &str, source: &str) -> ScriptResult<Closure> {
        if source.trim().is_empty() {
            return Err(ScriptError::Compile {
                line: 1,
                message: "empty source".to_string(),
            });
        }
        let mut depth: i64 = 0;
        for (index, line) in source.lines().enumerate() {
            for c in line.chars() {
                match c {
                    '{' => depth += 1,
                    '}' => depth -= 1,
                    _ => {}
                }
                if depth < 0 {
                    return Err(ScriptError::Compile {
                        line: index as u32 + 1,
                        message: "unbalanced '}'".to_string(),
                    });
                }
            }
        }
        if depth != 0 {
            return Err(ScriptError::Compile {
                line: source.lines().count() as u32,
                message: "unbalanced '{'".to_string(),
            });
        }

        self.next_id += 1;
        let id = self.next_id;
        self.heap_cells += source.len();
        self.chunks.insert(id, source.to_string());
        self.globals.insert(name.to_string(), Global::Compiled(id));
        Ok(Closure {
            id,
            name: name.to_string(),
        })
    }

    /// Resolves a global name to a callable closure.
    pub fn lookup(&self, name: &str) -> ScriptResult<Closure> {
        match self.globals.get(name) {
            Some(Global::Compiled(id)) => Ok(Closure {
                id: *id,
                name: name.to_string(),
            }),
            Some(Global::Native(_)) => Ok(Closure {
                id: 0,
                name: name.to_string(),
            }),
            None => Err(ScriptError::UnknownGlobal(name.to_string())),
        }
    }

    /// Invokes a closure. Native globals dispatch directly; compiled
    /// chunks evaluate in the stub runtime (which understands only a
    /// `return <literal>` form and otherwise yields nil).
    pub fn invoke(
        &mut self,
        closure: &Closure,
        context: &ExecContext,
        args: &[Value],
    ) -> ScriptResult<Value> {
        match self.globals.get(&closure.name) {
            Some(Global::Native(function)) => function(context, args),
            Some(Global::Compiled(id)) => {
                let chunk = self.chunks.get(id).cloned().ok_or_else(|| {
                    ScriptError::Runtime {
                        closure: closure.name.clone(),
                        message: "chunk collected".to_string(),
                    }
                })?;
                Ok(eval_chunk(&chunk))
            }
            None => Err(ScriptError::UnknownGlobal(closure.name.clone())),
        }
    }

    /// Roots a value for the duration of the current request.
    pub fn gc_protect(&mut self, value: Value) {
        self.protected.push(value);
    }

    /// Clears the rooted set; called at the end of each request.
    pub fn gc_protect_clear(&mut self) {
        self.protected.clear();
    }

    /// Runs a collection generation without growing the heap ceiling.
    /// Returns the number of cells still live.
    pub fn collect_garbage_nongrowing(&mut self) -> usize {
        // Chunks still referenced by a global survive; orphans go.
        let live: std::collections::HashSet<u64> = self
            .globals
            .values()
            .filter_map(|g| match g {
                Global::Compiled(id) => Some(*id),
                Global::Native(_) => None,
            })
            .collect();
        self.chunks.retain(|id, _| live.contains(id));
        self.heap_cells = self.chunks.values().map(String::len).sum();
        self.heap_cells
    }

    /// Current rooted-value count, for the stat surface.
    pub fn protected_count(&self) -> usize {
        self.protected.len()
    }
}

/// The stub evaluator: `return <number|string|true|false>` or nil.
fn eval_chunk(chunk: &str) -> Value {
    for line in chunk.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("return ") {
            let literal = rest.trim_end_matches(';').trim();
            if let Ok(number) = literal.parse::<f64>() {
                return Value::Number(number);
            }
            if literal == "true" {
                return Value::Boolean(true);
            }
            if literal == "false" {
                return Value::Boolean(false);
            }
            if literal.len() >= 2 && literal.starts_with('"') && literal.ends_with('"') {
                return Value::Text(literal[1..literal.len() - 1].to_string());
            }
        }
    }
    Value::Nil
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greet(_ctx: &ExecContext, args: &[Value]) -> ScriptResult<Value> {
        Ok(args.first().cloned().unwrap_or_default())
    }

    #[test]
    fn native_round_trip() {
        let mut vm = ScriptVm::new();
        vm.register_native("greet", greet);
        let closure = vm.lookup("greet").unwrap();
        let out = vm
            .invoke(&closure, &ExecContext::default(), &[Value::Text("hi".into())])
            .unwrap();
        assert_eq!(out, Value::Text("hi".into()));
    }

    #[test]
    fn compile_rejects_unbalanced_braces() {
        let mut vm = ScriptVm::new();
        let err = vm.compile("bad", "fun f() {\n").unwrap_err();
        assert!(matches!(err, ScriptError::Compile { .. }));
    }

    #[test]
    fn compiled_chunk_returns_literal() {
        let mut vm = ScriptVm::new();
        let closure = vm.compile("answer", "return 42\n").unwrap();
        let out = vm.invoke(&closure, &ExecContext::default(), &[]).unwrap();
        assert_eq!(out, Value::Number(42.0));
    }

    #[test]
    fn unknown_global_errors() {
        let vm = ScriptVm::new();
        assert!(matches!(
            vm.lookup("nope"),
            Err(ScriptError::UnknownGlobal(_))
        ));
    }

    #[test]
    fn collection_drops_orphaned_chunks() {
        let mut vm = ScriptVm::new();
        vm.compile("keep", "return 1").unwrap();
        vm.compile("keep", "return 2").unwrap(); // rebinding orphans chunk 1
        let live = vm.collect_garbage_nongrowing();
        assert_eq!(live, "return 2".len());
    }

    #[test]
    fn protect_and_clear() {
        let mut vm = ScriptVm::new();
        vm.gc_protect(Value::Number(1.0));
        vm.gc_protect(Value::Nil);
        assert_eq!(vm.protected_count(), 2);
        vm.gc_protect_clear();
        assert_eq!(vm.protected_count(), 0);
    }
}
