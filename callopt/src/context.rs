///
/// Compilation Context
///
/// The services a rule talks to while lowering one call, passed to it by
/// reference as explicit collaborators:
///
/// - DependencyRegistrar: runtime kernel headers the emitted code needs
/// - CodeSink: the append-only stream of emitted C statements
/// - Backend: how a symbol variable is referenced and initialized in C
/// - SymbolTable: declared variables and temporaries
///
/// Registrar and sink are append-only while a call is being lowered. Each
/// compilation unit owns its own instances; nothing here is shared between
/// units.
///

use indexmap::IndexSet;

use crate::symbols::{SymbolTable, SymbolVariable};

pub trait DependencyRegistrar {
    fn add_dependency(&mut self, module: &str);
}

pub trait CodeSink {
    fn emit(&mut self, instruction: &str);
}

pub trait Backend {
    /// Addressable code reference for a variable (`&parts`, `return_value`).
    fn variable_code(&self, var: &SymbolVariable) -> String;

    /// Statement that initializes a variant variable before it is written.
    fn init_variant(&self, var: &SymbolVariable) -> String;

    /// Statement that stores the value of `src` into `dest`.
    fn copy_variable(&self, dest: &SymbolVariable, src: &SymbolVariable) -> String;
}

pub struct CompilationContext<'a> {
    pub symbols: &'a mut SymbolTable,
    pub headers: &'a mut dyn DependencyRegistrar,
    pub code: &'a mut dyn CodeSink,
    pub backend: &'a dyn Backend,
}

impl<'a> CompilationContext<'a> {
    pub fn new(
        symbols: &'a mut SymbolTable,
        headers: &'a mut dyn DependencyRegistrar,
        code: &'a mut dyn CodeSink,
        backend: &'a dyn Backend,
    ) -> Self {
        Self {
            symbols,
            headers,
            code,
            backend,
        }
    }
}

/// Ordered, de-duplicated set of kernel headers.
#[derive(Debug, Default, Clone)]
pub struct HeadersManager {
    headers: IndexSet<String>,
}

impl HeadersManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, module: &str) -> bool {
        self.headers.contains(module)
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(String::as_str)
    }

    pub fn includes(&self) -> Vec<String> {
        self.headers
            .iter()
            .map(|h| format!("#include \"{}.h\"", h))
            .collect()
    }
}

impl DependencyRegistrar for HeadersManager {
    fn add_dependency(&mut self, module: &str) {
        if !self.contains(module) {
            self.headers.insert(module.to_string());
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct CodePrinter {
    lines: Vec<String>,
    level: usize,
}

impl CodePrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(level: usize) -> Self {
        Self {
            lines: Vec::new(),
            level,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    pub fn output(&self) -> String {
        let mut out = self.lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

impl CodeSink for CodePrinter {
    fn emit(&mut self, instruction: &str) {
        let mut line = "\t".repeat(self.level);
        line.push_str(instruction);
        self.lines.push(line);
    }
}

/// C backend: boxed values live in stack variables passed by address.
#[derive(Debug, Default, Clone, Copy)]
pub struct CBackend;

impl Backend for CBackend {
    fn variable_code(&self, var: &SymbolVariable) -> String {
        if var.name() == "return_value" || !var.ty().is_boxed() {
            var.name().to_string()
        } else {
            format!("&{}", var.name())
        }
    }

    fn init_variant(&self, var: &SymbolVariable) -> String {
        format!("INIT_VAR({});", self.variable_code(var))
    }

    fn copy_variable(&self, dest: &SymbolVariable, src: &SymbolVariable) -> String {
        format!("ZVAL_COPY({}, {});", self.variable_code(dest), self.variable_code(src))
    }
}
