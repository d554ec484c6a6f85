///
/// Compilation Driver
///
/// Compiles a unit (declared variables plus a list of calls) into C
/// statements. Each call is offered to the rule registered under its name;
/// when there is none, or the rule declines, the call goes through the
/// generic runtime dispatch `call_function(dest, "name", args...)`.
///
/// A result written through a temporary is copied into its assignment target
/// once the call is lowered. The first compile error stops the unit.
///

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::ast::CallExpression;
use crate::call::{Call, CallHandle};
use crate::config::{Config, OutputConfig};
use crate::context::{CBackend, CodePrinter, CompilationContext, HeadersManager};
use crate::error::CompileError;
use crate::optimizer::escape::escape_c_string;
use crate::optimizer::{
    CompiledExpression, OptimizerRegistry, Outcome, require_variant_destination,
};
use crate::source::Span;
use crate::symbols::{SymbolTable, VarType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: VarType,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Source file the calls were parsed from, used for error locations.
    #[serde(default)]
    pub source: Option<PathBuf>,
    #[serde(default)]
    pub variables: Vec<VarDecl>,
    #[serde(default)]
    pub calls: Vec<CallExpression>,
}

impl Unit {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone)]
pub struct CompiledUnit {
    pub headers: HeadersManager,
    pub code: CodePrinter,
}

impl CompiledUnit {
    pub fn render(&self, with_headers: bool) -> String {
        let mut out = String::new();
        let includes = self.headers.includes();
        if with_headers && !includes.is_empty() {
            for include in includes {
                out.push_str(&include);
                out.push('\n');
            }
            out.push('\n');
        }
        out.push_str(&self.code.output());
        out
    }
}

pub struct Compiler {
    registry: OptimizerRegistry,
    output: OutputConfig,
}

impl Compiler {
    pub fn new(config: &Config) -> Self {
        Self {
            registry: OptimizerRegistry::from_config(&config.optimizer),
            output: config.output.clone(),
        }
    }

    pub fn compile_unit(&self, unit: &Unit) -> Result<CompiledUnit, CompileError> {
        let mut symbols = SymbolTable::new();
        for decl in &unit.variables {
            symbols.declare(&decl.name, decl.ty, decl.span)?;
        }

        let mut headers = HeadersManager::new();
        let mut code = CodePrinter::with_level(self.output.indent);
        let backend = CBackend;

        for expr in &unit.calls {
            let mut ctx = CompilationContext::new(&mut symbols, &mut headers, &mut code, &backend);
            let compiled = self.compile_call(expr, &mut ctx)?;
            trace!(function = %expr.name, result = %compiled.name, "call compiled");
        }

        Ok(CompiledUnit {
            headers,
            code,
        })
    }

    pub fn compile_call(
        &self,
        expr: &CallExpression,
        ctx: &mut CompilationContext<'_>,
    ) -> Result<CompiledExpression, CompileError> {
        let mut call = Call::new(expr);
        match self.registry.optimize(expr, &mut call, ctx)? {
            Outcome::Compiled(compiled) => Ok(call.finish(compiled, ctx)),
            Outcome::Declined => {
                debug!(function = %expr.name, "falling back to generic call");
                generic_call(expr, ctx)
            }
        }
    }
}

/// Dynamic dispatch through the runtime's function table.
pub fn generic_call(
    expr: &CallExpression,
    ctx: &mut CompilationContext<'_>,
) -> Result<CompiledExpression, CompileError> {
    let mut call = Call::new(expr);
    call.process_expected_return(ctx)?;
    let dest = call.symbol_variable(true, ctx)?;
    require_variant_destination(ctx, dest, expr)?;

    let params = expr.parameters.as_deref().unwrap_or_default();
    let operands = call.read_only_resolved_params(params, ctx, expr)?;
    ctx.headers.add_dependency("kernel/fcall");

    let var = ctx.symbols.get_mut(dest);
    if call.must_init_symbol_variable() {
        var.init_variant(ctx.backend, ctx.code);
    }
    let name = var.name().to_string();

    let mut args = vec![
        ctx.backend.variable_code(var),
        format!("\"{}\"", escape_c_string(&expr.name)),
    ];
    args.extend(operands);
    ctx.code.emit(&format!("call_function({});", args.join(", ")));

    Ok(call.finish(CompiledExpression::variable(name, expr), ctx))
}
