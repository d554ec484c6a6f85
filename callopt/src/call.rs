///
/// Call Handle
///
/// Per-call state shared between the driver and the rule lowering the call:
/// which variable receives the result, whether that variable has to be
/// initialized first, and how parameters are turned into read-only C
/// operands.
///
/// Read-only resolution never writes to a declared variable. Literals and
/// scalar typed variables are boxed into temporaries; boxed variables are
/// referenced in place.
///
/// A variant target that the call also reads (`parts = explode(parts, ",")`)
/// is not written in place, since initializing it would clear the argument.
/// The result goes to a temporary and `Call::finish` copies it back.
///

use tracing::trace;

use crate::ast::{CallExpression, ParamValue, Parameter};
use crate::context::CompilationContext;
use crate::error::CompileError;
use crate::optimizer::CompiledExpression;
use crate::optimizer::escape::escape_c_string;
use crate::symbols::{VarId, VarType};

pub trait CallHandle {
    /// Binds the assignment target of the call, if any, as its destination.
    fn process_expected_return(
        &mut self,
        ctx: &mut CompilationContext<'_>,
    ) -> Result<(), CompileError>;

    /// Destination of the call. With `may_require_init` a temporary is
    /// allocated when the call is not assigned anywhere.
    fn symbol_variable(
        &mut self,
        may_require_init: bool,
        ctx: &mut CompilationContext<'_>,
    ) -> Result<VarId, CompileError>;

    fn must_init_symbol_variable(&self) -> bool;

    fn read_only_resolved_params(
        &mut self,
        params: &[Parameter],
        ctx: &mut CompilationContext<'_>,
        expr: &CallExpression,
    ) -> Result<Vec<String>, CompileError>;
}

pub struct Call<'e> {
    expr: &'e CallExpression,
    symbol: Option<VarId>,
    /// Assignment target written through a temporary.
    redirected: Option<VarId>,
    must_init: bool,
}

impl<'e> Call<'e> {
    pub fn new(expr: &'e CallExpression) -> Self {
        Self {
            expr,
            symbol: None,
            redirected: None,
            must_init: false,
        }
    }

    fn reads_variable(&self, name: &str) -> bool {
        self.expr
            .parameters
            .iter()
            .flatten()
            .any(|p| matches!(&p.value, ParamValue::Variable(v) if v == name))
    }

    /// Copies a redirected result into the assignment target. The compiled
    /// value then names the target.
    pub fn finish(
        &self,
        compiled: CompiledExpression,
        ctx: &mut CompilationContext<'_>,
    ) -> CompiledExpression {
        let (Some(target), Some(result)) = (self.redirected, self.symbol) else {
            return compiled;
        };
        let hint = ctx.symbols.get(result).dynamic_types();
        ctx.symbols.get_mut(target).set_dynamic_types(hint);

        let target = ctx.symbols.get(target);
        let copy = ctx.backend.copy_variable(target, ctx.symbols.get(result));
        ctx.code.emit(&copy);
        CompiledExpression {
            name: target.name().to_string(),
            ..compiled
        }
    }

    fn box_into_temp(
        ctx: &mut CompilationContext<'_>,
        assign: impl FnOnce(&str) -> String,
    ) -> String {
        let temp = ctx.symbols.temp_variable(VarType::Variable);
        let var = ctx.symbols.get_mut(temp);
        var.init_variant(ctx.backend, ctx.code);
        let code = ctx.backend.variable_code(var);
        ctx.code.emit(&assign(&code));
        code
    }

    fn resolve_one(
        &self,
        param: &Parameter,
        ctx: &mut CompilationContext<'_>,
    ) -> Result<String, CompileError> {
        trace!(kind = %param.kind(), call = %self.expr.name, "resolving parameter");
        let operand = match &param.value {
            ParamValue::String(s) => Self::box_into_temp(ctx, |c| {
                format!("ZVAL_STRING({}, \"{}\");", c, escape_c_string(s))
            }),
            ParamValue::Int(n) => {
                Self::box_into_temp(ctx, |c| format!("ZVAL_LONG({}, {});", c, n))
            }
            ParamValue::Double(d) => {
                Self::box_into_temp(ctx, |c| format!("ZVAL_DOUBLE({}, {:?});", c, d))
            }
            ParamValue::Bool(b) => {
                Self::box_into_temp(ctx, |c| format!("ZVAL_BOOL({}, {});", c, u8::from(*b)))
            }
            ParamValue::Null => Self::box_into_temp(ctx, |c| format!("ZVAL_NULL({});", c)),
            ParamValue::Variable(name) => {
                let id = ctx.symbols.lookup(name).ok_or_else(|| {
                    CompileError::UndefinedVariable {
                        name: name.clone(),
                        span: if param.span.is_empty() { self.expr.span } else { param.span },
                    }
                })?;
                let var = ctx.symbols.get(id);
                match var.ty() {
                    ty if ty.is_boxed() => ctx.backend.variable_code(var),
                    VarType::Int => {
                        Self::box_into_temp(ctx, |c| format!("ZVAL_LONG({}, {});", c, name))
                    }
                    VarType::Double => {
                        Self::box_into_temp(ctx, |c| format!("ZVAL_DOUBLE({}, {});", c, name))
                    }
                    _ => Self::box_into_temp(ctx, |c| format!("ZVAL_BOOL({}, {});", c, name)),
                }
            }
        };
        Ok(operand)
    }
}

impl CallHandle for Call<'_> {
    fn process_expected_return(
        &mut self,
        ctx: &mut CompilationContext<'_>,
    ) -> Result<(), CompileError> {
        let Some(name) = self.expr.assign.as_deref() else {
            return Ok(());
        };
        let id = ctx
            .symbols
            .lookup(name)
            .ok_or_else(|| CompileError::UndefinedVariable {
                name: name.to_string(),
                span: self.expr.span,
            })?;

        let var = ctx.symbols.get(id);
        let must_init = var.is_variant() && var.name() != "return_value";
        if must_init && self.reads_variable(name) {
            trace!(variable = name, call = %self.expr.name, "target is read by the call");
            self.redirected = Some(id);
            return Ok(());
        }
        self.must_init = must_init;
        self.symbol = Some(id);
        Ok(())
    }

    fn symbol_variable(
        &mut self,
        may_require_init: bool,
        ctx: &mut CompilationContext<'_>,
    ) -> Result<VarId, CompileError> {
        if let Some(id) = self.symbol {
            return Ok(id);
        }
        if !may_require_init && self.redirected.is_none() {
            return Err(CompileError::MissingDestination {
                function: self.expr.name.clone(),
                span: self.expr.span,
            });
        }

        let id = ctx.symbols.temp_variable(VarType::Variable);
        trace!(
            temp = ctx.symbols.get(id).name(),
            call = %self.expr.name,
            "allocated result temporary"
        );
        self.symbol = Some(id);
        self.must_init = true;
        Ok(id)
    }

    fn must_init_symbol_variable(&self) -> bool {
        self.must_init
    }

    fn read_only_resolved_params(
        &mut self,
        params: &[Parameter],
        ctx: &mut CompilationContext<'_>,
        _expr: &CallExpression,
    ) -> Result<Vec<String>, CompileError> {
        params.iter().map(|p| self.resolve_one(p, ctx)).collect()
    }
}
