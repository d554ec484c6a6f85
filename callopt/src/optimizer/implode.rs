///
/// implode(glue, pieces)
///
/// Lowers array joining to `fast_join_literal(dest, "glue", len, pieces);`
/// when the glue is a string literal and `fast_join(dest, glue, pieces);`
/// otherwise.
///

use super::escape::FoldedLiteral;
use super::{
    CompiledExpression, Optimizer, Outcome, require_variant_destination, resolve_unfolded,
};
use crate::ast::CallExpression;
use crate::call::CallHandle;
use crate::context::CompilationContext;
use crate::error::CompileError;
use crate::symbols::DynamicType;

const GLUE: usize = 0;
const PIECES: usize = 1;

pub struct ImplodeOptimizer;

impl Optimizer for ImplodeOptimizer {
    fn optimize(
        &self,
        expr: &CallExpression,
        call: &mut dyn CallHandle,
        ctx: &mut CompilationContext<'_>,
    ) -> Result<Outcome, CompileError> {
        let Some(params) = expr.parameters.as_deref() else {
            return Ok(Outcome::Declined);
        };
        if params.len() != 2 {
            return Err(CompileError::arity(
                "implode",
                "requires two parameters",
                params.len(),
                expr.span,
            ));
        }

        call.process_expected_return(ctx)?;
        let dest = call.symbol_variable(true, ctx)?;
        require_variant_destination(ctx, dest, expr)?;

        let literal_glue = params[GLUE].as_literal_string().map(FoldedLiteral::new);
        let folded: &[usize] = if literal_glue.is_some() { &[GLUE] } else { &[] };
        let resolved = resolve_unfolded(params, folded, expr, call, ctx)?;
        let pieces = resolved.require(PIECES, expr)?;

        ctx.headers.add_dependency("kernel/string");

        let var = ctx.symbols.get_mut(dest);
        var.set_dynamic_types(DynamicType::String);
        if call.must_init_symbol_variable() {
            var.init_variant(ctx.backend, ctx.code);
        }
        let symbol = ctx.backend.variable_code(var);
        let name = var.name().to_string();

        let instruction = match &literal_glue {
            Some(glue) => format!(
                "fast_join_literal({}, {}, {});",
                symbol,
                glue.arguments(),
                pieces
            ),
            None => format!(
                "fast_join({}, {}, {});",
                symbol,
                resolved.require(GLUE, expr)?,
                pieces
            ),
        };
        ctx.code.emit(&instruction);

        Ok(Outcome::Compiled(CompiledExpression::variable(name, expr)))
    }
}
