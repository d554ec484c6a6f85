///
/// explode(subject, delimiter [, limit])
///
/// Lowers string splitting to the runtime's fast explode kernels:
///
/// - `fast_explode_literal(dest, "text", len, delimiter, limit);` when the
///   subject is a string literal known at compile time
/// - `fast_explode(dest, subject, delimiter, limit);` otherwise
///
/// The limit is folded as an integer token when it is a literal, coerced
/// with `coerce_to_int` when it is a runtime value, and `LONG_MAX` when it
/// is omitted. Folding is decided per argument: a literal subject with a
/// runtime limit still uses the literal form. Parameters past the limit are
/// ignored and never resolved.
///

use tracing::{debug, trace};

use super::escape::FoldedLiteral;
use super::{
    CompiledExpression, Optimizer, Outcome, require_variant_destination, resolve_unfolded,
};
use crate::ast::{CallExpression, Parameter};
use crate::call::CallHandle;
use crate::context::CompilationContext;
use crate::error::CompileError;
use crate::symbols::DynamicType;

const SUBJECT: usize = 0;
const DELIMITER: usize = 1;
const LIMIT: usize = 2;

pub const UNBOUNDED_LIMIT: &str = "LONG_MAX";

pub struct ExplodeOptimizer;

impl Optimizer for ExplodeOptimizer {
    fn optimize(
        &self,
        expr: &CallExpression,
        call: &mut dyn CallHandle,
        ctx: &mut CompilationContext<'_>,
    ) -> Result<Outcome, CompileError> {
        let Some(params) = expr.parameters.as_deref() else {
            return Ok(Outcome::Declined);
        };
        if params.len() < 2 {
            return Err(CompileError::arity(
                "explode",
                "requires two parameters",
                params.len(),
                expr.span,
            ));
        }

        call.process_expected_return(ctx)?;
        let dest = call.symbol_variable(true, ctx)?;
        require_variant_destination(ctx, dest, expr)?;

        let mut folded: Vec<usize> = (LIMIT + 1..params.len()).collect();
        if !folded.is_empty() {
            debug!(extra = folded.len(), "explode ignores parameters past the limit");
        }

        let literal_limit = params.get(LIMIT).and_then(Parameter::as_literal_int);
        if literal_limit.is_some() {
            folded.push(LIMIT);
        }

        let literal_subject = params[SUBJECT].as_literal_string().map(FoldedLiteral::new);
        if literal_subject.is_some() {
            folded.push(SUBJECT);
        }
        trace!(
            ?literal_limit,
            literal_subject = literal_subject.is_some(),
            "explode folding"
        );

        let resolved = resolve_unfolded(params, &folded, expr, call, ctx)?;
        let delimiter = resolved.require(DELIMITER, expr)?;
        let subject = match &literal_subject {
            Some(literal) => literal.arguments(),
            None => resolved.require(SUBJECT, expr)?.to_string(),
        };

        let limit = match (literal_limit, resolved.at(LIMIT)) {
            (Some(n), _) => n.to_string(),
            (None, Some(operand)) => {
                ctx.headers.add_dependency("kernel/operators");
                format!("coerce_to_int({})", operand)
            }
            (None, None) => UNBOUNDED_LIMIT.to_string(),
        };
        ctx.headers.add_dependency("kernel/string");

        let var = ctx.symbols.get_mut(dest);
        var.set_dynamic_types(DynamicType::Array);
        if call.must_init_symbol_variable() {
            var.init_variant(ctx.backend, ctx.code);
        }
        let symbol = ctx.backend.variable_code(var);
        let name = var.name().to_string();

        let kernel = if literal_subject.is_some() {
            "fast_explode_literal"
        } else {
            "fast_explode"
        };
        ctx.code.emit(&format!(
            "{}({}, {}, {}, {});",
            kernel, symbol, subject, delimiter, limit
        ));

        Ok(Outcome::Compiled(CompiledExpression::variable(name, expr)))
    }
}
