///
/// Builtin Call Optimizer Registry
///
/// Every builtin with a specialized lowering implements `Optimizer`. Rules
/// are looked up by function name; a rule inspects the call's parameters and
/// either emits a specialized instruction (`Outcome::Compiled`), declines so
/// the caller falls back to a generic call (`Outcome::Declined`), or rejects
/// a call that is malformed for that builtin (`Err`).
///
/// Registered builtins:
/// - explode: split a string by a delimiter into an array
/// - implode: join array elements with a glue string
///
/// New rules are added to `builtin_optimizers` without touching the driver.
///

pub mod escape;
pub mod explode;
pub mod implode;

use indexmap::IndexMap;
use tracing::debug;

use crate::ast::{CallExpression, Parameter};
use crate::call::CallHandle;
use crate::config::OptimizerConfig;
use crate::context::CompilationContext;
use crate::error::CompileError;
use crate::symbols::VarId;

pub use explode::ExplodeOptimizer;
pub use implode::ImplodeOptimizer;

pub trait Optimizer: Send + Sync {
    fn optimize(
        &self,
        expr: &CallExpression,
        call: &mut dyn CallHandle,
        ctx: &mut CompilationContext<'_>,
    ) -> Result<Outcome, CompileError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Compiled(CompiledExpression),
    /// The rule does not apply to this shape of call.
    Declined,
}

impl Outcome {
    pub fn compiled(self) -> Option<CompiledExpression> {
        match self {
            Outcome::Compiled(expr) => Some(expr),
            Outcome::Declined => None,
        }
    }

    pub fn is_declined(&self) -> bool {
        matches!(self, Outcome::Declined)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprKind {
    Variable,
}

/// Result of a specialized call: the variable holding the value.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    pub kind: ExprKind,
    pub name: String,
    pub source: CallExpression,
}

impl CompiledExpression {
    pub fn variable(name: impl Into<String>, source: &CallExpression) -> Self {
        Self {
            kind: ExprKind::Variable,
            name: name.into(),
            source: source.clone(),
        }
    }
}

/// Registry entry for a builtin optimizer
pub struct BuiltinOptimizer {
    pub name: &'static str,
    pub optimizer: &'static dyn Optimizer,
}

/// Get the builtin optimizer table
/// Add new builtin rules here
pub fn builtin_optimizers() -> &'static [BuiltinOptimizer] {
    static REGISTRY: &[BuiltinOptimizer] = &[
        BuiltinOptimizer {
            name: "explode",
            optimizer: &ExplodeOptimizer,
        },
        BuiltinOptimizer {
            name: "implode",
            optimizer: &ImplodeOptimizer,
        },
    ];
    REGISTRY
}

/// Name-keyed set of active rules for one compilation.
pub struct OptimizerRegistry {
    rules: IndexMap<String, &'static dyn Optimizer>,
}

impl OptimizerRegistry {
    pub fn empty() -> Self {
        Self {
            rules: IndexMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for builtin in builtin_optimizers() {
            registry.register(builtin.name, builtin.optimizer);
        }
        registry
    }

    /// Builtins minus the rules the configuration disables.
    pub fn from_config(config: &OptimizerConfig) -> Self {
        let mut registry = Self::with_builtins();
        for name in &config.disabled {
            if registry.rules.shift_remove(name.as_str()).is_some() {
                debug!(rule = %name, "optimizer disabled by configuration");
            }
        }
        registry
    }

    pub fn register(&mut self, name: &str, optimizer: &'static dyn Optimizer) {
        self.rules.insert(name.to_string(), optimizer);
    }

    pub fn lookup(&self, name: &str) -> Option<&'static dyn Optimizer> {
        self.rules.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Runs the rule registered for the call's name. Unregistered names
    /// decline.
    pub fn optimize(
        &self,
        expr: &CallExpression,
        call: &mut dyn CallHandle,
        ctx: &mut CompilationContext<'_>,
    ) -> Result<Outcome, CompileError> {
        let Some(optimizer) = self.lookup(&expr.name) else {
            debug!(function = %expr.name, "no optimizer registered");
            return Ok(Outcome::Declined);
        };
        let outcome = optimizer.optimize(expr, call, ctx)?;
        debug!(function = %expr.name, declined = outcome.is_declined(), "optimizer finished");
        Ok(outcome)
    }
}

impl Default for OptimizerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Rejects destinations that cannot hold a dynamically typed result.
pub(crate) fn require_variant_destination(
    ctx: &CompilationContext<'_>,
    dest: VarId,
    expr: &CallExpression,
) -> Result<(), CompileError> {
    let var = ctx.symbols.get(dest);
    if var.is_variant() {
        return Ok(());
    }
    Err(CompileError::IncompatibleDestination {
        name: var.name().to_string(),
        ty: var.ty(),
        span: expr.span,
    })
}

/// Read-only operands of the parameters that were not folded, keyed by the
/// position each parameter had in the call.
#[derive(Debug, Default)]
pub(crate) struct ResolvedParams {
    operands: Vec<(usize, String)>,
}

impl ResolvedParams {
    pub(crate) fn at(&self, position: usize) -> Option<&str> {
        self.operands
            .iter()
            .find(|(p, _)| *p == position)
            .map(|(_, op)| op.as_str())
    }

    /// Operand a rule cannot do without. A missing position means the call
    /// is shorter than the rule reads.
    pub(crate) fn require(
        &self,
        position: usize,
        expr: &CallExpression,
    ) -> Result<&str, CompileError> {
        self.at(position).ok_or_else(|| {
            CompileError::arity(
                &expr.name,
                &format!("requires parameter {}", position + 1),
                expr.parameter_count(),
                expr.span,
            )
        })
    }
}

/// Resolves every parameter whose position is not in `folded`, in call order.
pub(crate) fn resolve_unfolded(
    params: &[Parameter],
    folded: &[usize],
    expr: &CallExpression,
    call: &mut dyn CallHandle,
    ctx: &mut CompilationContext<'_>,
) -> Result<ResolvedParams, CompileError> {
    let (positions, pending): (Vec<usize>, Vec<Parameter>) = params
        .iter()
        .enumerate()
        .filter(|(i, _)| !folded.contains(i))
        .map(|(i, p)| (i, p.clone()))
        .unzip();

    let operands = call.read_only_resolved_params(&pending, ctx, expr)?;
    Ok(ResolvedParams {
        operands: positions.into_iter().zip(operands).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Parameter;
    use crate::call::Call;
    use crate::context::{CBackend, CodePrinter, HeadersManager};
    use crate::symbols::SymbolTable;

    #[test]
    fn test_builtin_table_is_registered() {
        let registry = OptimizerRegistry::default();
        for builtin in builtin_optimizers() {
            assert!(registry.lookup(builtin.name).is_some());
        }
        assert!(registry.lookup("str_replace").is_none());
    }

    #[test]
    fn test_registry_from_config_drops_disabled() {
        let config = OptimizerConfig {
            disabled: vec!["implode".to_string(), "unknown".to_string()],
        };
        let registry = OptimizerRegistry::from_config(&config);
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["explode"]);
        assert!(registry.lookup("implode").is_none());
    }

    #[test]
    fn test_unregistered_name_declines() {
        let expr = CallExpression::new("strtoupper", vec![Parameter::string("a")]);
        let mut table = SymbolTable::new();
        let mut headers = HeadersManager::new();
        let mut code = CodePrinter::new();
        let mut ctx = CompilationContext::new(&mut table, &mut headers, &mut code, &CBackend);
        let mut call = Call::new(&expr);

        let outcome = OptimizerRegistry::with_builtins()
            .optimize(&expr, &mut call, &mut ctx)
            .unwrap();
        assert!(outcome.is_declined());
        assert!(code.lines().is_empty());
    }

    #[test]
    fn test_resolve_unfolded_keeps_positions() {
        let params = vec![
            Parameter::string("a,b"),
            Parameter::string(","),
            Parameter::int(4),
        ];
        let expr = CallExpression::new("explode", params.clone());
        let mut table = SymbolTable::new();
        let mut headers = HeadersManager::new();
        let mut code = CodePrinter::new();
        let mut ctx = CompilationContext::new(&mut table, &mut headers, &mut code, &CBackend);
        let mut call = Call::new(&expr);

        let resolved = resolve_unfolded(&params, &[0], &expr, &mut call, &mut ctx).unwrap();
        assert_eq!(resolved.at(0), None);
        assert_eq!(resolved.at(1), Some("&_0"));
        assert_eq!(resolved.at(2), Some("&_1"));
        assert_eq!(resolved.require(1, &expr), Ok("&_0"));

        let err = resolved.require(0, &expr).unwrap_err();
        assert_eq!(err.to_string(), "'explode' requires parameter 1");
    }
}
