///
/// callopt - Builtin Call Optimizer
///
/// Lowers calls to registered builtin runtime functions into specialized C
/// instructions chosen from the static shape of their arguments, and falls
/// back to generic runtime dispatch when no specialization applies.
///
/// - source: Spans and source files for error locations
/// - ast: Call expression model
/// - symbols: Symbol table, variables and temporaries
/// - context: Dependency registry, code sink and C backend
/// - call: Call handle and read-only parameter resolution
/// - optimizer: Optimizer contract, registry and builtin rules
/// - driver: Unit compilation with generic-call fallback
/// - config: callopt.toml
/// - diagnostic: miette error reports
///
/// Entry points:
/// - `Compiler::compile_unit`: Compile a unit of calls
/// - `OptimizerRegistry::optimize`: Run the rule registered for one call
///

pub mod ast;
pub mod call;
pub mod config;
pub mod context;
pub mod diagnostic;
pub mod driver;
pub mod error;
pub mod optimizer;
pub mod source;
pub mod symbols;

pub use ast::{CallExpression, ParamValue, Parameter, ParameterKind};
pub use call::{Call, CallHandle};
pub use config::Config;
pub use context::{CBackend, CodePrinter, CompilationContext, HeadersManager};
pub use diagnostic::DiagnosticReporter;
pub use driver::{CompiledUnit, Compiler, Unit};
pub use error::CompileError;
pub use optimizer::{CompiledExpression, Optimizer, OptimizerRegistry, Outcome};
pub use source::{SourceFile, Span};
pub use symbols::{DynamicType, SymbolTable, SymbolVariable, VarType};
