///
/// explode Optimizer Integration Tests
///
/// Drives `ExplodeOptimizer` through the public registry with a real symbol
/// table, header registry and code printer, and asserts on the emitted C.
///
/// Parameter order is (subject, delimiter, limit).
///

use callopt::ast::{CallExpression, Parameter};
use callopt::{
    CBackend, Call, CodePrinter, CompilationContext, CompileError, Compiler, Config,
    HeadersManager, OptimizerRegistry, Outcome, Span, SymbolTable, Unit, VarType,
};

struct Emitted {
    outcome: Result<Outcome, CompileError>,
    headers: Vec<String>,
    code: CodePrinter,
}

fn symbols() -> SymbolTable {
    let mut table = SymbolTable::new();
    for (name, ty) in [
        ("parts", VarType::Variable),
        ("x", VarType::Variable),
        ("n", VarType::Variable),
        ("return_value", VarType::Variable),
    ] {
        table.declare(name, ty, Span::dummy()).unwrap();
    }
    table
}

fn compile_with(mut table: SymbolTable, expr: &CallExpression) -> Emitted {
    let mut headers = HeadersManager::new();
    let mut code = CodePrinter::new();
    let mut ctx = CompilationContext::new(&mut table, &mut headers, &mut code, &CBackend);
    let mut call = Call::new(expr);
    let outcome = OptimizerRegistry::with_builtins().optimize(expr, &mut call, &mut ctx);
    Emitted {
        outcome,
        headers: headers.headers().map(str::to_string).collect(),
        code,
    }
}

fn compile(expr: &CallExpression) -> Emitted {
    compile_with(symbols(), expr)
}

fn explode(params: Vec<Parameter>) -> CallExpression {
    CallExpression::new("explode", params).assigned_to("parts")
}

#[test]
fn fewer_than_two_parameters_is_an_arity_error() {
    for params in [vec![], vec![Parameter::string("a,b,c")], vec![Parameter::variable("x")]] {
        let emitted = compile(&explode(params));
        match emitted.outcome {
            Err(CompileError::Arity { function, .. }) => assert_eq!(function, "explode"),
            other => panic!("expected arity error, got {:?}", other),
        }
        assert!(emitted.code.lines().is_empty());
        assert!(emitted.headers.is_empty());
    }
}

#[test]
fn arity_error_message() {
    let emitted = compile(&explode(vec![Parameter::variable("x")]));
    let err = emitted.outcome.unwrap_err();
    assert_eq!(err.to_string(), "'explode' requires two parameters");
}

#[test]
fn fixed_type_destination_is_rejected() {
    for ty in [VarType::String, VarType::Array, VarType::Int, VarType::Double, VarType::Bool] {
        let mut table = symbols();
        table.declare("fixed", ty, Span::dummy()).unwrap();
        let expr = CallExpression::new(
            "explode",
            vec![Parameter::variable("x"), Parameter::string(",")],
        )
        .assigned_to("fixed");

        let emitted = compile_with(table, &expr);
        assert!(
            matches!(
                emitted.outcome,
                Err(CompileError::IncompatibleDestination { ty: found, .. }) if found == ty
            ),
            "destination of type {} must be rejected",
            ty
        );
        assert!(emitted.code.lines().is_empty());
    }
}

#[test]
fn literal_subject_delimiter_and_limit() {
    let emitted = compile(&explode(vec![
        Parameter::string("a,b,c"),
        Parameter::string(","),
        Parameter::int(2),
    ]));

    let compiled = emitted.outcome.unwrap().compiled().unwrap();
    assert_eq!(compiled.name, "parts");
    insta::assert_snapshot!(emitted.code.output(), @r#"
INIT_VAR(&_0);
ZVAL_STRING(&_0, ",");
INIT_VAR(&parts);
fast_explode_literal(&parts, "a,b,c", 5, &_0, 2);
"#);
    assert_eq!(emitted.headers, vec!["kernel/string"]);
}

#[test]
fn literal_subject_without_limit_is_unbounded() {
    let emitted = compile(&explode(vec![Parameter::string("a,b,c"), Parameter::string(",")]));

    assert!(emitted.outcome.is_ok());
    assert_eq!(
        emitted.code.last(),
        Some("fast_explode_literal(&parts, \"a,b,c\", 5, &_0, LONG_MAX);")
    );
}

#[test]
fn runtime_subject_uses_generic_form() {
    let emitted = compile(&explode(vec![Parameter::variable("x"), Parameter::string(",")]));

    assert!(emitted.outcome.is_ok());
    assert_eq!(emitted.code.last(), Some("fast_explode(&parts, &x, &_0, LONG_MAX);"));
    assert!(
        emitted
            .code
            .lines()
            .iter()
            .all(|line| !line.contains("fast_explode_literal"))
    );
}

#[test]
fn runtime_subject_and_limit() {
    let emitted = compile(&explode(vec![
        Parameter::variable("x"),
        Parameter::string(","),
        Parameter::variable("n"),
    ]));

    assert!(emitted.outcome.is_ok());
    assert_eq!(
        emitted.code.last(),
        Some("fast_explode(&parts, &x, &_0, coerce_to_int(&n));")
    );
    assert_eq!(emitted.headers, vec!["kernel/operators", "kernel/string"]);
}

#[test]
fn literal_limit_does_not_need_operators_kernel() {
    let emitted = compile(&explode(vec![
        Parameter::variable("x"),
        Parameter::string(","),
        Parameter::int(10),
    ]));

    assert_eq!(emitted.code.last(), Some("fast_explode(&parts, &x, &_0, 10);"));
    assert_eq!(emitted.headers, vec!["kernel/string"]);
}

#[test]
fn same_call_compiles_to_same_code() {
    let expr = explode(vec![
        Parameter::string("x\ty"),
        Parameter::variable("x"),
        Parameter::variable("n"),
    ]);

    let first = compile(&expr);
    let second = compile(&expr);
    assert_eq!(first.code.output(), second.code.output());
    assert_eq!(first.headers, second.headers);
    assert_eq!(first.outcome, second.outcome);
}

#[test]
fn caller_parameters_are_not_mutated() {
    let expr = explode(vec![
        Parameter::string("a,b,c"),
        Parameter::string(","),
        Parameter::int(2),
    ]);
    let before = expr.clone();

    let compiled = compile(&expr).outcome.unwrap().compiled().unwrap();
    assert_eq!(expr, before);
    assert_eq!(compiled.source, before);
}

#[test]
fn literal_subject_is_escaped() {
    let emitted = compile(&explode(vec![
        Parameter::string("say \"hi\"\\\n"),
        Parameter::variable("x"),
    ]));

    assert_eq!(
        emitted.code.last(),
        Some(r#"fast_explode_literal(&parts, "say \"hi\"\\\n", 10, &x, LONG_MAX);"#)
    );
}

#[test]
fn missing_parameter_list_declines() {
    let mut expr = explode(vec![]);
    expr.parameters = None;

    let emitted = compile(&expr);
    assert_eq!(emitted.outcome, Ok(Outcome::Declined));
    assert!(emitted.code.lines().is_empty());
    assert!(emitted.headers.is_empty());
}

#[test]
fn return_value_is_not_reinitialized() {
    let expr = CallExpression::new(
        "explode",
        vec![Parameter::variable("x"), Parameter::variable("n")],
    )
    .assigned_to("return_value");

    let emitted = compile(&expr);
    assert_eq!(emitted.code.lines(), &["fast_explode(return_value, &x, &n, LONG_MAX);"]);
}

#[test]
fn undeclared_destination() {
    let expr = CallExpression::new(
        "explode",
        vec![Parameter::variable("x"), Parameter::string(",")],
    )
    .assigned_to("nowhere")
    .with_span(Span::new(12, 40, 0));

    let err = compile(&expr).outcome.unwrap_err();
    assert_eq!(
        err,
        CompileError::UndefinedVariable {
            name: "nowhere".to_string(),
            span: Span::new(12, 40, 0),
        }
    );
}

#[test]
fn subject_that_is_also_the_destination() {
    let unit = Unit::from_json(
        r#"{
            "variables": [{ "name": "parts", "type": "variable" }],
            "calls": [{
                "name": "explode",
                "assign": "parts",
                "parameters": [
                    { "type": "variable", "value": "parts" },
                    { "type": "string", "value": "," }
                ]
            }]
        }"#,
    )
    .unwrap();
    let mut config = Config::default();
    config.output.indent = 0;

    let compiled = Compiler::new(&config).compile_unit(&unit).unwrap();
    insta::assert_snapshot!(compiled.render(false), @r#"
INIT_VAR(&_1);
ZVAL_STRING(&_1, ",");
INIT_VAR(&_0);
fast_explode(&_0, &parts, &_1, LONG_MAX);
ZVAL_COPY(&parts, &_0);
"#);
    assert!(!compiled.code.lines().iter().any(|line| line == "INIT_VAR(&parts);"));
}
