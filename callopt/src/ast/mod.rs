///
/// Call Expression Model
///
/// The slice of the AST the optimizer consumes: a call to a named function
/// with an ordered parameter list. Parameters are tagged with their static
/// kind so a rule can tell compile-time literals from runtime expressions.
///
/// The parameter list is optional. A call whose list is missing has not
/// been shaped by the front end and every rule declines it.
///
/// JSON form (as written by the front end):
///
/// ```json
/// {
///   "name": "explode",
///   "assign": "parts",
///   "parameters": [
///     { "type": "string", "value": "a,b,c" },
///     { "type": "variable", "value": "sep" },
///     { "type": "int", "value": 2 }
///   ]
/// }
/// ```
///

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::source::{Span, Spanned};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpression {
    pub name: String,
    #[serde(default)]
    pub parameters: Option<Vec<Parameter>>,
    /// Variable the result is assigned to, if the call is the right-hand
    /// side of an assignment.
    #[serde(default)]
    pub assign: Option<String>,
    #[serde(default)]
    pub span: Span,
}

impl CallExpression {
    pub fn new(name: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        Self {
            name: name.into(),
            parameters: Some(parameters),
            assign: None,
            span: Span::dummy(),
        }
    }

    pub fn assigned_to(mut self, name: impl Into<String>) -> Self {
        self.assign = Some(name.into());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.as_ref().map_or(0, Vec::len)
    }
}

impl Spanned for CallExpression {
    fn span(&self) -> Span {
        self.span
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(flatten)]
    pub value: ParamValue,
    #[serde(default)]
    pub span: Span,
}

impl Parameter {
    pub fn new(value: ParamValue) -> Self {
        Self {
            value,
            span: Span::dummy(),
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::new(ParamValue::String(s.into()))
    }

    pub fn int(n: i64) -> Self {
        Self::new(ParamValue::Int(n))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(ParamValue::Variable(name.into()))
    }

    pub fn kind(&self) -> ParameterKind {
        self.value.kind()
    }

    pub fn as_literal_string(&self) -> Option<&str> {
        match &self.value {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_literal_int(&self) -> Option<i64> {
        match self.value {
            ParamValue::Int(n) => Some(n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ParamValue {
    String(String),
    Int(i64),
    Double(f64),
    Bool(bool),
    Null,
    Variable(String),
}

impl ParamValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            ParamValue::String(_) => ParameterKind::String,
            ParamValue::Int(_) => ParameterKind::Int,
            ParamValue::Double(_) => ParameterKind::Double,
            ParamValue::Bool(_) => ParameterKind::Bool,
            ParamValue::Null => ParameterKind::Null,
            ParamValue::Variable(_) => ParameterKind::Variable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    String,
    Int,
    Double,
    Bool,
    Null,
    Variable,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterKind::String => "string",
            ParameterKind::Int => "int",
            ParameterKind::Double => "double",
            ParameterKind::Bool => "bool",
            ParameterKind::Null => "null",
            ParameterKind::Variable => "variable",
        };
        f.write_str(name)
    }
}
