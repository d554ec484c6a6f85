///
/// Symbol Table
///
/// Compile-time records for the variables of one compilation unit. Declared
/// variables come from the surrounding function; temporaries are allocated
/// on demand while resolving parameters or when a call has no destination.
///
/// A `SymbolVariable` tracks its declared type (`Variable` is the variant
/// slot that can hold any value) and the dynamic type hint narrowed by the
/// last optimizer that wrote it. Whether a write needs an initialization
/// first is decided per call by the call handle.
///
/// Variables are addressed by `VarId` so a rule can hold on to its
/// destination while the table keeps growing with temporaries.
///

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::context::{Backend, CodeSink};
use crate::error::CompileError;
use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    Variable,
    String,
    Array,
    Int,
    Double,
    Bool,
}

impl VarType {
    /// Types stored as a boxed runtime value and addressable by reference.
    pub fn is_boxed(self) -> bool {
        matches!(self, VarType::Variable | VarType::String | VarType::Array)
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VarType::Variable => "variable",
            VarType::String => "string",
            VarType::Array => "array",
            VarType::Int => "int",
            VarType::Double => "double",
            VarType::Bool => "bool",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DynamicType {
    #[default]
    Unknown,
    Null,
    Bool,
    Int,
    Double,
    String,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(usize);

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolVariable {
    name: String,
    ty: VarType,
    dynamic_types: DynamicType,
}

impl SymbolVariable {
    pub fn new(name: impl Into<String>, ty: VarType) -> Self {
        Self {
            name: name.into(),
            ty,
            dynamic_types: DynamicType::Unknown,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> VarType {
        self.ty
    }

    pub fn is_variant(&self) -> bool {
        self.ty == VarType::Variable
    }

    pub fn dynamic_types(&self) -> DynamicType {
        self.dynamic_types
    }

    pub fn set_dynamic_types(&mut self, ty: DynamicType) {
        self.dynamic_types = ty;
    }

    /// Emits the backend's variant initialization for this variable.
    pub fn init_variant(&self, backend: &dyn Backend, code: &mut dyn CodeSink) {
        code.emit(&backend.init_variant(self));
    }
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    variables: IndexMap<String, SymbolVariable>,
    next_temp: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: &str, ty: VarType, span: Span) -> Result<VarId, CompileError> {
        if self.variables.contains_key(name) {
            return Err(CompileError::DuplicateVariable {
                name: name.to_string(),
                span,
            });
        }
        let (index, _) = self
            .variables
            .insert_full(name.to_string(), SymbolVariable::new(name, ty));
        Ok(VarId(index))
    }

    pub fn lookup(&self, name: &str) -> Option<VarId> {
        self.variables.get_index_of(name).map(VarId)
    }

    pub fn get(&self, id: VarId) -> &SymbolVariable {
        &self.variables[id.0]
    }

    pub fn get_mut(&mut self, id: VarId) -> &mut SymbolVariable {
        &mut self.variables[id.0]
    }

    /// Allocates a fresh temporary `_N`, skipping names already declared.
    pub fn temp_variable(&mut self, ty: VarType) -> VarId {
        let mut name = format!("_{}", self.next_temp);
        while self.variables.contains_key(&name) {
            self.next_temp += 1;
            name = format!("_{}", self.next_temp);
        }
        self.next_temp += 1;

        let var = SymbolVariable::new(name.clone(), ty);
        let (index, _) = self.variables.insert_full(name, var);
        VarId(index)
    }
}
