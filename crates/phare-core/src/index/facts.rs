//! Declaration facts: the only records that cross the file boundary
//!
//! Harvested from one file's tree without any existence checks; superclass
//! and interface names are alias-resolved qualified names that may or may
//! not exist elsewhere in the project. Facts are immutable and serializable
//! so callers can cache them between runs.

use serde::{Deserialize, Serialize};

use crate::names::QualifiedName;
use crate::tree::{ClassKind, Modifier, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn from_modifiers(modifiers: &[Modifier]) -> Self {
        for modifier in modifiers {
            match modifier {
                Modifier::Private => return Visibility::Private,
                Modifier::Protected => return Visibility::Protected,
                Modifier::Public => return Visibility::Public,
                _ => {}
            }
        }
        // PHP members without a visibility keyword are public.
        Visibility::Public
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterFact {
    pub name: String,
    pub type_hint: Option<String>,
    pub has_default: bool,
    pub variadic: bool,
    pub by_ref: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodFact {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub params: Vec<ParameterFact>,
    /// Body contains a value-carrying `return` or any `yield`.
    pub has_return: bool,
    pub uses_func_get_args: bool,
    /// Matched the configured test-method heuristics.
    pub is_test: bool,
    pub has_return_type: bool,
    pub returns_void: bool,
    pub declaration: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionFact {
    pub name: QualifiedName,
    pub params: Vec<ParameterFact>,
    pub has_return: bool,
    pub uses_func_get_args: bool,
    pub has_return_type: bool,
    pub returns_void: bool,
    pub declaration: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassFact {
    pub name: QualifiedName,
    pub kind: ClassKind,
    /// Declared, alias-resolved, unchecked.
    pub superclass: Option<QualifiedName>,
    /// Implemented interfaces; for an interface fact, the extended ones.
    pub interfaces: Vec<QualifiedName>,
    pub methods: Vec<MethodFact>,
    pub declaration: Span,
}

impl ClassFact {
    /// A bare fact for a type known only by name, used for built-in and
    /// config-stubbed types.
    pub fn stub(name: QualifiedName, kind: ClassKind) -> Self {
        Self {
            name,
            kind,
            superclass: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            declaration: Span::NONE,
        }
    }

    pub fn with_superclass(mut self, superclass: QualifiedName) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn with_interface(mut self, interface: QualifiedName) -> Self {
        self.interfaces.push(interface);
        self
    }
}

/// Everything harvested from one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileFacts {
    pub classes: Vec<ClassFact>,
    pub functions: Vec<FunctionFact>,
}
