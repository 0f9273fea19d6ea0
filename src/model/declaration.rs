//! Read-only facts about a single source declaration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::{ClassId, TypeRef};
use super::DeclId;

/// Kind of source declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    /// Class, interface, object or companion object
    Class,
    /// Method or constructor
    Method,
    /// Field or Kotlin property
    Field,
    /// Method or constructor parameter
    Parameter,
}

impl DeclarationKind {
    /// All kinds, in indexing order
    pub const ALL: [DeclarationKind; 4] = [
        DeclarationKind::Class,
        DeclarationKind::Method,
        DeclarationKind::Field,
        DeclarationKind::Parameter,
    ];

    /// Get a human-readable display name for this kind
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Method => "method",
            Self::Field => "field",
            Self::Parameter => "parameter",
        }
    }
}

/// Value of an annotation attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationValue {
    /// String literal
    String(String),
    /// Class literal, by qualified name
    Class(String),
    /// Array initializer
    Array(Vec<AnnotationValue>),
    /// Anything else, as source text
    Other(String),
}

impl AnnotationValue {
    /// Qualified names of class literals, flattening a single level of array
    pub fn class_names(&self) -> Vec<&str> {
        match self {
            AnnotationValue::Class(name) => vec![name.as_str()],
            AnnotationValue::Array(values) => values
                .iter()
                .filter_map(|v| match v {
                    AnnotationValue::Class(name) => Some(name.as_str()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// An annotation applied to a declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Annotation {
    /// Qualified annotation name
    pub name: String,
    /// True if the annotation class is itself annotated `@Qualifier`
    #[serde(default)]
    pub qualifier: bool,
    /// Named attributes (`value` for the single unnamed attribute)
    #[serde(default)]
    pub args: BTreeMap<String, AnnotationValue>,
}

impl Annotation {
    /// A marker annotation without attributes
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qualifier: false,
            args: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_arg(mut self, key: impl Into<String>, value: AnnotationValue) -> Self {
        self.args.insert(key.into(), value);
        self
    }

    /// Builder-style qualifier flag
    pub fn as_qualifier(mut self) -> Self {
        self.qualifier = true;
        self
    }

    /// Qualified names of the class literals in attribute `attr`
    pub fn classes_in(&self, attr: &str) -> Vec<&str> {
        self.args
            .get(attr)
            .map(|v| v.class_names())
            .unwrap_or_default()
    }
}

/// Qualifier of a binding: the single `@Qualifier`-meta-annotated annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Qualifier {
    pub name: String,
    pub args: BTreeMap<String, AnnotationValue>,
}

impl Qualifier {
    /// Qualifier of an annotation list. Zero or several qualifier annotations
    /// both mean "unqualified".
    pub fn from_annotations(annotations: &[Annotation]) -> Option<Self> {
        let mut qualifiers = annotations.iter().filter(|a| a.qualifier);
        let first = qualifiers.next()?;
        if qualifiers.next().is_some() {
            return None;
        }
        Some(Self {
            name: first.name.clone(),
            args: first.args.clone(),
        })
    }
}

/// Facts about one declaration, owned by the source model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub simple_name: String,
    /// Canonical type: the class itself, a method's return type, a field's or
    /// parameter's type. `None` when the type cannot be resolved; constructors
    /// also have no declared type.
    pub declared_type: Option<TypeRef>,
    /// Simple name of the type alias the source wrote instead of the canonical type
    pub type_alias: Option<String>,
    /// Class for members, method for parameters, outer class for nested classes
    pub container: Option<DeclId>,
    pub annotations: Vec<Annotation>,
    /// Parameters, in order (methods only)
    pub parameters: Vec<DeclId>,
    pub is_constructor: bool,
    /// Set for classes only
    pub class_id: Option<ClassId>,
    /// Kotlin companion object
    pub is_companion: bool,
    /// Source file the declaration lives in
    pub file: String,
}

impl Declaration {
    /// True if an annotation with the qualified `name` is present
    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a.name == name)
    }

    /// True if any of the named annotations is present
    pub fn has_any_annotation(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.has_annotation(name))
    }

    /// Find an annotation by qualified name
    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }

    /// Qualifier of this declaration, if exactly one is present
    pub fn qualifier(&self) -> Option<Qualifier> {
        Qualifier::from_annotations(&self.annotations)
    }

    /// Reverse-index key for the declared type, honouring the alias the source
    /// spelled. `None` when the type is unresolved.
    pub fn type_key(&self) -> Option<String> {
        let ty = self.declared_type.as_ref()?;
        Some(match &self.type_alias {
            Some(alias) => alias.clone(),
            None => ty.index_key(),
        })
    }
}
