//! Boundary with the source-language symbol model.
//!
//! The engine never parses source itself. It reads declaration facts through the
//! [`SourceModel`] trait and refers to declarations only by [`DeclId`] handles,
//! so index values and elements never hold pointers into the model.
//!
//! [`ProjectModel`] is an in-memory implementation loaded from JSON facts, used
//! by the CLI and the tests.

pub mod declaration;
pub mod project;
pub mod types;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub use declaration::{Annotation, AnnotationValue, Declaration, DeclarationKind, Qualifier};
pub use project::{ClassFacts, FileFacts, MemberFacts, ParameterFacts, ProjectFacts, ProjectModel};
pub use types::{ClassId, TypeRef};

/// Opaque handle to a declaration owned by a [`SourceModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclId(pub u32);

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Visibility boundary threaded through index reads and re-resolution.
///
/// The engine passes it along untouched; only the source model and the index
/// store interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scope {
    files: Option<BTreeSet<String>>,
}

impl Scope {
    /// Everything in the project
    pub fn project() -> Self {
        Self { files: None }
    }

    /// Only the given source files
    pub fn files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: Some(files.into_iter().map(Into::into).collect()),
        }
    }

    /// True if `file` is visible in this scope
    pub fn contains(&self, file: &str) -> bool {
        self.files.as_ref().is_none_or(|files| files.contains(file))
    }
}

/// A source file known to the model, with a hash of its current content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub hash: String,
}

/// Read-only access to declaration facts.
pub trait SourceModel: Send + Sync {
    /// Facts for a declaration handle
    fn declaration(&self, id: DeclId) -> Option<&Declaration>;

    /// All source files with their content hashes
    fn files(&self) -> Vec<SourceFile>;

    /// Declarations in a file, in source order (classes before their members)
    fn declarations_in_file(&self, path: &str) -> Vec<DeclId>;

    /// Classes with the given qualified name visible in `scope`. Zero, one or
    /// several (duplicate definitions) may be returned.
    fn find_classes(&self, qualified_name: &str, scope: &Scope) -> Vec<DeclId>;

    /// Methods, fields and nested classes declared directly in `class`
    fn members(&self, class: DeclId) -> Vec<DeclId>;

    /// Simple names of type aliases visible in `scope` whose target is the
    /// class `qualified_name`
    fn type_aliases(&self, qualified_name: &str, scope: &Scope) -> Vec<String>;
}
