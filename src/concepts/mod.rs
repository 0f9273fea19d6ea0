//! Dependency-injection concepts.
//!
//! A concept describes one Dagger pattern. It contributes indexers (which
//! emit `(key, IndexValue)` pairs for a declaration), decoders (one per data
//! type tag it owns), and identifiers (which turn a declaration into an
//! [`Element`]). Concepts only inspect their own annotations and never carry
//! state, so running them twice or in any combination is safe.
//!
//! The closed list of built-in concepts is composed once by
//! [`ConceptRegistry`].

pub mod assisted;
pub mod binds_instance;
pub mod binds_optional_of;
pub mod component;
pub mod entry_point;
pub mod injected_constructor;
pub mod injected_field;
pub mod provides_method;
pub mod provision_method;
pub mod registry;

pub use registry::ConceptRegistry;

use crate::element::Element;
use crate::error::CodecError;
use crate::index::{DataType, IndexValue, RecordReader};
use crate::model::{ClassId, DeclId, Declaration, DeclarationKind, SourceModel, TypeRef};

/// Qualified names of the annotations the concepts react to
pub mod annotations {
    pub const INJECT: &[&str] = &[
        "javax.inject.Inject",
        "jakarta.inject.Inject",
        "androidx.hilt.lifecycle.ViewModelInject",
        "androidx.hilt.work.WorkerInject",
    ];
    /// Field injection only accepts the plain `@Inject` annotations
    pub const FIELD_INJECT: &[&str] = &["javax.inject.Inject", "jakarta.inject.Inject"];
    pub const MODULE: &str = "dagger.Module";
    pub const PROVIDES: &str = "dagger.Provides";
    pub const BINDS: &str = "dagger.Binds";
    pub const BINDS_OPTIONAL_OF: &str = "dagger.BindsOptionalOf";
    pub const BINDS_INSTANCE: &str = "dagger.BindsInstance";
    pub const COMPONENT: &str = "dagger.Component";
    pub const SUBCOMPONENT: &str = "dagger.Subcomponent";
    pub const ENTRY_POINT: &str = "dagger.hilt.EntryPoint";
    pub const ASSISTED_INJECT: &str = "dagger.assisted.AssistedInject";
    pub const ASSISTED_FACTORY: &str = "dagger.assisted.AssistedFactory";
    pub const ASSISTED: &str = "dagger.assisted.Assisted";
    /// Nested builder and factory annotations of components and subcomponents
    pub const COMPONENT_CREATORS: &[&str] = &[
        "dagger.Component.Builder",
        "dagger.Component.Factory",
        "dagger.Subcomponent.Builder",
        "dagger.Subcomponent.Factory",
    ];

    pub const ATTR_MODULES: &str = "modules";
    pub const ATTR_DEPENDENCIES: &str = "dependencies";
    pub const ATTR_INCLUDES: &str = "includes";
    pub const ATTR_SUBCOMPONENTS: &str = "subcomponents";
}

/// Sink for the `(key, value)` pairs an indexer emits
pub type Entries = Vec<(String, IndexValue)>;

pub type Indexer = fn(&DeclarationView<'_>, &mut Entries);
pub type Identifier = fn(&DeclarationView<'_>) -> Option<Element>;
pub type Decoder = fn(&mut RecordReader<'_>) -> Result<IndexValue, CodecError>;

/// One dependency-injection pattern
pub trait Concept: Send + Sync {
    /// Short name used in logs and registry errors
    fn name(&self) -> &'static str;

    /// Indexers, keyed by the declaration kind they inspect
    fn indexers(&self) -> &'static [(DeclarationKind, Indexer)];

    /// Decoders for the data types this concept owns
    fn decoders(&self) -> &'static [(DataType, Decoder)];

    /// Element identifiers, keyed by declaration kind
    fn identifiers(&self) -> &'static [(DeclarationKind, Identifier)];
}

/// A declaration together with the model it lives in
#[derive(Clone, Copy)]
pub struct DeclarationView<'a> {
    pub model: &'a dyn SourceModel,
    pub id: DeclId,
    pub decl: &'a Declaration,
}

impl<'a> DeclarationView<'a> {
    pub fn new(model: &'a dyn SourceModel, id: DeclId) -> Option<Self> {
        let decl = model.declaration(id)?;
        Some(Self { model, id, decl })
    }

    pub fn kind(&self) -> DeclarationKind {
        self.decl.kind
    }

    /// Class for members, method for parameters, outer class for classes
    pub fn container(&self) -> Option<DeclarationView<'a>> {
        Self::new(self.model, self.decl.container?)
    }

    /// Nearest enclosing class (for a parameter, its method's class)
    pub fn containing_class(&self) -> Option<DeclarationView<'a>> {
        let mut current = self.container()?;
        while current.kind() != DeclarationKind::Class {
            current = current.container()?;
        }
        Some(current)
    }

    /// Id of the nearest enclosing class
    pub fn containing_class_id(&self) -> Option<ClassId> {
        self.containing_class()?.decl.class_id.clone()
    }

    pub fn parameters(&self) -> Vec<DeclarationView<'a>> {
        self.decl
            .parameters
            .iter()
            .filter_map(|id| Self::new(self.model, *id))
            .collect()
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.decl.has_annotation(name)
    }

    pub fn has_any_annotation(&self, names: &[&str]) -> bool {
        self.decl.has_any_annotation(names)
    }

    /// Declared type, if resolvable
    pub fn declared_type(&self) -> Option<&'a TypeRef> {
        self.decl.declared_type.as_ref()
    }

    /// Declared type unless unresolvable or void
    pub fn value_type(&self) -> Option<&'a TypeRef> {
        self.declared_type().filter(|ty| !ty.is_void())
    }

    /// Non-constructor method
    pub fn is_plain_method(&self) -> bool {
        self.kind() == DeclarationKind::Method && !self.decl.is_constructor
    }

    pub fn is_constructor(&self) -> bool {
        self.kind() == DeclarationKind::Method && self.decl.is_constructor
    }

    /// True if the declaration sits directly in a class carrying `annotation`,
    /// or in a companion object of such a class
    pub fn in_class_annotated(&self, annotation: &str) -> bool {
        let Some(class) = self.container().filter(|c| c.kind() == DeclarationKind::Class) else {
            return false;
        };
        if class.has_annotation(annotation) {
            return true;
        }
        class.decl.is_companion
            && class
                .container()
                .is_some_and(|outer| outer.has_annotation(annotation))
    }
}

/// Emit one entry per parameter with a resolvable type. Parameters without
/// type information are skipped individually.
pub(crate) fn index_parameters<F>(view: &DeclarationView<'_>, entries: &mut Entries, mut value: F)
where
    F: FnMut(&DeclarationView<'_>) -> Option<IndexValue>,
{
    for param in view.parameters() {
        let Some(key) = param.decl.type_key() else {
            continue;
        };
        if let Some(v) = value(&param) {
            entries.push((key, v));
        }
    }
}

/// Key for a class: its own simple name
pub(crate) fn class_key(class: &ClassId) -> String {
    class.to_type().index_key()
}
