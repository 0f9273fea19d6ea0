//! Query-time representation of dependency-injection participants.
//!
//! Elements are created on demand by the concept identifiers and dropped after
//! the query; they are never persisted. The exact-match rules that validate an
//! index hit live here.

use serde::Serialize;
use std::fmt;

use crate::index::ElementRole;
use crate::model::{DeclId, Qualifier, TypeRef};

/// How a provider supplies its binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    InjectedConstructor,
    /// `@Provides` or `@Binds` method
    ProvidesMethod,
    AssistedFactory,
    BindsInstance,
    BindsOptionalOf,
}

/// How a consumer requests its dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerKind {
    InjectedConstructorParameter,
    InjectedField,
    ProvidesMethodParameter,
    ProvisionMethod,
    EntryPointMethod,
    AssistedInjectParameter,
}

/// Role of an element together with its concept-specific flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "role", content = "kind")]
pub enum ElementKind {
    Provider(ProviderKind),
    Consumer(ConsumerKind),
    Component,
    Subcomponent,
    Module,
    AssistedInjectConstructor,
    AssistedFactoryMethod,
}

impl ElementKind {
    pub fn role(self) -> ElementRole {
        match self {
            ElementKind::Provider(_) => ElementRole::Provider,
            ElementKind::Consumer(_) => ElementRole::Consumer,
            ElementKind::Component => ElementRole::Component,
            ElementKind::Subcomponent => ElementRole::Subcomponent,
            ElementKind::Module => ElementRole::Module,
            ElementKind::AssistedInjectConstructor => ElementRole::AssistedInjectConstructor,
            ElementKind::AssistedFactoryMethod => ElementRole::AssistedFactoryMethod,
        }
    }

    /// Provider or consumer flavour, for display
    pub fn flavour(self) -> Option<&'static str> {
        match self {
            ElementKind::Provider(kind) => Some(match kind {
                ProviderKind::InjectedConstructor => "injected_constructor",
                ProviderKind::ProvidesMethod => "provides_method",
                ProviderKind::AssistedFactory => "assisted_factory",
                ProviderKind::BindsInstance => "binds_instance",
                ProviderKind::BindsOptionalOf => "binds_optional_of",
            }),
            ElementKind::Consumer(kind) => Some(match kind {
                ConsumerKind::InjectedConstructorParameter => "injected_constructor_parameter",
                ConsumerKind::InjectedField => "injected_field",
                ConsumerKind::ProvidesMethodParameter => "provides_method_parameter",
                ConsumerKind::ProvisionMethod => "provision_method",
                ConsumerKind::EntryPointMethod => "entry_point_method",
                ConsumerKind::AssistedInjectParameter => "assisted_inject_parameter",
            }),
            _ => None,
        }
    }
}

/// A declaration identified as a DI participant.
///
/// `ty` is the relevant type: the provided type for providers, the requested
/// type (wrappers included) for consumers, the class itself for components,
/// modules and assisted-inject constructors, and the return type for
/// assisted factory methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element {
    pub decl: DeclId,
    pub kind: ElementKind,
    pub ty: TypeRef,
    pub qualifier: Option<Qualifier>,
}

impl Element {
    pub fn new(decl: DeclId, kind: ElementKind, ty: TypeRef) -> Self {
        Self {
            decl,
            kind,
            ty,
            qualifier: None,
        }
    }

    pub fn with_qualifier(mut self, qualifier: Option<Qualifier>) -> Self {
        self.qualifier = qualifier;
        self
    }

    pub fn role(&self) -> ElementRole {
        self.kind.role()
    }

    /// Exact-match check applied to every resolved index hit.
    ///
    /// Provider/consumer pairs go through [`binds`], which is symmetric.
    /// Assisted pairs compare the raw constructed class. Class relations only
    /// exclude the element itself.
    pub fn filter_resolve_candidate(&self, candidate: &Element) -> bool {
        match (self.kind, candidate.kind) {
            (ElementKind::Provider(_), ElementKind::Consumer(_)) => binds(self, candidate),
            (ElementKind::Consumer(_), ElementKind::Provider(_)) => binds(candidate, self),
            (ElementKind::AssistedInjectConstructor, ElementKind::AssistedFactoryMethod)
            | (ElementKind::AssistedFactoryMethod, ElementKind::AssistedInjectConstructor) => {
                self.ty.same_raw_type(&candidate.ty)
            }
            (
                ElementKind::Component | ElementKind::Subcomponent | ElementKind::Module,
                ElementKind::Component | ElementKind::Subcomponent | ElementKind::Module,
            ) => self.decl != candidate.decl,
            _ => false,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {} {}", self.kind, self.decl, self.ty)
    }
}

/// True if `provider` satisfies `consumer`.
///
/// Optional bindings only satisfy `Optional<T>` requests, where `T` itself may
/// be wrapped in `Provider<>` or `Lazy<>`. Injected constructors and assisted
/// factories provide their raw class, so any parameterization of it matches.
/// Everything else compares the provided type with the requested type after
/// stripping `Provider<>` and then `Lazy<>`, plus qualifier equality.
pub fn binds(provider: &Element, consumer: &Element) -> bool {
    let (ElementKind::Provider(provider_kind), ElementKind::Consumer(_)) =
        (provider.kind, consumer.kind)
    else {
        return false;
    };
    if provider.qualifier != consumer.qualifier {
        return false;
    }

    let requested = consumer.ty.unwrap_dependency();
    match provider_kind {
        ProviderKind::BindsOptionalOf => requested
            .optional_inner()
            .is_some_and(|inner| inner.unwrap_dependency().same_binding(&provider.ty)),
        ProviderKind::InjectedConstructor | ProviderKind::AssistedFactory => {
            requested.same_raw_type(&provider.ty)
        }
        _ => requested.same_binding(&provider.ty),
    }
}
