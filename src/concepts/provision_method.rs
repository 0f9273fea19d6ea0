//! Provision methods and properties exposed by components and subcomponents.
//!
//! A provision member takes no parameters and returns a non-void type. Members
//! returning a subcomponent or a component builder/factory are rejected at
//! identify time, since those types are only known once the whole project is
//! visible.

use super::annotations::{COMPONENT, COMPONENT_CREATORS, SUBCOMPONENT};
use super::{Concept, DeclarationView, Decoder, Entries, Identifier, Indexer};
use crate::element::{ConsumerKind, Element, ElementKind};
use crate::error::CodecError;
use crate::index::{DataType, IndexValue, RecordReader};
use crate::model::{ClassId, DeclarationKind, Scope};

pub struct ProvisionMethodConcept;

const INDEXERS: &[(DeclarationKind, Indexer)] = &[
    (DeclarationKind::Method, index_member),
    (DeclarationKind::Field, index_member),
];

const DECODERS: &[(DataType, Decoder)] = &[
    (DataType::ComponentProvisionMethod, decode_method),
    (DataType::ComponentProvisionProperty, decode_property),
];

const IDENTIFIERS: &[(DeclarationKind, Identifier)] = &[
    (DeclarationKind::Method, identify),
    (DeclarationKind::Field, identify),
];

const OWNERS: &[&str] = &[COMPONENT, SUBCOMPONENT];

impl Concept for ProvisionMethodConcept {
    fn name(&self) -> &'static str {
        "provision-method"
    }

    fn indexers(&self) -> &'static [(DeclarationKind, Indexer)] {
        INDEXERS
    }

    fn decoders(&self) -> &'static [(DataType, Decoder)] {
        DECODERS
    }

    fn identifiers(&self) -> &'static [(DeclarationKind, Identifier)] {
        IDENTIFIERS
    }
}

fn decode_method(r: &mut RecordReader<'_>) -> Result<IndexValue, CodecError> {
    Ok(IndexValue::ComponentProvisionMethod {
        class: r.read_class_id()?,
        method: r.read_string()?,
    })
}

fn decode_property(r: &mut RecordReader<'_>) -> Result<IndexValue, CodecError> {
    Ok(IndexValue::ComponentProvisionProperty {
        class: r.read_class_id()?,
        property: r.read_string()?,
    })
}

/// Zero-parameter method or property with a value type, declared directly in
/// a class carrying one of `owners`
pub(crate) fn is_exposed_member(view: &DeclarationView<'_>, owners: &[&str]) -> bool {
    let shape = match view.kind() {
        DeclarationKind::Method => view.is_plain_method() && view.decl.parameters.is_empty(),
        DeclarationKind::Field => true,
        _ => false,
    };
    shape
        && view.value_type().is_some()
        && view
            .container()
            .is_some_and(|class| class.has_any_annotation(owners))
}

/// True if the member's type is a subcomponent or a component creator.
///
/// The lookup always covers the whole project: identification depends only on
/// the declaration, so indexing and every query scope agree on what a member is.
pub(crate) fn returns_graph_type(view: &DeclarationView<'_>) -> bool {
    let Some(ty) = view.value_type() else {
        return false;
    };
    view.model
        .find_classes(ty.name(), &Scope::project())
        .into_iter()
        .filter_map(|id| view.model.declaration(id))
        .any(|class| {
            class.has_annotation(SUBCOMPONENT) || class.has_any_annotation(COMPONENT_CREATORS)
        })
}

/// Index a provision-style member with the given value constructors
pub(crate) fn index_exposed<M, P>(
    view: &DeclarationView<'_>,
    owners: &[&str],
    entries: &mut Entries,
    method_value: M,
    property_value: P,
) where
    M: FnOnce(ClassId, String) -> IndexValue,
    P: FnOnce(ClassId, String) -> IndexValue,
{
    if !is_exposed_member(view, owners) {
        return;
    }
    let (Some(key), Some(class)) = (view.decl.type_key(), view.containing_class_id()) else {
        return;
    };
    let name = view.decl.simple_name.clone();
    let value = match view.kind() {
        DeclarationKind::Field => property_value(class, name),
        _ => method_value(class, name),
    };
    entries.push((key, value));
}

/// Identify a provision-style member as a consumer of `kind`
pub(crate) fn identify_exposed(
    view: &DeclarationView<'_>,
    owners: &[&str],
    kind: ConsumerKind,
) -> Option<Element> {
    if !is_exposed_member(view, owners) || returns_graph_type(view) {
        return None;
    }
    Some(
        Element::new(
            view.id,
            ElementKind::Consumer(kind),
            view.value_type()?.clone(),
        )
        .with_qualifier(view.decl.qualifier()),
    )
}

fn index_member(view: &DeclarationView<'_>, entries: &mut Entries) {
    index_exposed(
        view,
        OWNERS,
        entries,
        |class, method| IndexValue::ComponentProvisionMethod { class, method },
        |class, property| IndexValue::ComponentProvisionProperty { class, property },
    );
}

fn identify(view: &DeclarationView<'_>) -> Option<Element> {
    identify_exposed(view, OWNERS, ConsumerKind::ProvisionMethod)
}
