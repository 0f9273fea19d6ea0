//! `@BindsOptionalOf` methods. They satisfy `Optional<T>` requests only.

use super::annotations::{BINDS_OPTIONAL_OF, MODULE};
use super::{Concept, DeclarationView, Decoder, Entries, Identifier, Indexer};
use crate::element::{Element, ElementKind, ProviderKind};
use crate::error::CodecError;
use crate::index::{DataType, IndexValue, RecordReader};
use crate::model::DeclarationKind;

pub struct BindsOptionalOfConcept;

const INDEXERS: &[(DeclarationKind, Indexer)] = &[(DeclarationKind::Method, index_method)];

const DECODERS: &[(DataType, Decoder)] = &[(DataType::BindsOptionalOfMethod, decode_method)];

const IDENTIFIERS: &[(DeclarationKind, Identifier)] =
    &[(DeclarationKind::Method, identify_method)];

impl Concept for BindsOptionalOfConcept {
    fn name(&self) -> &'static str {
        "binds-optional-of"
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
    Ok(IndexValue::BindsOptionalOfMethod {
        class: r.read_class_id()?,
        method: r.read_string()?,
    })
}

fn is_optional_binding(view: &DeclarationView<'_>) -> bool {
    view.is_plain_method()
        && view.has_annotation(BINDS_OPTIONAL_OF)
        && view.in_class_annotated(MODULE)
}

fn index_method(view: &DeclarationView<'_>, entries: &mut Entries) {
    if !is_optional_binding(view) || view.value_type().is_none() {
        return;
    }
    let (Some(key), Some(class)) = (view.decl.type_key(), view.containing_class_id()) else {
        return;
    };
    entries.push((
        key,
        IndexValue::BindsOptionalOfMethod {
            class,
            method: view.decl.simple_name.clone(),
        },
    ));
}

fn identify_method(view: &DeclarationView<'_>) -> Option<Element> {
    if !is_optional_binding(view) {
        return None;
    }
    Some(
        Element::new(
            view.id,
            ElementKind::Provider(ProviderKind::BindsOptionalOf),
            view.value_type()?.clone(),
        )
        .with_qualifier(view.decl.qualifier()),
    )
}
