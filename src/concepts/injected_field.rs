//! `@Inject` fields.

use super::annotations::FIELD_INJECT;
use super::{Concept, DeclarationView, Decoder, Entries, Identifier, Indexer};
use crate::element::{ConsumerKind, Element, ElementKind};
use crate::error::CodecError;
use crate::index::{DataType, IndexValue, RecordReader};
use crate::model::DeclarationKind;

pub struct InjectedFieldConcept;

const INDEXERS: &[(DeclarationKind, Indexer)] = &[(DeclarationKind::Field, index_field)];

const DECODERS: &[(DataType, Decoder)] = &[(DataType::InjectedField, decode_field)];

const IDENTIFIERS: &[(DeclarationKind, Identifier)] = &[(DeclarationKind::Field, identify_field)];

impl Concept for InjectedFieldConcept {
    fn name(&self) -> &'static str {
        "injected-field"
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

fn decode_field(r: &mut RecordReader<'_>) -> Result<IndexValue, CodecError> {
    Ok(IndexValue::InjectedField {
        class: r.read_class_id()?,
        field: r.read_string()?,
    })
}

fn index_field(view: &DeclarationView<'_>, entries: &mut Entries) {
    if !view.has_any_annotation(FIELD_INJECT) {
        return;
    }
    let (Some(key), Some(class)) = (view.decl.type_key(), view.containing_class_id()) else {
        return;
    };
    entries.push((
        key,
        IndexValue::InjectedField {
            class,
            field: view.decl.simple_name.clone(),
        },
    ));
}

fn identify_field(view: &DeclarationView<'_>) -> Option<Element> {
    if !view.has_any_annotation(FIELD_INJECT) {
        return None;
    }
    Some(
        Element::new(
            view.id,
            ElementKind::Consumer(ConsumerKind::InjectedField),
            view.declared_type()?.clone(),
        )
        .with_qualifier(view.decl.qualifier()),
    )
}
