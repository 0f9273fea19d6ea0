//! Hilt `@EntryPoint` accessors.

use super::annotations::ENTRY_POINT;
use super::provision_method::{identify_exposed, index_exposed};
use super::{Concept, DeclarationView, Decoder, Entries, Identifier, Indexer};
use crate::element::{ConsumerKind, Element};
use crate::error::CodecError;
use crate::index::{DataType, IndexValue, RecordReader};
use crate::model::DeclarationKind;

pub struct EntryPointConcept;

const INDEXERS: &[(DeclarationKind, Indexer)] = &[
    (DeclarationKind::Method, index_member),
    (DeclarationKind::Field, index_member),
];

const DECODERS: &[(DataType, Decoder)] = &[
    (DataType::EntryPointMethod, decode_method),
    (DataType::EntryPointProperty, decode_property),
];

const IDENTIFIERS: &[(DeclarationKind, Identifier)] = &[
    (DeclarationKind::Method, identify),
    (DeclarationKind::Field, identify),
];

const OWNERS: &[&str] = &[ENTRY_POINT];

impl Concept for EntryPointConcept {
    fn name(&self) -> &'static str {
        "entry-point"
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
    Ok(IndexValue::EntryPointMethod {
        class: r.read_class_id()?,
        method: r.read_string()?,
    })
}

fn decode_property(r: &mut RecordReader<'_>) -> Result<IndexValue, CodecError> {
    Ok(IndexValue::EntryPointProperty {
        class: r.read_class_id()?,
        property: r.read_string()?,
    })
}

fn index_member(view: &DeclarationView<'_>, entries: &mut Entries) {
    index_exposed(
        view,
        OWNERS,
        entries,
        |class, method| IndexValue::EntryPointMethod { class, method },
        |class, property| IndexValue::EntryPointProperty { class, property },
    );
}

fn identify(view: &DeclarationView<'_>) -> Option<Element> {
    identify_exposed(view, OWNERS, ConsumerKind::EntryPointMethod)
}
