//! `@Inject` constructors and their parameters.

use super::annotations::INJECT;
use super::{
    class_key, index_parameters, Concept, DeclarationView, Decoder, Entries, Identifier, Indexer,
};
use crate::element::{ConsumerKind, Element, ElementKind, ProviderKind};
use crate::error::CodecError;
use crate::index::{DataType, IndexValue, RecordReader};
use crate::model::DeclarationKind;

pub struct InjectedConstructorConcept;

const INDEXERS: &[(DeclarationKind, Indexer)] = &[(DeclarationKind::Method, index_constructor)];

const DECODERS: &[(DataType, Decoder)] = &[
    (DataType::InjectedConstructor, decode_constructor),
    (DataType::InjectedConstructorParameter, decode_parameter),
];

const IDENTIFIERS: &[(DeclarationKind, Identifier)] = &[
    (DeclarationKind::Method, identify_constructor),
    (DeclarationKind::Parameter, identify_parameter),
];

impl Concept for InjectedConstructorConcept {
    fn name(&self) -> &'static str {
        "injected-constructor"
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

fn decode_constructor(r: &mut RecordReader<'_>) -> Result<IndexValue, CodecError> {
    Ok(IndexValue::InjectedConstructor {
        class: r.read_class_id()?,
    })
}

fn decode_parameter(r: &mut RecordReader<'_>) -> Result<IndexValue, CodecError> {
    Ok(IndexValue::InjectedConstructorParameter {
        class: r.read_class_id()?,
        parameter: r.read_string()?,
    })
}

fn is_injected_constructor(view: &DeclarationView<'_>) -> bool {
    view.is_constructor() && view.has_any_annotation(INJECT)
}

fn index_constructor(view: &DeclarationView<'_>, entries: &mut Entries) {
    if !is_injected_constructor(view) {
        return;
    }
    let Some(class) = view.containing_class_id() else {
        return;
    };

    entries.push((
        class_key(&class),
        IndexValue::InjectedConstructor {
            class: class.clone(),
        },
    ));
    index_parameters(view, entries, |param| {
        Some(IndexValue::InjectedConstructorParameter {
            class: class.clone(),
            parameter: param.decl.simple_name.clone(),
        })
    });
}

fn identify_constructor(view: &DeclarationView<'_>) -> Option<Element> {
    if !is_injected_constructor(view) {
        return None;
    }
    let class = view.containing_class()?;
    let ty = class.declared_type()?.clone();
    Some(Element::new(
        view.id,
        ElementKind::Provider(ProviderKind::InjectedConstructor),
        ty,
    ))
}

fn identify_parameter(view: &DeclarationView<'_>) -> Option<Element> {
    let ctor = view.container()?;
    if !is_injected_constructor(&ctor) {
        return None;
    }
    Some(
        Element::new(
            view.id,
            ElementKind::Consumer(ConsumerKind::InjectedConstructorParameter),
            view.declared_type()?.clone(),
        )
        .with_qualifier(view.decl.qualifier()),
    )
}
