//! Assisted injection: `@AssistedInject` constructors and `@AssistedFactory`
//! interfaces.
//!
//! The factory class itself is a provider of its own type, and its abstract
//! method is paired with the constructor of the class it returns. Constructor
//! parameters not marked `@Assisted` are ordinary consumers.

use super::annotations::{ASSISTED, ASSISTED_FACTORY, ASSISTED_INJECT};
use super::{
    class_key, index_parameters, Concept, DeclarationView, Decoder, Entries, Identifier, Indexer,
};
use crate::element::{ConsumerKind, Element, ElementKind, ProviderKind};
use crate::error::CodecError;
use crate::index::{DataType, IndexValue, RecordReader};
use crate::model::DeclarationKind;

pub struct AssistedConcept;

const INDEXERS: &[(DeclarationKind, Indexer)] = &[
    (DeclarationKind::Method, index_constructor),
    (DeclarationKind::Method, index_factory_method),
    (DeclarationKind::Class, index_factory_class),
];

const DECODERS: &[(DataType, Decoder)] = &[
    (DataType::AssistedInjectConstructor, decode_constructor),
    (
        DataType::AssistedInjectConstructorUnassistedParameter,
        decode_parameter,
    ),
    (DataType::AssistedFactoryClass, decode_factory_class),
    (DataType::AssistedFactoryMethod, decode_factory_method),
];

const IDENTIFIERS: &[(DeclarationKind, Identifier)] = &[
    (DeclarationKind::Method, identify_constructor),
    (DeclarationKind::Method, identify_factory_method),
    (DeclarationKind::Parameter, identify_parameter),
    (DeclarationKind::Class, identify_factory_class),
];

impl Concept for AssistedConcept {
    fn name(&self) -> &'static str {
        "assisted"
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
    Ok(IndexValue::AssistedInjectConstructor {
        class: r.read_class_id()?,
    })
}

fn decode_parameter(r: &mut RecordReader<'_>) -> Result<IndexValue, CodecError> {
    Ok(IndexValue::AssistedInjectConstructorUnassistedParameter {
        class: r.read_class_id()?,
        parameter: r.read_string()?,
    })
}

fn decode_factory_class(r: &mut RecordReader<'_>) -> Result<IndexValue, CodecError> {
    Ok(IndexValue::AssistedFactoryClass {
        class: r.read_class_id()?,
    })
}

fn decode_factory_method(r: &mut RecordReader<'_>) -> Result<IndexValue, CodecError> {
    Ok(IndexValue::AssistedFactoryMethod {
        class: r.read_class_id()?,
        method: r.read_string()?,
    })
}

fn is_assisted_constructor(view: &DeclarationView<'_>) -> bool {
    view.is_constructor() && view.has_annotation(ASSISTED_INJECT)
}

fn is_factory_method(view: &DeclarationView<'_>) -> bool {
    view.is_plain_method()
        && view
            .container()
            .is_some_and(|class| class.has_annotation(ASSISTED_FACTORY))
}

fn index_constructor(view: &DeclarationView<'_>, entries: &mut Entries) {
    if !is_assisted_constructor(view) {
        return;
    }
    let Some(class) = view.containing_class_id() else {
        return;
    };

    entries.push((
        class_key(&class),
        IndexValue::AssistedInjectConstructor {
            class: class.clone(),
        },
    ));
    index_parameters(view, entries, |param| {
        (!param.has_annotation(ASSISTED)).then(|| {
            IndexValue::AssistedInjectConstructorUnassistedParameter {
                class: class.clone(),
                parameter: param.decl.simple_name.clone(),
            }
        })
    });
}

fn index_factory_method(view: &DeclarationView<'_>, entries: &mut Entries) {
    if !is_factory_method(view) {
        return;
    }
    // The factory must name a concrete class to construct
    let (Some(_), Some(key), Some(class)) = (
        view.value_type(),
        view.decl.type_key(),
        view.containing_class_id(),
    ) else {
        return;
    };
    entries.push((
        key,
        IndexValue::AssistedFactoryMethod {
            class,
            method: view.decl.simple_name.clone(),
        },
    ));
}

fn index_factory_class(view: &DeclarationView<'_>, entries: &mut Entries) {
    if !view.has_annotation(ASSISTED_FACTORY) {
        return;
    }
    if let Some(class) = view.decl.class_id.clone() {
        entries.push((class_key(&class), IndexValue::AssistedFactoryClass { class }));
    }
}

fn identify_constructor(view: &DeclarationView<'_>) -> Option<Element> {
    if !is_assisted_constructor(view) {
        return None;
    }
    let class = view.containing_class()?;
    Some(Element::new(
        view.id,
        ElementKind::AssistedInjectConstructor,
        class.declared_type()?.clone(),
    ))
}

fn identify_factory_method(view: &DeclarationView<'_>) -> Option<Element> {
    if !is_factory_method(view) {
        return None;
    }
    Some(Element::new(
        view.id,
        ElementKind::AssistedFactoryMethod,
        view.value_type()?.clone(),
    ))
}

fn identify_parameter(view: &DeclarationView<'_>) -> Option<Element> {
    let ctor = view.container()?;
    if !is_assisted_constructor(&ctor) || view.has_annotation(ASSISTED) {
        return None;
    }
    Some(
        Element::new(
            view.id,
            ElementKind::Consumer(ConsumerKind::AssistedInjectParameter),
            view.declared_type()?.clone(),
        )
        .with_qualifier(view.decl.qualifier()),
    )
}

fn identify_factory_class(view: &DeclarationView<'_>) -> Option<Element> {
    if !view.has_annotation(ASSISTED_FACTORY) {
        return None;
    }
    Some(Element::new(
        view.id,
        ElementKind::Provider(ProviderKind::AssistedFactory),
        view.declared_type()?.clone(),
    ))
}
