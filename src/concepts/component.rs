//! Components, subcomponents and modules, and the class lists in their
//! annotations.
//!
//! Each listed class becomes an edge value keyed by the listed class's simple
//! name, so a module can find the components that install it.

use super::annotations::{
    ATTR_DEPENDENCIES, ATTR_INCLUDES, ATTR_MODULES, ATTR_SUBCOMPONENTS, COMPONENT, MODULE,
    SUBCOMPONENT,
};
use super::{class_key, Concept, DeclarationView, Decoder, Entries, Identifier, Indexer};
use crate::element::{Element, ElementKind};
use crate::error::CodecError;
use crate::index::{DataType, IndexValue, RecordReader};
use crate::model::{ClassId, DeclarationKind};

pub struct ComponentConcept;

const INDEXERS: &[(DeclarationKind, Indexer)] = &[(DeclarationKind::Class, index_class)];

const DECODERS: &[(DataType, Decoder)] = &[
    (DataType::ComponentWithModule, decode_component_with_module),
    (DataType::ComponentWithDependency, decode_component_with_dependency),
    (DataType::SubcomponentWithModule, decode_subcomponent_with_module),
    (DataType::ModuleWithInclude, decode_module_with_include),
    (DataType::ModuleWithSubcomponent, decode_module_with_subcomponent),
];

const IDENTIFIERS: &[(DeclarationKind, Identifier)] = &[(DeclarationKind::Class, identify_class)];

impl Concept for ComponentConcept {
    fn name(&self) -> &'static str {
        "component"
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

fn decode_component_with_module(r: &mut RecordReader<'_>) -> Result<IndexValue, CodecError> {
    Ok(IndexValue::ComponentWithModule {
        component: r.read_class_id()?,
        module: r.read_class_id()?,
    })
}

fn decode_component_with_dependency(r: &mut RecordReader<'_>) -> Result<IndexValue, CodecError> {
    Ok(IndexValue::ComponentWithDependency {
        component: r.read_class_id()?,
        dependency: r.read_class_id()?,
    })
}

fn decode_subcomponent_with_module(r: &mut RecordReader<'_>) -> Result<IndexValue, CodecError> {
    Ok(IndexValue::SubcomponentWithModule {
        subcomponent: r.read_class_id()?,
        module: r.read_class_id()?,
    })
}

fn decode_module_with_include(r: &mut RecordReader<'_>) -> Result<IndexValue, CodecError> {
    Ok(IndexValue::ModuleWithInclude {
        module: r.read_class_id()?,
        included: r.read_class_id()?,
    })
}

fn decode_module_with_subcomponent(r: &mut RecordReader<'_>) -> Result<IndexValue, CodecError> {
    Ok(IndexValue::ModuleWithSubcomponent {
        module: r.read_class_id()?,
        subcomponent: r.read_class_id()?,
    })
}

/// Classes listed in `attr` of the annotation `annotation` on `view`
pub fn listed_classes(view: &DeclarationView<'_>, annotation: &str, attr: &str) -> Vec<ClassId> {
    view.decl
        .annotation(annotation)
        .map(|a| {
            a.classes_in(attr)
                .into_iter()
                .map(ClassId::from_qualified)
                .collect()
        })
        .unwrap_or_default()
}

fn push_edges<F>(
    view: &DeclarationView<'_>,
    annotation: &str,
    attr: &str,
    entries: &mut Entries,
    edge: F,
) where
    F: Fn(ClassId) -> IndexValue,
{
    for listed in listed_classes(view, annotation, attr) {
        entries.push((class_key(&listed), edge(listed)));
    }
}

fn index_class(view: &DeclarationView<'_>, entries: &mut Entries) {
    let Some(this) = view.decl.class_id.clone() else {
        return;
    };

    if view.has_annotation(COMPONENT) {
        push_edges(view, COMPONENT, ATTR_MODULES, entries, |module| {
            IndexValue::ComponentWithModule {
                component: this.clone(),
                module,
            }
        });
        push_edges(view, COMPONENT, ATTR_DEPENDENCIES, entries, |dependency| {
            IndexValue::ComponentWithDependency {
                component: this.clone(),
                dependency,
            }
        });
    }
    if view.has_annotation(SUBCOMPONENT) {
        push_edges(view, SUBCOMPONENT, ATTR_MODULES, entries, |module| {
            IndexValue::SubcomponentWithModule {
                subcomponent: this.clone(),
                module,
            }
        });
    }
    if view.has_annotation(MODULE) {
        push_edges(view, MODULE, ATTR_INCLUDES, entries, |included| {
            IndexValue::ModuleWithInclude {
                module: this.clone(),
                included,
            }
        });
        push_edges(view, MODULE, ATTR_SUBCOMPONENTS, entries, |subcomponent| {
            IndexValue::ModuleWithSubcomponent {
                module: this.clone(),
                subcomponent,
            }
        });
    }
}

fn identify_class(view: &DeclarationView<'_>) -> Option<Element> {
    let kind = if view.has_annotation(COMPONENT) {
        ElementKind::Component
    } else if view.has_annotation(SUBCOMPONENT) {
        ElementKind::Subcomponent
    } else if view.has_annotation(MODULE) {
        ElementKind::Module
    } else {
        return None;
    };
    Some(Element::new(view.id, kind, view.declared_type()?.clone()))
}
