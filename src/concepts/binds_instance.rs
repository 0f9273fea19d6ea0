//! `@BindsInstance` on component builder methods and factory-method
//! parameters. Both provide the bound parameter's type.

use super::annotations::BINDS_INSTANCE;
use super::{Concept, DeclarationView, Decoder, Entries, Identifier, Indexer};
use crate::element::{Element, ElementKind, ProviderKind};
use crate::error::CodecError;
use crate::index::{DataType, IndexValue, RecordReader};
use crate::model::DeclarationKind;

pub struct BindsInstanceConcept;

const INDEXERS: &[(DeclarationKind, Indexer)] = &[
    (DeclarationKind::Method, index_builder_method),
    (DeclarationKind::Parameter, index_factory_parameter),
];

const DECODERS: &[(DataType, Decoder)] = &[
    (DataType::BindsInstanceBuilderMethod, decode_builder_method),
    (
        DataType::BindsInstanceFactoryMethodParameter,
        decode_factory_parameter,
    ),
];

const IDENTIFIERS: &[(DeclarationKind, Identifier)] = &[
    (DeclarationKind::Method, identify_builder_method),
    (DeclarationKind::Parameter, identify_factory_parameter),
];

impl Concept for BindsInstanceConcept {
    fn name(&self) -> &'static str {
        "binds-instance"
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

fn decode_builder_method(r: &mut RecordReader<'_>) -> Result<IndexValue, CodecError> {
    Ok(IndexValue::BindsInstanceBuilderMethod {
        class: r.read_class_id()?,
        method: r.read_string()?,
    })
}

fn decode_factory_parameter(r: &mut RecordReader<'_>) -> Result<IndexValue, CodecError> {
    Ok(IndexValue::BindsInstanceFactoryMethodParameter {
        class: r.read_class_id()?,
        method: r.read_string()?,
        parameter: r.read_string()?,
    })
}

/// The single parameter of a `@BindsInstance` builder method
fn bound_parameter<'a>(view: &DeclarationView<'a>) -> Option<DeclarationView<'a>> {
    if !view.is_plain_method() || !view.has_annotation(BINDS_INSTANCE) {
        return None;
    }
    match view.parameters().as_slice() {
        [param] => Some(*param),
        _ => None,
    }
}

fn is_factory_parameter(view: &DeclarationView<'_>) -> bool {
    view.has_annotation(BINDS_INSTANCE)
        && view
            .container()
            .is_some_and(|method| method.is_plain_method())
}

fn index_builder_method(view: &DeclarationView<'_>, entries: &mut Entries) {
    let Some(param) = bound_parameter(view) else {
        return;
    };
    let (Some(key), Some(class)) = (param.decl.type_key(), view.containing_class_id()) else {
        return;
    };
    entries.push((
        key,
        IndexValue::BindsInstanceBuilderMethod {
            class,
            method: view.decl.simple_name.clone(),
        },
    ));
}

fn index_factory_parameter(view: &DeclarationView<'_>, entries: &mut Entries) {
    if !is_factory_parameter(view) {
        return;
    }
    let (Some(key), Some(method), Some(class)) = (
        view.decl.type_key(),
        view.container(),
        view.containing_class_id(),
    ) else {
        return;
    };
    entries.push((
        key,
        IndexValue::BindsInstanceFactoryMethodParameter {
            class,
            method: method.decl.simple_name.clone(),
            parameter: view.decl.simple_name.clone(),
        },
    ));
}

fn identify_builder_method(view: &DeclarationView<'_>) -> Option<Element> {
    let param = bound_parameter(view)?;
    Some(
        Element::new(
            view.id,
            ElementKind::Provider(ProviderKind::BindsInstance),
            param.declared_type()?.clone(),
        )
        .with_qualifier(param.decl.qualifier().or_else(|| view.decl.qualifier())),
    )
}

fn identify_factory_parameter(view: &DeclarationView<'_>) -> Option<Element> {
    if !is_factory_parameter(view) {
        return None;
    }
    Some(
        Element::new(
            view.id,
            ElementKind::Provider(ProviderKind::BindsInstance),
            view.declared_type()?.clone(),
        )
        .with_qualifier(view.decl.qualifier()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concepts::test_support::find;
    use crate::model::{ClassId, ProjectModel};
    use serde_json::json;

    fn model() -> ProjectModel {
        ProjectModel::from_json(json!({
            "files": [{
                "path": "a/AppComponent.java",
                "package": "a",
                "classes": [{
                    "name": "AppComponent",
                    "annotations": [{"name": "dagger.Component"}],
                    "classes": [{
                        "name": "Builder",
                        "annotations": [{"name": "dagger.Component.Builder"}],
                        "members": [
                            {"kind": "method", "name": "heater", "type": "a.AppComponent.Builder",
                             "annotations": [{"name": "dagger.BindsInstance"}],
                             "parameters": [{"name": "heater", "type": "a.Heater",
                                             "annotations": [{"name": "javax.inject.Named", "qualifier": true}]}]},
                            {"kind": "method", "name": "two", "type": "a.AppComponent.Builder",
                             "annotations": [{"name": "dagger.BindsInstance"}],
                             "parameters": [{"name": "x", "type": "a.X"}, {"name": "y", "type": "a.Y"}]}
                        ]
                    }, {
                        "name": "Factory",
                        "annotations": [{"name": "dagger.Component.Factory"}],
                        "members": [
                            {"kind": "method", "name": "create", "type": "a.AppComponent",
                             "parameters": [
                                 {"name": "pump", "type": "a.Pump",
                                  "annotations": [{"name": "dagger.BindsInstance"}]},
                                 {"name": "plain", "type": "a.Plain"}
                             ]}
                        ]
                    }]
                }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_builder_method() {
        let model = model();
        let view =
            DeclarationView::new(&model, find(&model, "a.AppComponent.Builder#heater")).unwrap();
        let mut entries = Entries::new();
        index_builder_method(&view, &mut entries);
        assert_eq!(
            entries,
            vec![(
                "Heater".to_string(),
                IndexValue::BindsInstanceBuilderMethod {
                    class: ClassId::new("a", "AppComponent.Builder"),
                    method: "heater".to_string()
                }
            )]
        );

        let element = identify_builder_method(&view).unwrap();
        assert_eq!(element.ty.to_string(), "a.Heater");
        assert_eq!(element.qualifier.unwrap().name, "javax.inject.Named");

        let two = DeclarationView::new(&model, find(&model, "a.AppComponent.Builder#two")).unwrap();
        let mut entries = Entries::new();
        index_builder_method(&two, &mut entries);
        assert!(entries.is_empty());
    }

    #[test]
    fn test_factory_parameter() {
        let model = model();
        let pump = DeclarationView::new(
            &model,
            find(&model, "a.AppComponent.Factory#create(pump)"),
        )
        .unwrap();
        let mut entries = Entries::new();
        index_factory_parameter(&pump, &mut entries);
        assert_eq!(
            entries,
            vec![(
                "Pump".to_string(),
                IndexValue::BindsInstanceFactoryMethodParameter {
                    class: ClassId::new("a", "AppComponent.Factory"),
                    method: "create".to_string(),
                    parameter: "pump".to_string()
                }
            )]
        );
        assert!(identify_factory_parameter(&pump).is_some());

        let plain = DeclarationView::new(
            &model,
            find(&model, "a.AppComponent.Factory#create(plain)"),
        )
        .unwrap();
        assert!(identify_factory_parameter(&plain).is_none());
    }
}
