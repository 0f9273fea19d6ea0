//! `@Provides` and `@Binds` methods in modules, plus their parameters.
//!
//! A provider method must live in a class annotated `@Module` or in the
//! companion object of one. Each parameter is a consumer and gets its own
//! entry keyed by the parameter type.

use super::annotations::{BINDS, MODULE, PROVIDES};
use super::{index_parameters, Concept, DeclarationView, Decoder, Entries, Identifier, Indexer};
use crate::element::{ConsumerKind, Element, ElementKind, ProviderKind};
use crate::error::CodecError;
use crate::index::{DataType, IndexValue, RecordReader};
use crate::model::DeclarationKind;

pub struct ProvidesMethodConcept;

const INDEXERS: &[(DeclarationKind, Indexer)] = &[(DeclarationKind::Method, index_method)];

const DECODERS: &[(DataType, Decoder)] = &[
    (DataType::ProvidesMethod, decode_method),
    (DataType::ProvidesMethodParameter, decode_parameter),
];

const IDENTIFIERS: &[(DeclarationKind, Identifier)] = &[
    (DeclarationKind::Method, identify_method),
    (DeclarationKind::Parameter, identify_parameter),
];

impl Concept for ProvidesMethodConcept {
    fn name(&self) -> &'static str {
        "provides-method"
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
    Ok(IndexValue::ProvidesMethod {
        class: r.read_class_id()?,
        method: r.read_string()?,
    })
}

fn decode_parameter(r: &mut RecordReader<'_>) -> Result<IndexValue, CodecError> {
    Ok(IndexValue::ProvidesMethodParameter {
        class: r.read_class_id()?,
        method: r.read_string()?,
        parameter: r.read_string()?,
    })
}

fn is_provides_method(view: &DeclarationView<'_>) -> bool {
    view.is_plain_method()
        && (view.has_annotation(PROVIDES) || view.has_annotation(BINDS))
        && view.in_class_annotated(MODULE)
}

fn index_method(view: &DeclarationView<'_>, entries: &mut Entries) {
    if !is_provides_method(view) {
        return;
    }
    let Some(class) = view.containing_class_id() else {
        return;
    };
    let method = &view.decl.simple_name;

    if let Some(key) = view.value_type().and(view.decl.type_key()) {
        entries.push((
            key,
            IndexValue::ProvidesMethod {
                class: class.clone(),
                method: method.clone(),
            },
        ));
    }
    index_parameters(view, entries, |param| {
        Some(IndexValue::ProvidesMethodParameter {
            class: class.clone(),
            method: method.clone(),
            parameter: param.decl.simple_name.clone(),
        })
    });
}

fn identify_method(view: &DeclarationView<'_>) -> Option<Element> {
    if !is_provides_method(view) {
        return None;
    }
    Some(
        Element::new(
            view.id,
            ElementKind::Provider(ProviderKind::ProvidesMethod),
            view.value_type()?.clone(),
        )
        .with_qualifier(view.decl.qualifier()),
    )
}

fn identify_parameter(view: &DeclarationView<'_>) -> Option<Element> {
    let method = view.container()?;
    if !is_provides_method(&method) {
        return None;
    }
    Some(
        Element::new(
            view.id,
            ElementKind::Consumer(ConsumerKind::ProvidesMethodParameter),
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
                "path": "a/HeaterModule.kt",
                "package": "a",
                "classes": [{
                    "name": "HeaterModule",
                    "annotations": [{"name": "dagger.Module"}],
                    "members": [
                        {"kind": "method", "name": "bindHeater", "type": "a.Heater",
                         "annotations": [{"name": "dagger.Binds"}],
                         "parameters": [{"name": "impl", "type": "a.ElectricHeater"}]}
                    ],
                    "classes": [{
                        "name": "Companion",
                        "companion": true,
                        "members": [
                            {"kind": "method", "name": "providePump", "type": "a.Pump",
                             "annotations": [{"name": "dagger.Provides"}],
                             "parameters": [{"name": "broken"}, {"name": "power", "type": "int"}]}
                        ]
                    }]
                }, {
                    "name": "NotAModule",
                    "members": [
                        {"kind": "method", "name": "providePump", "type": "a.Pump",
                         "annotations": [{"name": "dagger.Provides"}]}
                    ]
                }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_binds_method_in_module() {
        let model = model();
        let view = DeclarationView::new(&model, find(&model, "a.HeaterModule#bindHeater")).unwrap();
        let mut entries = Entries::new();
        index_method(&view, &mut entries);
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["Heater", "ElectricHeater"]);
        assert!(identify_method(&view).is_some());
    }

    #[test]
    fn test_companion_object_method() {
        let model = model();
        let view = DeclarationView::new(
            &model,
            find(&model, "a.HeaterModule.Companion#providePump"),
        )
        .unwrap();
        let mut entries = Entries::new();
        index_method(&view, &mut entries);

        let class = ClassId::new("a", "HeaterModule.Companion");
        assert_eq!(
            entries,
            vec![
                (
                    "Pump".to_string(),
                    IndexValue::ProvidesMethod {
                        class: class.clone(),
                        method: "providePump".to_string()
                    }
                ),
                (
                    "Int".to_string(),
                    IndexValue::ProvidesMethodParameter {
                        class,
                        method: "providePump".to_string(),
                        parameter: "power".to_string()
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_method_outside_module_is_ignored() {
        let model = model();
        let view = DeclarationView::new(&model, find(&model, "a.NotAModule#providePump")).unwrap();
        let mut entries = Entries::new();
        index_method(&view, &mut entries);
        assert!(entries.is_empty());
        assert!(identify_method(&view).is_none());
    }

    #[test]
    fn test_identify_parameter() {
        let model = model();
        let view = DeclarationView::new(
            &model,
            find(&model, "a.HeaterModule.Companion#providePump(power)"),
        )
        .unwrap();
        let element = identify_parameter(&view).unwrap();
        assert_eq!(
            element.kind,
            ElementKind::Consumer(ConsumerKind::ProvidesMethodParameter)
        );

        let broken = DeclarationView::new(
            &model,
            find(&model, "a.HeaterModule.Companion#providePump(broken)"),
        )
        .unwrap();
        assert!(identify_parameter(&broken).is_none());
    }
}
