//! Reverse index of dependency-injection facts.
//!
//! Every fact extracted from a declaration is an [`IndexValue`]. Values are
//! stored under a simple-name key and encoded as `[tag u8][fields]`, where the
//! tag is the value's [`DataType`]. Values only hold durable identifiers
//! (class ids and member names), never declaration handles, and are turned
//! back into declarations with [`IndexValue::resolve_candidates`].

pub mod codec;
pub mod keys;
pub mod store;

use serde::Serialize;
use std::fmt;

pub use codec::{RecordReader, RecordWriter};
pub use store::{IndexStore, StoreStats};

use crate::error::CodecError;
use crate::model::{ClassId, DeclId, DeclarationKind, Scope, SourceModel};

/// Role of the element an index value resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementRole {
    Provider,
    Consumer,
    Component,
    Subcomponent,
    Module,
    AssistedInjectConstructor,
    AssistedFactoryMethod,
}

impl ElementRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementRole::Provider => "provider",
            ElementRole::Consumer => "consumer",
            ElementRole::Component => "component",
            ElementRole::Subcomponent => "subcomponent",
            ElementRole::Module => "module",
            ElementRole::AssistedInjectConstructor => "assisted_inject_constructor",
            ElementRole::AssistedFactoryMethod => "assisted_factory_method",
        }
    }
}

/// Stable binary tag of an [`IndexValue`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum DataType {
    InjectedConstructor = 1,
    InjectedConstructorParameter = 2,
    InjectedField = 3,
    ProvidesMethod = 4,
    ProvidesMethodParameter = 5,
    ComponentWithModule = 6,
    ComponentWithDependency = 7,
    SubcomponentWithModule = 8,
    ModuleWithInclude = 9,
    ModuleWithSubcomponent = 10,
    ComponentProvisionMethod = 11,
    ComponentProvisionProperty = 12,
    EntryPointMethod = 13,
    EntryPointProperty = 14,
    AssistedInjectConstructor = 15,
    AssistedInjectConstructorUnassistedParameter = 16,
    AssistedFactoryClass = 17,
    AssistedFactoryMethod = 18,
    BindsInstanceBuilderMethod = 19,
    BindsInstanceFactoryMethodParameter = 20,
    BindsOptionalOfMethod = 21,
}

impl DataType {
    pub const ALL: [DataType; 21] = [
        DataType::InjectedConstructor,
        DataType::InjectedConstructorParameter,
        DataType::InjectedField,
        DataType::ProvidesMethod,
        DataType::ProvidesMethodParameter,
        DataType::ComponentWithModule,
        DataType::ComponentWithDependency,
        DataType::SubcomponentWithModule,
        DataType::ModuleWithInclude,
        DataType::ModuleWithSubcomponent,
        DataType::ComponentProvisionMethod,
        DataType::ComponentProvisionProperty,
        DataType::EntryPointMethod,
        DataType::EntryPointProperty,
        DataType::AssistedInjectConstructor,
        DataType::AssistedInjectConstructorUnassistedParameter,
        DataType::AssistedFactoryClass,
        DataType::AssistedFactoryMethod,
        DataType::BindsInstanceBuilderMethod,
        DataType::BindsInstanceFactoryMethodParameter,
        DataType::BindsOptionalOfMethod,
    ];

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.tag() == tag)
    }

    /// Role of the elements this data type resolves to
    pub fn element_role(self) -> ElementRole {
        use DataType::*;
        match self {
            InjectedConstructor
            | ProvidesMethod
            | AssistedFactoryClass
            | BindsInstanceBuilderMethod
            | BindsInstanceFactoryMethodParameter
            | BindsOptionalOfMethod => ElementRole::Provider,
            InjectedConstructorParameter
            | InjectedField
            | ProvidesMethodParameter
            | ComponentProvisionMethod
            | ComponentProvisionProperty
            | EntryPointMethod
            | EntryPointProperty
            | AssistedInjectConstructorUnassistedParameter => ElementRole::Consumer,
            ComponentWithModule | ComponentWithDependency => ElementRole::Component,
            SubcomponentWithModule => ElementRole::Subcomponent,
            ModuleWithInclude | ModuleWithSubcomponent => ElementRole::Module,
            AssistedInjectConstructor => ElementRole::AssistedInjectConstructor,
            AssistedFactoryMethod => ElementRole::AssistedFactoryMethod,
        }
    }
}

/// One fact extracted from a declaration during indexing
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexValue {
    InjectedConstructor {
        class: ClassId,
    },
    InjectedConstructorParameter {
        class: ClassId,
        parameter: String,
    },
    InjectedField {
        class: ClassId,
        field: String,
    },
    /// `@Provides` and `@Binds` methods
    ProvidesMethod {
        class: ClassId,
        method: String,
    },
    ProvidesMethodParameter {
        class: ClassId,
        method: String,
        parameter: String,
    },
    ComponentWithModule {
        component: ClassId,
        module: ClassId,
    },
    ComponentWithDependency {
        component: ClassId,
        dependency: ClassId,
    },
    SubcomponentWithModule {
        subcomponent: ClassId,
        module: ClassId,
    },
    ModuleWithInclude {
        module: ClassId,
        included: ClassId,
    },
    ModuleWithSubcomponent {
        module: ClassId,
        subcomponent: ClassId,
    },
    ComponentProvisionMethod {
        class: ClassId,
        method: String,
    },
    ComponentProvisionProperty {
        class: ClassId,
        property: String,
    },
    EntryPointMethod {
        class: ClassId,
        method: String,
    },
    EntryPointProperty {
        class: ClassId,
        property: String,
    },
    AssistedInjectConstructor {
        class: ClassId,
    },
    AssistedInjectConstructorUnassistedParameter {
        class: ClassId,
        parameter: String,
    },
    AssistedFactoryClass {
        class: ClassId,
    },
    AssistedFactoryMethod {
        class: ClassId,
        method: String,
    },
    BindsInstanceBuilderMethod {
        class: ClassId,
        method: String,
    },
    BindsInstanceFactoryMethodParameter {
        class: ClassId,
        method: String,
        parameter: String,
    },
    BindsOptionalOfMethod {
        class: ClassId,
        method: String,
    },
}

/// What an index value points at inside its owning class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target<'a> {
    Class,
    Constructors,
    Member(DeclarationKind, &'a str),
    ConstructorParameter(&'a str),
    MethodParameter(&'a str, &'a str),
}

impl IndexValue {
    pub fn data_type(&self) -> DataType {
        match self {
            IndexValue::InjectedConstructor { .. } => DataType::InjectedConstructor,
            IndexValue::InjectedConstructorParameter { .. } => {
                DataType::InjectedConstructorParameter
            }
            IndexValue::InjectedField { .. } => DataType::InjectedField,
            IndexValue::ProvidesMethod { .. } => DataType::ProvidesMethod,
            IndexValue::ProvidesMethodParameter { .. } => DataType::ProvidesMethodParameter,
            IndexValue::ComponentWithModule { .. } => DataType::ComponentWithModule,
            IndexValue::ComponentWithDependency { .. } => DataType::ComponentWithDependency,
            IndexValue::SubcomponentWithModule { .. } => DataType::SubcomponentWithModule,
            IndexValue::ModuleWithInclude { .. } => DataType::ModuleWithInclude,
            IndexValue::ModuleWithSubcomponent { .. } => DataType::ModuleWithSubcomponent,
            IndexValue::ComponentProvisionMethod { .. } => DataType::ComponentProvisionMethod,
            IndexValue::ComponentProvisionProperty { .. } => DataType::ComponentProvisionProperty,
            IndexValue::EntryPointMethod { .. } => DataType::EntryPointMethod,
            IndexValue::EntryPointProperty { .. } => DataType::EntryPointProperty,
            IndexValue::AssistedInjectConstructor { .. } => DataType::AssistedInjectConstructor,
            IndexValue::AssistedInjectConstructorUnassistedParameter { .. } => {
                DataType::AssistedInjectConstructorUnassistedParameter
            }
            IndexValue::AssistedFactoryClass { .. } => DataType::AssistedFactoryClass,
            IndexValue::AssistedFactoryMethod { .. } => DataType::AssistedFactoryMethod,
            IndexValue::BindsInstanceBuilderMethod { .. } => DataType::BindsInstanceBuilderMethod,
            IndexValue::BindsInstanceFactoryMethodParameter { .. } => {
                DataType::BindsInstanceFactoryMethodParameter
            }
            IndexValue::BindsOptionalOfMethod { .. } => DataType::BindsOptionalOfMethod,
        }
    }

    pub fn element_role(&self) -> ElementRole {
        self.data_type().element_role()
    }

    /// Class whose members this value resolves to
    pub fn owner(&self) -> &ClassId {
        match self {
            IndexValue::InjectedConstructor { class }
            | IndexValue::InjectedConstructorParameter { class, .. }
            | IndexValue::InjectedField { class, .. }
            | IndexValue::ProvidesMethod { class, .. }
            | IndexValue::ProvidesMethodParameter { class, .. }
            | IndexValue::ComponentProvisionMethod { class, .. }
            | IndexValue::ComponentProvisionProperty { class, .. }
            | IndexValue::EntryPointMethod { class, .. }
            | IndexValue::EntryPointProperty { class, .. }
            | IndexValue::AssistedInjectConstructor { class }
            | IndexValue::AssistedInjectConstructorUnassistedParameter { class, .. }
            | IndexValue::AssistedFactoryClass { class }
            | IndexValue::AssistedFactoryMethod { class, .. }
            | IndexValue::BindsInstanceBuilderMethod { class, .. }
            | IndexValue::BindsInstanceFactoryMethodParameter { class, .. }
            | IndexValue::BindsOptionalOfMethod { class, .. } => class,
            IndexValue::ComponentWithModule { component, .. }
            | IndexValue::ComponentWithDependency { component, .. } => component,
            IndexValue::SubcomponentWithModule { subcomponent, .. } => subcomponent,
            IndexValue::ModuleWithInclude { module, .. }
            | IndexValue::ModuleWithSubcomponent { module, .. } => module,
        }
    }

    /// The class referenced by an edge value (module, dependency, include or
    /// subcomponent), `None` for member values
    pub fn linked_class(&self) -> Option<&ClassId> {
        match self {
            IndexValue::ComponentWithModule { module, .. }
            | IndexValue::SubcomponentWithModule { module, .. } => Some(module),
            IndexValue::ComponentWithDependency { dependency, .. } => Some(dependency),
            IndexValue::ModuleWithInclude { included, .. } => Some(included),
            IndexValue::ModuleWithSubcomponent { subcomponent, .. } => Some(subcomponent),
            _ => None,
        }
    }

    fn target(&self) -> Target<'_> {
        match self {
            IndexValue::InjectedConstructor { .. }
            | IndexValue::AssistedInjectConstructor { .. } => Target::Constructors,
            IndexValue::InjectedConstructorParameter { parameter, .. }
            | IndexValue::AssistedInjectConstructorUnassistedParameter { parameter, .. } => {
                Target::ConstructorParameter(parameter)
            }
            IndexValue::InjectedField { field, .. } => {
                Target::Member(DeclarationKind::Field, field)
            }
            IndexValue::ComponentProvisionProperty { property, .. }
            | IndexValue::EntryPointProperty { property, .. } => {
                Target::Member(DeclarationKind::Field, property)
            }
            IndexValue::ProvidesMethod { method, .. }
            | IndexValue::ComponentProvisionMethod { method, .. }
            | IndexValue::EntryPointMethod { method, .. }
            | IndexValue::AssistedFactoryMethod { method, .. }
            | IndexValue::BindsInstanceBuilderMethod { method, .. }
            | IndexValue::BindsOptionalOfMethod { method, .. } => {
                Target::Member(DeclarationKind::Method, method)
            }
            IndexValue::ProvidesMethodParameter {
                method, parameter, ..
            }
            | IndexValue::BindsInstanceFactoryMethodParameter {
                method, parameter, ..
            } => Target::MethodParameter(method, parameter),
            IndexValue::ComponentWithModule { .. }
            | IndexValue::ComponentWithDependency { .. }
            | IndexValue::SubcomponentWithModule { .. }
            | IndexValue::ModuleWithInclude { .. }
            | IndexValue::ModuleWithSubcomponent { .. }
            | IndexValue::AssistedFactoryClass { .. } => Target::Class,
        }
    }

    /// Re-resolve the durable identifiers to live declarations visible in
    /// `scope`. Overloads and duplicate class definitions yield several
    /// candidates; a stale value yields none.
    pub fn resolve_candidates(&self, model: &dyn SourceModel, scope: &Scope) -> Vec<DeclId> {
        let classes = model.find_classes(&self.owner().qualified_name(), scope);
        let target = self.target();

        let mut candidates = Vec::new();
        for class in classes {
            if target == Target::Class {
                candidates.push(class);
                continue;
            }
            for member in model.members(class) {
                let Some(decl) = model.declaration(member) else {
                    continue;
                };
                match target {
                    Target::Class => {}
                    Target::Constructors => {
                        if decl.is_constructor {
                            candidates.push(member);
                        }
                    }
                    Target::Member(kind, name) => {
                        if decl.kind == kind && !decl.is_constructor && decl.simple_name == name {
                            candidates.push(member);
                        }
                    }
                    Target::ConstructorParameter(parameter) => {
                        if decl.is_constructor {
                            candidates.extend(named_parameters(model, &decl.parameters, parameter));
                        }
                    }
                    Target::MethodParameter(method, parameter) => {
                        if decl.kind == DeclarationKind::Method
                            && !decl.is_constructor
                            && decl.simple_name == method
                        {
                            candidates.extend(named_parameters(model, &decl.parameters, parameter));
                        }
                    }
                }
            }
        }
        candidates
    }

    /// Encode as `[tag u8][fields]`
    pub fn encode(&self) -> Vec<u8> {
        let mut w = RecordWriter::with_tag(self.data_type().tag());
        match self {
            IndexValue::InjectedConstructor { class }
            | IndexValue::AssistedInjectConstructor { class }
            | IndexValue::AssistedFactoryClass { class } => {
                w.write_class_id(class);
            }
            IndexValue::InjectedConstructorParameter { class, parameter }
            | IndexValue::AssistedInjectConstructorUnassistedParameter { class, parameter } => {
                w.write_class_id(class);
                w.write_str(parameter);
            }
            IndexValue::InjectedField { class, field: name }
            | IndexValue::ComponentProvisionProperty {
                class,
                property: name,
            }
            | IndexValue::EntryPointProperty {
                class,
                property: name,
            }
            | IndexValue::ProvidesMethod {
                class,
                method: name,
            }
            | IndexValue::ComponentProvisionMethod {
                class,
                method: name,
            }
            | IndexValue::EntryPointMethod {
                class,
                method: name,
            }
            | IndexValue::AssistedFactoryMethod {
                class,
                method: name,
            }
            | IndexValue::BindsInstanceBuilderMethod {
                class,
                method: name,
            }
            | IndexValue::BindsOptionalOfMethod {
                class,
                method: name,
            } => {
                w.write_class_id(class);
                w.write_str(name);
            }
            IndexValue::ProvidesMethodParameter {
                class,
                method,
                parameter,
            }
            | IndexValue::BindsInstanceFactoryMethodParameter {
                class,
                method,
                parameter,
            } => {
                w.write_class_id(class);
                w.write_str(method);
                w.write_str(parameter);
            }
            IndexValue::ComponentWithModule {
                component: a,
                module: b,
            }
            | IndexValue::ComponentWithDependency {
                component: a,
                dependency: b,
            }
            | IndexValue::SubcomponentWithModule {
                subcomponent: a,
                module: b,
            }
            | IndexValue::ModuleWithInclude {
                module: a,
                included: b,
            }
            | IndexValue::ModuleWithSubcomponent {
                module: a,
                subcomponent: b,
            } => {
                w.write_class_id(a);
                w.write_class_id(b);
            }
        }
        w.into_bytes()
    }
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({}", self.data_type(), self.owner())?;
        match self.target() {
            Target::Class | Target::Constructors => {}
            Target::Member(_, name) | Target::ConstructorParameter(name) => {
                write!(f, ".{}", name)?
            }
            Target::MethodParameter(method, parameter) => {
                write!(f, ".{}({})", method, parameter)?
            }
        }
        if let Some(linked) = self.linked_class() {
            write!(f, " -> {}", linked)?;
        }
        f.write_str(")")
    }
}

fn named_parameters<'a>(
    model: &'a dyn SourceModel,
    parameters: &'a [DeclId],
    name: &'a str,
) -> impl Iterator<Item = DeclId> + 'a {
    parameters.iter().copied().filter(move |p| {
        model
            .declaration(*p)
            .is_some_and(|decl| decl.simple_name == name)
    })
}

/// Decode the tag byte of a record
pub fn read_data_type(reader: &mut RecordReader<'_>) -> Result<DataType, CodecError> {
    let tag = reader.read_u8()?;
    DataType::from_tag(tag).ok_or(CodecError::UnknownTag(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProjectModel;
    use serde_json::json;

    fn class(qualified: &str) -> ClassId {
        ClassId::from_qualified(qualified)
    }

    #[test]
    fn test_tags_are_stable() {
        for (i, data_type) in DataType::ALL.iter().enumerate() {
            assert_eq!(data_type.tag() as usize, i + 1);
            assert_eq!(DataType::from_tag(data_type.tag()), Some(*data_type));
        }
        assert_eq!(DataType::from_tag(0), None);
        assert_eq!(DataType::from_tag(22), None);
    }

    #[test]
    fn test_element_roles() {
        assert_eq!(
            DataType::InjectedConstructor.element_role(),
            ElementRole::Provider
        );
        assert_eq!(
            DataType::ProvidesMethodParameter.element_role(),
            ElementRole::Consumer
        );
        assert_eq!(
            DataType::SubcomponentWithModule.element_role(),
            ElementRole::Subcomponent
        );
        assert_eq!(
            DataType::AssistedFactoryMethod.element_role(),
            ElementRole::AssistedFactoryMethod
        );
    }

    #[test]
    fn test_encode_layout() {
        let value = IndexValue::ProvidesMethod {
            class: class("a.M"),
            method: "provide".to_string(),
        };
        assert_eq!(value.encode(), b"\x04\x01\x01a\x01M\x07provide".to_vec());
    }

    #[test]
    fn test_display() {
        let value = IndexValue::ComponentWithModule {
            component: class("a.C"),
            module: class("a.M"),
        };
        assert_eq!(value.to_string(), "ComponentWithModule(a.C -> a.M)");

        let value = IndexValue::ProvidesMethodParameter {
            class: class("a.M"),
            method: "provide".to_string(),
            parameter: "pump".to_string(),
        };
        assert_eq!(value.to_string(), "ProvidesMethodParameter(a.M.provide(pump))");
    }

    #[test]
    fn test_resolve_candidates() {
        let model = ProjectModel::from_json(json!({
            "files": [{
                "path": "a/M.java",
                "package": "a",
                "classes": [{
                    "name": "M",
                    "members": [
                        {"kind": "constructor", "parameters": [{"name": "x", "type": "a.X"}]},
                        {"kind": "method", "name": "provide", "type": "a.H",
                         "parameters": [{"name": "pump", "type": "a.P"}]},
                        {"kind": "method", "name": "provide", "type": "a.H"},
                        {"kind": "field", "name": "provide", "type": "a.H"}
                    ]
                }]
            }]
        }))
        .unwrap();
        let scope = Scope::project();

        let methods = IndexValue::ProvidesMethod {
            class: class("a.M"),
            method: "provide".to_string(),
        };
        assert_eq!(methods.resolve_candidates(&model, &scope).len(), 2);

        let field = IndexValue::InjectedField {
            class: class("a.M"),
            field: "provide".to_string(),
        };
        assert_eq!(field.resolve_candidates(&model, &scope).len(), 1);

        let ctor_param = IndexValue::InjectedConstructorParameter {
            class: class("a.M"),
            parameter: "x".to_string(),
        };
        assert_eq!(ctor_param.resolve_candidates(&model, &scope).len(), 1);

        let param = IndexValue::ProvidesMethodParameter {
            class: class("a.M"),
            method: "provide".to_string(),
            parameter: "pump".to_string(),
        };
        assert_eq!(param.resolve_candidates(&model, &scope).len(), 1);

        let stale = IndexValue::InjectedConstructor {
            class: class("a.Gone"),
        };
        assert!(stale.resolve_candidates(&model, &scope).is_empty());

        let out_of_scope = Scope::files(["b/Other.java"]);
        assert!(methods.resolve_candidates(&model, &out_of_scope).is_empty());
    }
}
