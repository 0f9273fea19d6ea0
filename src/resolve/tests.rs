use super::*;
use crate::concepts::test_support::find;
use crate::indexing::IndexingEngine;
use crate::model::ProjectModel;
use serde_json::{json, Value};

struct Fixture {
    model: ProjectModel,
    store: IndexStore,
    registry: ConceptRegistry,
}

impl Fixture {
    fn new(facts: Value) -> Self {
        let model = ProjectModel::from_json(facts).unwrap();
        let registry = ConceptRegistry::new();
        let store = IndexStore::new();
        IndexingEngine::new(&registry)
            .with_parallel(false)
            .index_project(&model, &store, true);
        Self {
            model,
            store,
            registry,
        }
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.model, &self.store, &self.registry)
    }

    fn element(&self, path: &str) -> Element {
        self.resolver()
            .identify(find(&self.model, path))
            .unwrap_or_else(|| panic!("{} is not a DI element", path))
    }

    fn related(&self, path: &str) -> Vec<DeclId> {
        self.resolver()
            .related_elements(&self.element(path))
            .unwrap()
            .into_iter()
            .map(|e| e.decl)
            .collect()
    }

    fn related_with(&self, path: &str, relation: Relation) -> Vec<DeclId> {
        self.resolver()
            .related_items(&self.element(path))
            .unwrap()
            .into_iter()
            .filter(|(r, _)| *r == relation)
            .map(|(_, e)| e.decl)
            .collect()
    }

    fn id(&self, path: &str) -> DeclId {
        find(&self.model, path)
    }
}

fn inject() -> Value {
    json!([{"name": "javax.inject.Inject"}])
}

fn class_list(annotation: &str, attr: &str, classes: &[&str]) -> Value {
    let list: Vec<Value> = classes.iter().map(|c| json!({"class": c})).collect();
    let mut args = serde_json::Map::new();
    args.insert(attr.to_string(), json!({ "array": list }));
    json!({"name": annotation, "args": args})
}

fn coffee() -> Value {
    json!({
        "files": [{
            "path": "a/Heater.java",
            "package": "a",
            "classes": [{
                "name": "Heater",
                "members": [{"kind": "constructor", "annotations": inject()}]
            }]
        }, {
            "path": "a/Thermosiphon.java",
            "package": "a",
            "classes": [{
                "name": "Thermosiphon",
                "members": [{
                    "kind": "constructor",
                    "annotations": inject(),
                    "parameters": [{"name": "h", "type": "a.Heater"}]
                }]
            }]
        }]
    })
}

#[test]
fn test_injected_constructor_pair() {
    let fixture = Fixture::new(coffee());

    assert_eq!(
        fixture.related("a.Heater#<init>"),
        vec![fixture.id("a.Thermosiphon#<init>(h)")]
    );
    assert_eq!(
        fixture.related_with("a.Thermosiphon#<init>(h)", Relation::Providers),
        vec![fixture.id("a.Heater#<init>")]
    );
}

#[test]
fn test_provides_method_exposed_by_component() {
    let fixture = Fixture::new(json!({
        "files": [{
            "path": "a/CoffeeModule.java",
            "package": "a",
            "classes": [{
                "name": "CoffeeModule",
                "annotations": [{"name": "dagger.Module"}],
                "members": [{
                    "kind": "method", "name": "provide", "type": "a.Heater",
                    "annotations": [{"name": "dagger.Provides"}],
                    "parameters": [{"name": "p", "type": "a.Pump"}]
                }]
            }]
        }, {
            "path": "a/CoffeeShop.java",
            "package": "a",
            "classes": [{
                "name": "CoffeeShop",
                "annotations": [class_list("dagger.Component", "modules", &["a.CoffeeModule"])],
                "members": [{"kind": "method", "name": "heater", "type": "a.Heater"}]
            }]
        }]
    }));

    assert_eq!(
        fixture.related("a.CoffeeShop#heater"),
        vec![fixture.id("a.CoffeeModule#provide")]
    );
    assert_eq!(
        fixture.related_with("a.CoffeeModule#provide", Relation::ExposedByComponents),
        vec![fixture.id("a.CoffeeShop#heater")]
    );
    assert_eq!(
        fixture.related_with("a.CoffeeShop", Relation::Modules),
        vec![fixture.id("a.CoffeeModule")]
    );
    assert_eq!(
        fixture.related_with("a.CoffeeModule", Relation::IncludedInComponents),
        vec![fixture.id("a.CoffeeShop")]
    );
}

#[test]
fn test_binds_optional_of_only_matches_optional_requests() {
    let fixture = Fixture::new(json!({
        "files": [{
            "path": "a/HeaterModule.java",
            "package": "a",
            "classes": [{
                "name": "HeaterModule",
                "annotations": [{"name": "dagger.Module"}],
                "members": [{
                    "kind": "method", "name": "bindHeater", "type": "a.Heater",
                    "annotations": [{"name": "dagger.BindsOptionalOf"}]
                }]
            }, {
                "name": "Maker",
                "members": [{
                    "kind": "constructor",
                    "annotations": inject(),
                    "parameters": [
                        {"name": "maybe", "type": "java.util.Optional<a.Heater>"},
                        {"name": "plain", "type": "a.Heater"}
                    ]
                }]
            }]
        }]
    }));

    let binding = fixture.id("a.HeaterModule#bindHeater");
    assert_eq!(fixture.related("a.Maker#<init>(maybe)"), vec![binding]);
    assert!(fixture.related("a.Maker#<init>(plain)").is_empty());
    assert_eq!(
        fixture.related("a.HeaterModule#bindHeater"),
        vec![fixture.id("a.Maker#<init>(maybe)")]
    );
}

#[test]
fn test_optional_of_wrapped_type_matches_optional_binding() {
    let fixture = Fixture::new(json!({
        "files": [{
            "path": "a/HeaterModule.java",
            "package": "a",
            "classes": [{
                "name": "HeaterModule",
                "annotations": [{"name": "dagger.Module"}],
                "members": [{
                    "kind": "method", "name": "bindHeater", "type": "a.Heater",
                    "annotations": [{"name": "dagger.BindsOptionalOf"}]
                }]
            }, {
                "name": "Maker",
                "members": [{
                    "kind": "constructor",
                    "annotations": inject(),
                    "parameters": [
                        {"name": "provider",
                         "type": "java.util.Optional<javax.inject.Provider<a.Heater>>"},
                        {"name": "lazy", "type": "java.util.Optional<dagger.Lazy<a.Heater>>"},
                        {"name": "both",
                         "type": "java.util.Optional<javax.inject.Provider<dagger.Lazy<a.Heater>>>"},
                        {"name": "inverted",
                         "type": "java.util.Optional<dagger.Lazy<javax.inject.Provider<a.Heater>>>"}
                    ]
                }]
            }]
        }]
    }));

    let binding = fixture.id("a.HeaterModule#bindHeater");
    assert_eq!(fixture.related("a.Maker#<init>(provider)"), vec![binding]);
    assert_eq!(fixture.related("a.Maker#<init>(lazy)"), vec![binding]);
    assert_eq!(fixture.related("a.Maker#<init>(both)"), vec![binding]);
    assert!(fixture.related("a.Maker#<init>(inverted)").is_empty());
    assert_eq!(
        fixture.related("a.HeaterModule#bindHeater"),
        vec![
            fixture.id("a.Maker#<init>(provider)"),
            fixture.id("a.Maker#<init>(lazy)"),
            fixture.id("a.Maker#<init>(both)"),
        ]
    );
}

#[test]
fn test_generic_class_constructor_provides_any_parameterization() {
    let fixture = Fixture::new(json!({
        "files": [{
            "path": "a/Box.java",
            "package": "a",
            "classes": [{
                "name": "Box",
                "members": [{"kind": "constructor", "annotations": inject()}]
            }, {
                "name": "User",
                "members": [{
                    "kind": "constructor",
                    "annotations": inject(),
                    "parameters": [
                        {"name": "b", "type": "a.Box<a.Pump>"},
                        {"name": "lazy", "type": "dagger.Lazy<a.Box<a.Heater>>"}
                    ]
                }]
            }]
        }]
    }));

    let ctor = fixture.id("a.Box#<init>");
    assert_eq!(fixture.related("a.User#<init>(b)"), vec![ctor]);
    assert_eq!(fixture.related("a.User#<init>(lazy)"), vec![ctor]);
    assert_eq!(
        fixture.related("a.Box#<init>"),
        vec![fixture.id("a.User#<init>(b)"), fixture.id("a.User#<init>(lazy)")]
    );
}

#[test]
fn test_unresolvable_parameter_only_affects_itself() {
    let fixture = Fixture::new(json!({
        "files": [{
            "path": "a/Pump.java",
            "package": "a",
            "classes": [{
                "name": "Pump",
                "members": [{"kind": "constructor", "annotations": inject()}]
            }, {
                "name": "Brewer",
                "members": [{
                    "kind": "constructor",
                    "annotations": inject(),
                    "parameters": [
                        {"name": "ghost"},
                        {"name": "pump", "type": "a.Pump"}
                    ]
                }]
            }]
        }]
    }));

    let resolver = fixture.resolver();
    assert!(resolver.identify(fixture.id("a.Brewer#<init>(ghost)")).is_none());
    assert_eq!(
        fixture.related("a.Brewer#<init>(pump)"),
        vec![fixture.id("a.Pump#<init>")]
    );
    assert_eq!(
        fixture.related("a.Pump#<init>"),
        vec![fixture.id("a.Brewer#<init>(pump)")]
    );
}

#[test]
fn test_wrapped_consumers() {
    let fixture = Fixture::new(json!({
        "files": [{
            "path": "a/Heater.java",
            "package": "a",
            "classes": [{
                "name": "Heater",
                "members": [{"kind": "constructor", "annotations": inject()}]
            }, {
                "name": "Maker",
                "members": [{
                    "kind": "constructor",
                    "annotations": inject(),
                    "parameters": [
                        {"name": "lazy", "type": "dagger.Lazy<a.Heater>"},
                        {"name": "both", "type": "javax.inject.Provider<dagger.Lazy<a.Heater>>"},
                        {"name": "wrong", "type": "dagger.Lazy<javax.inject.Provider<a.Heater>>"}
                    ]
                }]
            }]
        }]
    }));

    let consumers = fixture.related("a.Heater#<init>");
    assert_eq!(
        consumers,
        vec![
            fixture.id("a.Maker#<init>(lazy)"),
            fixture.id("a.Maker#<init>(both)")
        ]
    );
    assert!(fixture.related("a.Maker#<init>(wrong)").is_empty());
}

#[test]
fn test_lazy_provider_is_not_double_counted() {
    let fixture = Fixture::new(json!({
        "files": [{
            "path": "a/M.java",
            "package": "a",
            "classes": [{
                "name": "M",
                "annotations": [{"name": "dagger.Module"}],
                "members": [{
                    "kind": "method", "name": "heater", "type": "a.Heater",
                    "annotations": [{"name": "dagger.Provides"}]
                }, {
                    "kind": "method", "name": "lazyHeater", "type": "dagger.Lazy<a.Heater>",
                    "annotations": [{"name": "dagger.Provides"}]
                }]
            }, {
                "name": "Maker",
                "members": [{
                    "kind": "field", "name": "heater", "type": "dagger.Lazy<a.Heater>",
                    "annotations": inject()
                }]
            }]
        }]
    }));

    assert_eq!(
        fixture.related("a.Maker#heater"),
        vec![fixture.id("a.M#heater")]
    );
    assert!(fixture.related("a.M#lazyHeater").is_empty());
}

#[test]
fn test_provider_consumer_symmetry() {
    let fixture = Fixture::new(coffee());
    let resolver = fixture.resolver();

    for path in ["a.Heater#<init>", "a.Thermosiphon#<init>(h)"] {
        let element = fixture.element(path);
        for related in resolver.related_elements(&element).unwrap() {
            let back = resolver.related_elements(&related).unwrap();
            assert!(
                back.contains(&element),
                "{} is related to {} but not the other way",
                element,
                related
            );
        }
    }
}

#[test]
fn test_simple_name_collision_is_filtered() {
    let fixture = Fixture::new(json!({
        "files": [{
            "path": "a/Heater.java",
            "package": "a",
            "classes": [{
                "name": "Heater",
                "members": [{"kind": "constructor", "annotations": inject()}]
            }]
        }, {
            "path": "b/Heater.java",
            "package": "b",
            "classes": [{
                "name": "Heater",
                "members": [{"kind": "constructor", "annotations": inject()}]
            }, {
                "name": "Maker",
                "members": [{
                    "kind": "constructor",
                    "annotations": inject(),
                    "parameters": [{"name": "heater", "type": "b.Heater"}]
                }]
            }]
        }]
    }));

    assert_eq!(
        fixture.related("b.Maker#<init>(heater)"),
        vec![fixture.id("b.Heater#<init>")]
    );
    assert!(fixture.related("a.Heater#<init>").is_empty());
}

#[test]
fn test_qualifiers_must_match() {
    let named = |value: &str| {
        json!({"name": "javax.inject.Named", "qualifier": true,
               "args": {"value": {"string": value}}})
    };
    let fixture = Fixture::new(json!({
        "files": [{
            "path": "a/M.java",
            "package": "a",
            "classes": [{
                "name": "M",
                "annotations": [{"name": "dagger.Module"}],
                "members": [{
                    "kind": "method", "name": "hot", "type": "a.Heater",
                    "annotations": [{"name": "dagger.Provides"}, named("hot")]
                }, {
                    "kind": "method", "name": "cold", "type": "a.Heater",
                    "annotations": [{"name": "dagger.Provides"}, named("cold")]
                }]
            }, {
                "name": "Maker",
                "members": [{
                    "kind": "constructor",
                    "annotations": inject(),
                    "parameters": [{"name": "heater", "type": "a.Heater",
                                    "annotations": [named("hot")]}]
                }]
            }]
        }]
    }));

    assert_eq!(
        fixture.related("a.Maker#<init>(heater)"),
        vec![fixture.id("a.M#hot")]
    );
    assert!(fixture.related("a.M#cold").is_empty());
}

fn graph() -> Value {
    json!({
        "files": [{
            "path": "a/App.java",
            "package": "a",
            "classes": [{
                "name": "AppComponent",
                "annotations": [
                    class_list("dagger.Component", "modules", &["a.AppModule"])
                ]
            }, {
                "name": "AppModule",
                "annotations": [
                    class_list("dagger.Module", "subcomponents", &["a.ActivityComponent"])
                ]
            }, {
                "name": "PluginComponent",
                "annotations": [
                    class_list("dagger.Component", "dependencies", &["a.AppComponent"])
                ]
            }]
        }, {
            "path": "a/Activity.java",
            "package": "a",
            "classes": [{
                "name": "ActivityComponent",
                "annotations": [
                    class_list("dagger.Subcomponent", "modules", &["a.ActivityModule"])
                ]
            }, {
                "name": "ActivityModule",
                "annotations": [
                    class_list("dagger.Module", "includes", &["a.SharedModule"])
                ]
            }, {
                "name": "SharedModule",
                "annotations": [{"name": "dagger.Module"}]
            }]
        }]
    })
}

#[test]
fn test_subcomponent_parent_chain() {
    let fixture = Fixture::new(graph());
    assert_eq!(
        fixture.related_with("a.ActivityComponent", Relation::ParentComponents),
        vec![fixture.id("a.AppComponent")]
    );
    assert_eq!(
        fixture.related_with("a.ActivityComponent", Relation::Modules),
        vec![fixture.id("a.ActivityModule")]
    );
    assert_eq!(
        fixture.related_with("a.AppComponent", Relation::Subcomponents),
        vec![fixture.id("a.ActivityComponent")]
    );
}

#[test]
fn test_module_relations() {
    let fixture = Fixture::new(graph());
    assert_eq!(
        fixture.related_with("a.AppModule", Relation::IncludedInComponents),
        vec![fixture.id("a.AppComponent")]
    );
    assert_eq!(
        fixture.related_with("a.AppModule", Relation::Subcomponents),
        vec![fixture.id("a.ActivityComponent")]
    );
    assert_eq!(
        fixture.related_with("a.ActivityModule", Relation::IncludedInComponents),
        vec![fixture.id("a.ActivityComponent")]
    );
    assert_eq!(
        fixture.related_with("a.SharedModule", Relation::IncludedInModules),
        vec![fixture.id("a.ActivityModule")]
    );
    assert_eq!(
        fixture.related_with("a.ActivityModule", Relation::Modules),
        vec![fixture.id("a.SharedModule")]
    );
}

#[test]
fn test_dependent_components() {
    let fixture = Fixture::new(graph());
    assert_eq!(
        fixture.related_with("a.AppComponent", Relation::DependentComponents),
        vec![fixture.id("a.PluginComponent")]
    );
    assert!(fixture
        .related_with("a.PluginComponent", Relation::DependentComponents)
        .is_empty());
}

#[test]
fn test_assisted_pair() {
    let fixture = Fixture::new(json!({
        "files": [{
            "path": "a/Brewer.kt",
            "package": "a",
            "classes": [{
                "name": "Brewer",
                "members": [{
                    "kind": "constructor",
                    "annotations": [{"name": "dagger.assisted.AssistedInject"}],
                    "parameters": [
                        {"name": "size", "type": "int",
                         "annotations": [{"name": "dagger.assisted.Assisted"}]}
                    ]
                }]
            }, {
                "name": "BrewerFactory",
                "annotations": [{"name": "dagger.assisted.AssistedFactory"}],
                "members": [{
                    "kind": "method", "name": "create", "type": "a.Brewer",
                    "parameters": [{"name": "size", "type": "int"}]
                }]
            }]
        }]
    }));

    assert_eq!(
        fixture.related_with("a.Brewer#<init>", Relation::AssistedFactoryMethods),
        vec![fixture.id("a.BrewerFactory#create")]
    );
    assert_eq!(
        fixture.related_with("a.BrewerFactory#create", Relation::AssistedInjectConstructors),
        vec![fixture.id("a.Brewer#<init>")]
    );
}

#[test]
fn test_type_alias_consumers() {
    let fixture = Fixture::new(json!({
        "files": [{
            "path": "a/Heater.kt",
            "package": "a",
            "aliases": [{"name": "Warmer", "target": "a.Heater"}],
            "classes": [{
                "name": "Heater",
                "members": [{"kind": "constructor", "annotations": inject()}]
            }, {
                "name": "Maker",
                "members": [{
                    "kind": "field", "name": "warmer", "type": "a.Heater", "alias": "Warmer",
                    "annotations": inject()
                }]
            }]
        }]
    }));

    let provider = fixture.element("a.Heater#<init>");
    let with_aliases = fixture.resolver().related_elements(&provider).unwrap();
    assert_eq!(with_aliases.len(), 1);
    assert_eq!(with_aliases[0].decl, fixture.id("a.Maker#warmer"));

    let without = fixture
        .resolver()
        .with_type_aliases(false)
        .related_elements(&provider)
        .unwrap();
    assert!(without.is_empty());
}

#[test]
fn test_scope_limits_results() {
    let fixture = Fixture::new(coffee());
    let provider = fixture.element("a.Heater#<init>");
    let scoped = fixture
        .resolver()
        .with_scope(Scope::files(["a/Heater.java"]))
        .related_elements(&provider)
        .unwrap();
    assert!(scoped.is_empty());
}

#[test]
fn test_identification_ignores_query_scope() {
    let fixture = Fixture::new(json!({
        "files": [{
            "path": "a/AppComponent.java",
            "package": "a",
            "classes": [{
                "name": "AppComponent",
                "annotations": [{"name": "dagger.Component"}],
                "members": [
                    {"kind": "method", "name": "child", "type": "a.Child"},
                    {"kind": "method", "name": "heater", "type": "a.Heater"}
                ]
            }]
        }, {
            "path": "a/Child.java",
            "package": "a",
            "classes": [{"name": "Child", "annotations": [{"name": "dagger.Subcomponent"}]}]
        }]
    }));

    let child = fixture.id("a.AppComponent#child");
    let heater = fixture.id("a.AppComponent#heater");
    let scoped = fixture
        .resolver()
        .with_scope(Scope::files(["a/AppComponent.java"]));
    assert!(scoped.identify(child).is_none());
    assert!(fixture.resolver().identify(child).is_none());
    assert!(scoped.identify(heater).is_some());
}

#[test]
fn test_stale_values_resolve_to_nothing() {
    let fixture = Fixture::new(coffee());

    // Index still mentions Thermosiphon but the model no longer has it
    let smaller = ProjectModel::from_json(json!({
        "files": [{
            "path": "a/Heater.java",
            "package": "a",
            "classes": [{
                "name": "Heater",
                "members": [{"kind": "constructor", "annotations": inject()}]
            }]
        }]
    }))
    .unwrap();
    let resolver = Resolver::new(&smaller, &fixture.store, &fixture.registry);
    let provider = resolver
        .identify(find(&smaller, "a.Heater#<init>"))
        .unwrap();
    assert!(resolver.related_elements(&provider).unwrap().is_empty());
}

#[test]
fn test_summaries() {
    let fixture = Fixture::new(coffee());
    let resolver = fixture.resolver();
    let provider = fixture.element("a.Heater#<init>");

    let summary = resolver.summarize(&provider);
    assert_eq!(summary.role, "provider");
    assert_eq!(summary.kind.as_deref(), Some("injected_constructor"));
    assert_eq!(summary.name, "a.Heater.Heater");
    assert_eq!(summary.ty, "a.Heater");
    assert_eq!(summary.file, "a/Heater.java");

    let items = resolver.related_summaries(&provider).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].label, "Consumers");
    assert_eq!(items[0].element.name, "a.Thermosiphon.Thermosiphon(h)");
}

#[test]
fn test_element_related_elements_delegates() {
    let fixture = Fixture::new(coffee());
    let resolver = fixture.resolver();
    let consumer = fixture.element("a.Thermosiphon#<init>(h)");
    assert_eq!(
        consumer.related_elements(&resolver).unwrap(),
        resolver.related_elements(&consumer).unwrap()
    );
}
