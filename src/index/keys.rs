//! Index key computation.
//!
//! A key is always the simple name of the outermost relevant type after
//! primitive normalization. Indexing keys a declaration by the type it spells;
//! queries expand that into every key a complementary declaration could have
//! been stored under.

use crate::model::types::{OPTIONAL_KEY, WRAPPER_KEYS};
use crate::model::{Declaration, Scope, SourceModel, TypeRef};

/// Key for a declaration's own type, honouring a spelled type alias
pub fn declaration_key(decl: &Declaration) -> Option<String> {
    decl.type_key()
}

/// Keys under which consumers of a provided type `ty` may have been indexed:
/// the type itself, `Lazy` and `Provider` wrappers, known aliases, and
/// `Optional` when the provider is an optional binding.
pub fn provider_query_keys(
    model: &dyn SourceModel,
    ty: &TypeRef,
    optional_binding: bool,
    include_aliases: bool,
    scope: &Scope,
) -> Vec<String> {
    let mut keys = Vec::new();
    push_unique(&mut keys, ty.index_key());
    for wrapper in WRAPPER_KEYS {
        push_unique(&mut keys, (*wrapper).to_string());
    }
    if optional_binding {
        push_unique(&mut keys, OPTIONAL_KEY.to_string());
    }
    if include_aliases {
        for alias in model.type_aliases(ty.unboxed().name(), scope) {
            push_unique(&mut keys, alias);
        }
    }
    keys
}

/// Keys under which providers of a consumed type `ty` may have been indexed:
/// the type with `Provider<>` and then `Lazy<>` stripped, the inner type of an
/// `Optional<>` with the same stripping, and known aliases of both.
pub fn consumer_query_keys(
    model: &dyn SourceModel,
    ty: &TypeRef,
    include_aliases: bool,
    scope: &Scope,
) -> Vec<String> {
    let mut keys = Vec::new();
    let unwrapped = ty.unwrap_dependency();
    push_unique(&mut keys, unwrapped.index_key());
    let inner = unwrapped.optional_inner().map(TypeRef::unwrap_dependency);
    if let Some(inner) = &inner {
        push_unique(&mut keys, inner.index_key());
    }
    if include_aliases {
        for target in std::iter::once(&unwrapped).chain(inner.as_ref()) {
            for alias in model.type_aliases(target.unboxed().name(), scope) {
                push_unique(&mut keys, alias);
            }
        }
    }
    keys
}

/// Keys for a class referenced by simple name (modules, components, ...)
pub fn class_query_keys(
    model: &dyn SourceModel,
    ty: &TypeRef,
    include_aliases: bool,
    scope: &Scope,
) -> Vec<String> {
    let mut keys = vec![ty.index_key()];
    if include_aliases {
        for alias in model.type_aliases(ty.name(), scope) {
            push_unique(&mut keys, alias);
        }
    }
    keys
}

fn push_unique(keys: &mut Vec<String>, key: String) {
    if !keys.contains(&key) {
        keys.push(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProjectModel;
    use serde_json::json;

    fn ty(text: &str) -> TypeRef {
        TypeRef::parse(text).unwrap()
    }

    fn model() -> ProjectModel {
        ProjectModel::from_json(json!({
            "files": [{
                "path": "a/Aliases.kt",
                "package": "a",
                "aliases": [{"name": "HeaterAlias", "target": "a.Heater"}]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_provider_keys() {
        let model = model();
        let keys = provider_query_keys(&model, &ty("a.Heater"), false, true, &Scope::project());
        assert_eq!(keys, vec!["Heater", "Lazy", "Provider", "HeaterAlias"]);

        let keys = provider_query_keys(&model, &ty("a.Heater"), true, false, &Scope::project());
        assert_eq!(keys, vec!["Heater", "Lazy", "Provider", "Optional"]);
    }

    #[test]
    fn test_consumer_keys_strip_wrappers() {
        let model = model();
        let scope = Scope::project();
        let keys = consumer_query_keys(
            &model,
            &ty("javax.inject.Provider<dagger.Lazy<a.Heater>>"),
            true,
            &scope,
        );
        assert_eq!(keys, vec!["Heater", "HeaterAlias"]);

        // Lazy<Provider<T>> only strips the outer Lazy
        let keys = consumer_query_keys(
            &model,
            &ty("dagger.Lazy<javax.inject.Provider<a.Heater>>"),
            false,
            &scope,
        );
        assert_eq!(keys, vec!["Provider"]);
    }

    #[test]
    fn test_consumer_keys_optional() {
        let model = model();
        let keys = consumer_query_keys(
            &model,
            &ty("java.util.Optional<a.Heater>"),
            true,
            &Scope::project(),
        );
        assert_eq!(keys, vec!["Optional", "Heater", "HeaterAlias"]);
    }

    #[test]
    fn test_consumer_keys_optional_of_wrapped_type() {
        let model = model();
        let scope = Scope::project();
        for text in [
            "java.util.Optional<javax.inject.Provider<a.Heater>>",
            "java.util.Optional<dagger.Lazy<a.Heater>>",
            "com.google.common.base.Optional<javax.inject.Provider<dagger.Lazy<a.Heater>>>",
        ] {
            let keys = consumer_query_keys(&model, &ty(text), false, &scope);
            assert_eq!(keys, vec!["Optional", "Heater"], "{}", text);
        }
    }

    #[test]
    fn test_primitive_keys_normalized() {
        let model = model();
        let scope = Scope::project();
        assert_eq!(
            consumer_query_keys(&model, &ty("int"), false, &scope),
            vec!["Int"]
        );
        assert_eq!(
            consumer_query_keys(&model, &ty("java.lang.Character"), false, &scope),
            vec!["Char"]
        );
    }
}
