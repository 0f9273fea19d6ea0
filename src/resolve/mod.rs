//! Resolution of related elements.
//!
//! A query starts from an identified [`Element`], computes the keys its
//! counterparts may be indexed under, reads and filters the index, re-resolves
//! the surviving values to live declarations, identifies them and keeps only
//! exact matches. Class relations that are declared on the element itself
//! (a component's modules, a module's includes) are read from its annotations
//! instead of the index.

use std::collections::HashSet;
use std::fmt;

use crate::concepts::annotations::{
    ATTR_INCLUDES, ATTR_MODULES, ATTR_SUBCOMPONENTS, COMPONENT, MODULE, SUBCOMPONENT,
};
use crate::concepts::component::listed_classes;
use crate::concepts::{ConceptRegistry, DeclarationView};
use crate::element::{ConsumerKind, Element, ElementKind, ProviderKind};
use crate::error::CodecError;
use crate::index::keys::{class_query_keys, consumer_query_keys, provider_query_keys};
use crate::index::{DataType, ElementRole, IndexStore, IndexValue};
use crate::model::{ClassId, DeclId, DeclarationKind, Qualifier, Scope, SourceModel};
use crate::types::{ElementSummary, RelatedItem};

/// How a related element is linked to the query element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Providers,
    Consumers,
    ExposedByComponents,
    ExposedByEntryPoints,
    Modules,
    IncludedInComponents,
    IncludedInModules,
    DependentComponents,
    Subcomponents,
    ParentComponents,
    AssistedFactoryMethods,
    AssistedInjectConstructors,
}

impl Relation {
    pub fn label(self) -> &'static str {
        match self {
            Relation::Providers => "Providers",
            Relation::Consumers => "Consumers",
            Relation::ExposedByComponents => "Exposed by components",
            Relation::ExposedByEntryPoints => "Exposed by entry points",
            Relation::Modules => "Modules",
            Relation::IncludedInComponents => "Included in components",
            Relation::IncludedInModules => "Included in modules",
            Relation::DependentComponents => "Dependent components",
            Relation::Subcomponents => "Subcomponents",
            Relation::ParentComponents => "Parent components",
            Relation::AssistedFactoryMethods => "Assisted factory methods",
            Relation::AssistedInjectConstructors => "Assisted inject constructors",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const GRAPH_ROLES: &[ElementRole] = &[ElementRole::Component, ElementRole::Subcomponent];

/// Read path of the engine: identification plus related-element queries
/// against one model, one store and one visibility scope.
pub struct Resolver<'a> {
    model: &'a dyn SourceModel,
    store: &'a IndexStore,
    registry: &'a ConceptRegistry,
    scope: Scope,
    include_aliases: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(
        model: &'a dyn SourceModel,
        store: &'a IndexStore,
        registry: &'a ConceptRegistry,
    ) -> Self {
        Self {
            model,
            store,
            registry,
            scope: Scope::project(),
            include_aliases: true,
        }
    }

    /// Restrict index reads and re-resolution to `scope`
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Also query the keys of known type aliases
    pub fn with_type_aliases(mut self, include_aliases: bool) -> Self {
        self.include_aliases = include_aliases;
        self
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Identify a declaration as a DI element
    pub fn identify(&self, id: DeclId) -> Option<Element> {
        self.registry.identify(self.model, id)
    }

    /// Related elements of `element`, deduplicated, in first-seen order
    pub fn related_elements(&self, element: &Element) -> Result<Vec<Element>, CodecError> {
        let mut seen = HashSet::new();
        Ok(self
            .related_items(element)?
            .into_iter()
            .map(|(_, related)| related)
            .filter(|related| seen.insert(related.clone()))
            .collect())
    }

    /// Related elements of `element`, each labelled with its relation
    pub fn related_items(&self, element: &Element) -> Result<Vec<(Relation, Element)>, CodecError> {
        let mut items = Vec::new();
        match element.kind {
            ElementKind::Provider(kind) => {
                let keys = provider_query_keys(
                    self.model,
                    &element.ty,
                    kind == ProviderKind::BindsOptionalOf,
                    self.include_aliases,
                    &self.scope,
                );
                let values = self.values(&keys, |v| v.element_role() == ElementRole::Consumer)?;
                for consumer in self.elements_from(element, &values, &[ElementRole::Consumer]) {
                    let relation = match consumer.kind {
                        ElementKind::Consumer(ConsumerKind::ProvisionMethod) => {
                            Relation::ExposedByComponents
                        }
                        ElementKind::Consumer(ConsumerKind::EntryPointMethod) => {
                            Relation::ExposedByEntryPoints
                        }
                        _ => Relation::Consumers,
                    };
                    items.push((relation, consumer));
                }
            }
            ElementKind::Consumer(_) => {
                let keys = consumer_query_keys(
                    self.model,
                    &element.ty,
                    self.include_aliases,
                    &self.scope,
                );
                let values = self.values(&keys, |v| v.element_role() == ElementRole::Provider)?;
                for provider in self.elements_from(element, &values, &[ElementRole::Provider]) {
                    items.push((Relation::Providers, provider));
                }
            }
            ElementKind::Module => {
                let class = self.class_id(element.decl);
                let included_in = self.linked_to(element, class.as_ref(), |t| {
                    matches!(
                        t,
                        DataType::ComponentWithModule | DataType::SubcomponentWithModule
                    )
                })?;
                for graph in self.elements_from(element, &included_in, GRAPH_ROLES) {
                    items.push((Relation::IncludedInComponents, graph));
                }
                let including = self
                    .linked_to(element, class.as_ref(), |t| t == DataType::ModuleWithInclude)?;
                for module in self.elements_from(element, &including, &[ElementRole::Module]) {
                    items.push((Relation::IncludedInModules, module));
                }
                for module in self.listed(element, MODULE, ATTR_INCLUDES, ElementRole::Module) {
                    items.push((Relation::Modules, module));
                }
                let subcomponents =
                    self.listed(element, MODULE, ATTR_SUBCOMPONENTS, ElementRole::Subcomponent);
                for sub in subcomponents {
                    items.push((Relation::Subcomponents, sub));
                }
            }
            ElementKind::Component => {
                let modules = self.listed(element, COMPONENT, ATTR_MODULES, ElementRole::Module);
                for sub in self.subcomponents_of(element, &modules) {
                    items.push((Relation::Subcomponents, sub));
                }
                items.extend(modules.into_iter().map(|m| (Relation::Modules, m)));

                let class = self.class_id(element.decl);
                let dependents = self.linked_to(element, class.as_ref(), |t| {
                    t == DataType::ComponentWithDependency
                })?;
                let roles = [ElementRole::Component];
                for component in self.elements_from(element, &dependents, &roles) {
                    items.push((Relation::DependentComponents, component));
                }
            }
            ElementKind::Subcomponent => {
                let modules = self.listed(element, SUBCOMPONENT, ATTR_MODULES, ElementRole::Module);
                for sub in self.subcomponents_of(element, &modules) {
                    items.push((Relation::Subcomponents, sub));
                }
                items.extend(modules.into_iter().map(|m| (Relation::Modules, m)));
                for parent in self.parents_of(element)? {
                    items.push((Relation::ParentComponents, parent));
                }
            }
            ElementKind::AssistedInjectConstructor => {
                let keys =
                    class_query_keys(self.model, &element.ty, self.include_aliases, &self.scope);
                let values = self.values(&keys, |v| {
                    v.data_type() == DataType::AssistedFactoryMethod
                })?;
                for method in
                    self.elements_from(element, &values, &[ElementRole::AssistedFactoryMethod])
                {
                    items.push((Relation::AssistedFactoryMethods, method));
                }
            }
            ElementKind::AssistedFactoryMethod => {
                let keys =
                    class_query_keys(self.model, &element.ty, self.include_aliases, &self.scope);
                let values = self.values(&keys, |v| {
                    v.data_type() == DataType::AssistedInjectConstructor
                })?;
                for constructor in
                    self.elements_from(element, &values, &[ElementRole::AssistedInjectConstructor])
                {
                    items.push((Relation::AssistedInjectConstructors, constructor));
                }
            }
        }

        let mut seen = HashSet::new();
        items.retain(|(relation, related)| seen.insert((*relation, related.decl)));
        tracing::debug!("Resolved {} related elements for {}", items.len(), element);
        Ok(items)
    }

    /// Merged index values for `keys` that pass `accept`, without duplicates
    fn values<F>(&self, keys: &[String], accept: F) -> Result<Vec<IndexValue>, CodecError>
    where
        F: Fn(&IndexValue) -> bool,
    {
        let mut seen = HashSet::new();
        let mut values = Vec::new();
        for key in keys {
            for value in self.store.get(key, &self.scope, self.registry)? {
                if accept(&value) && seen.insert(value.clone()) {
                    values.push(value);
                }
            }
        }
        Ok(values)
    }

    /// Re-resolve, identify and exact-match index values
    fn elements_from(
        &self,
        source: &Element,
        values: &[IndexValue],
        roles: &[ElementRole],
    ) -> Vec<Element> {
        let mut seen = HashSet::new();
        let mut elements = Vec::new();
        for value in values {
            for candidate in value.resolve_candidates(self.model, &self.scope) {
                let Some(element) = self.identify(candidate) else {
                    continue;
                };
                if roles.contains(&element.role())
                    && source.filter_resolve_candidate(&element)
                    && seen.insert(element.clone())
                {
                    elements.push(element);
                }
            }
        }
        elements
    }

    /// Edge values of the accepted data types whose linked class is `class`
    fn linked_to<F>(
        &self,
        element: &Element,
        class: Option<&ClassId>,
        accept: F,
    ) -> Result<Vec<IndexValue>, CodecError>
    where
        F: Fn(DataType) -> bool,
    {
        let Some(class) = class else {
            return Ok(Vec::new());
        };
        let qualified = class.qualified_name();
        let keys = class_query_keys(self.model, &element.ty, self.include_aliases, &self.scope);
        self.values(&keys, |v| {
            accept(v.data_type())
                && v.linked_class()
                    .is_some_and(|linked| linked.qualified_name() == qualified)
        })
    }

    /// Classes named in the element's own `annotation(attr = ...)`, identified
    /// and restricted to `role`
    fn listed(
        &self,
        element: &Element,
        annotation: &str,
        attr: &str,
        role: ElementRole,
    ) -> Vec<Element> {
        let Some(view) = DeclarationView::new(self.model, element.decl) else {
            return Vec::new();
        };
        let mut elements = Vec::new();
        for class in listed_classes(&view, annotation, attr) {
            for id in self.model.find_classes(&class.qualified_name(), &self.scope) {
                if let Some(listed) = self.identify(id)
                    && listed.role() == role
                    && element.filter_resolve_candidate(&listed)
                    && !elements.contains(&listed)
                {
                    elements.push(listed);
                }
            }
        }
        elements
    }

    /// Subcomponents declared by any of `modules`
    fn subcomponents_of(&self, element: &Element, modules: &[Element]) -> Vec<Element> {
        let mut subcomponents = Vec::new();
        for module in modules {
            for sub in self.listed(module, MODULE, ATTR_SUBCOMPONENTS, ElementRole::Subcomponent) {
                if sub.decl != element.decl && !subcomponents.contains(&sub) {
                    subcomponents.push(sub);
                }
            }
        }
        subcomponents
    }

    /// Components and subcomponents that install a module declaring this
    /// subcomponent. Subcomponents are indexed against the declaring module,
    /// so this takes two lookups.
    fn parents_of(&self, element: &Element) -> Result<Vec<Element>, CodecError> {
        let class = self.class_id(element.decl);
        let declaring = self.linked_to(element, class.as_ref(), |t| {
            t == DataType::ModuleWithSubcomponent
        })?;
        let modules = self.elements_from(element, &declaring, &[ElementRole::Module]);

        let mut parents = Vec::new();
        for module in &modules {
            let installing = self.linked_to(module, self.class_id(module.decl).as_ref(), |t| {
                matches!(
                    t,
                    DataType::ComponentWithModule | DataType::SubcomponentWithModule
                )
            })?;
            for parent in self.elements_from(element, &installing, GRAPH_ROLES) {
                if !parents.contains(&parent) {
                    parents.push(parent);
                }
            }
        }
        Ok(parents)
    }

    fn class_id(&self, id: DeclId) -> Option<ClassId> {
        self.model.declaration(id)?.class_id.clone()
    }

    /// Serializable summary of an element for query output
    pub fn summarize(&self, element: &Element) -> ElementSummary {
        let file = self
            .model
            .declaration(element.decl)
            .map(|d| d.file.clone())
            .unwrap_or_default();
        ElementSummary {
            role: element.role().as_str().to_string(),
            kind: element.kind.flavour().map(str::to_string),
            name: self.display_name(element.decl),
            ty: element.ty.to_string(),
            qualifier: element.qualifier.as_ref().map(qualifier_text),
            file,
        }
    }

    /// Summaries of [`Resolver::related_items`]
    pub fn related_summaries(&self, element: &Element) -> Result<Vec<RelatedItem>, CodecError> {
        Ok(self
            .related_items(element)?
            .iter()
            .map(|(relation, related)| RelatedItem {
                label: relation.label().to_string(),
                element: self.summarize(related),
            })
            .collect())
    }

    /// `pkg.Class`, `pkg.Class.member` or `pkg.Class.member(parameter)`
    fn display_name(&self, id: DeclId) -> String {
        let Some(decl) = self.model.declaration(id) else {
            return id.to_string();
        };
        if let Some(class) = &decl.class_id {
            return class.qualified_name();
        }
        let container = decl.container.map(|c| self.display_name(c));
        match (decl.kind, container) {
            (DeclarationKind::Parameter, Some(method)) => {
                format!("{}({})", method, decl.simple_name)
            }
            (_, Some(class)) => format!("{}.{}", class, decl.simple_name),
            (_, None) => decl.simple_name.clone(),
        }
    }
}

fn qualifier_text(qualifier: &Qualifier) -> String {
    if qualifier.args.is_empty() {
        return format!("@{}", qualifier.name);
    }
    let args: Vec<String> = qualifier
        .args
        .iter()
        .map(|(key, value)| format!("{}={:?}", key, value))
        .collect();
    format!("@{}({})", qualifier.name, args.join(", "))
}

impl Element {
    /// Related elements of this element, resolved through `resolver`
    pub fn related_elements(&self, resolver: &Resolver<'_>) -> Result<Vec<Element>, CodecError> {
        resolver.related_elements(self)
    }
}

#[cfg(test)]
mod tests;
