//! Composition of all concepts into lookup tables.
//!
//! The registry is built once and never mutated. Indexers and identifiers are
//! kept in registration order, which makes identification reproducible:
//! the first identifier that matches a declaration wins.

use std::collections::HashMap;

use super::assisted::AssistedConcept;
use super::binds_instance::BindsInstanceConcept;
use super::binds_optional_of::BindsOptionalOfConcept;
use super::component::ComponentConcept;
use super::entry_point::EntryPointConcept;
use super::injected_constructor::InjectedConstructorConcept;
use super::injected_field::InjectedFieldConcept;
use super::provides_method::ProvidesMethodConcept;
use super::provision_method::ProvisionMethodConcept;
use super::{Concept, DeclarationView, Decoder, Entries, Identifier, Indexer};
use crate::element::Element;
use crate::error::{CodecError, DaggerIndexError};
use crate::index::{read_data_type, IndexValue, RecordReader};
use crate::model::{DeclId, DeclarationKind, SourceModel};

/// Built-in concepts in precedence order
pub const BUILT_IN_CONCEPTS: &[&dyn Concept] = &[
    &InjectedConstructorConcept,
    &AssistedConcept,
    &ProvidesMethodConcept,
    &BindsOptionalOfConcept,
    &BindsInstanceConcept,
    &InjectedFieldConcept,
    &ComponentConcept,
    &ProvisionMethodConcept,
    &EntryPointConcept,
];

/// Indexers, decoders and identifiers of every registered concept
pub struct ConceptRegistry {
    concepts: Vec<&'static dyn Concept>,
    decoders: HashMap<u8, (Decoder, &'static str)>,
    indexers: HashMap<DeclarationKind, Vec<Indexer>>,
    identifiers: HashMap<DeclarationKind, Vec<Identifier>>,
}

impl ConceptRegistry {
    /// Registry of the built-in concepts
    pub fn new() -> Self {
        Self::with_concepts(BUILT_IN_CONCEPTS)
            .expect("Built-in concepts must use distinct data type tags")
    }

    /// Registry of `concepts`, in the given precedence order. Two concepts
    /// claiming the same data type tag is an error.
    pub fn with_concepts(concepts: &[&'static dyn Concept]) -> Result<Self, DaggerIndexError> {
        let mut decoders: HashMap<u8, (Decoder, &'static str)> = HashMap::new();
        let mut indexers: HashMap<DeclarationKind, Vec<Indexer>> = HashMap::new();
        let mut identifiers: HashMap<DeclarationKind, Vec<Identifier>> = HashMap::new();

        for concept in concepts {
            for (data_type, decoder) in concept.decoders() {
                let tag = data_type.tag();
                if let Some((_, first)) = decoders.get(&tag) {
                    return Err(DaggerIndexError::DuplicateDataType {
                        tag,
                        first: *first,
                        second: concept.name(),
                    });
                }
                decoders.insert(tag, (*decoder, concept.name()));
            }
            for (kind, indexer) in concept.indexers() {
                indexers.entry(*kind).or_default().push(*indexer);
            }
            for (kind, identifier) in concept.identifiers() {
                identifiers.entry(*kind).or_default().push(*identifier);
            }
        }

        tracing::debug!(
            "Registered {} concepts with {} data types",
            concepts.len(),
            decoders.len()
        );

        Ok(Self {
            concepts: concepts.to_vec(),
            decoders,
            indexers,
            identifiers,
        })
    }

    /// Names of the registered concepts, in precedence order
    pub fn concept_names(&self) -> Vec<&'static str> {
        self.concepts.iter().map(|c| c.name()).collect()
    }

    /// Run every indexer registered for the declaration's kind
    pub fn index(&self, view: &DeclarationView<'_>, entries: &mut Entries) {
        if let Some(indexers) = self.indexers.get(&view.kind()) {
            for indexer in indexers {
                indexer(view, entries);
            }
        }
    }

    /// First element any identifier produces for `id`
    pub fn identify(&self, model: &dyn SourceModel, id: DeclId) -> Option<Element> {
        let view = DeclarationView::new(model, id)?;
        self.identifiers
            .get(&view.kind())?
            .iter()
            .find_map(|identifier| identifier(&view))
    }

    /// Decode one `[tag][fields]` record. Unknown tags and leftover bytes are
    /// both incompatibilities.
    pub fn decode(&self, bytes: &[u8]) -> Result<IndexValue, CodecError> {
        let mut reader = RecordReader::new(bytes);
        let data_type = read_data_type(&mut reader)?;
        let (decoder, _) = self
            .decoders
            .get(&data_type.tag())
            .ok_or(CodecError::UnknownTag(data_type.tag()))?;
        let value = decoder(&mut reader)?;
        reader.finish()?;
        Ok(value)
    }
}

impl Default for ConceptRegistry {
    fn default() -> Self {
        Self::new()
    }
}
