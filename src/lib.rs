//! # dagger-index - Concept-driven indexing of Dagger DI relationships
//!
//! Indexes dependency-injection facts declared across a codebase into a
//! persistent reverse index, then answers "what is related to this
//! declaration?" queries: provider and consumer, component and module,
//! subcomponent and parent, assisted factory and constructor.
//!
//! ## Architecture
//!
//! ```text
//!  declaration facts ──► IndexingEngine ──► IndexStore (DGIX file)
//!                          │ ConceptRegistry      │
//!                          ▼                      ▼
//!  declaration ──► identify ──► Element ──► Resolver ──► related Elements
//! ```
//!
//! The write path and the read path share only the store and the binary
//! record format.
//!
//! ## Modules
//!
//! - [`model`]: declaration facts boundary and the JSON-backed [`ProjectModel`]
//! - [`index`]: index values, binary codec, key computation and the store
//! - [`concepts`]: one module per DI concept plus the registry
//! - [`indexing`]: per-file and incremental project indexing
//! - [`element`]: query-time elements and the binding-match predicate
//! - [`resolve`]: related-element resolution
//! - [`client`]: [`DaggerIndex`], the persisted, lock-protected façade
//! - [`config`]: configuration with environment variable support
//! - [`types`]: serializable responses
//! - [`error`]: error types
//! - [`paths`]: platform paths
//!
//! ## Usage Example
//!
//! ```no_run
//! use dagger_index::{DaggerIndex, ProjectModel};
//!
//! fn main() -> anyhow::Result<()> {
//!     let index = DaggerIndex::new()?;
//!     let model = ProjectModel::load(&["facts/".into()])?;
//!     index.index(&model, false)?;
//!
//!     let heater = model.class("com.example.Heater").unwrap();
//!     let response = index.related(&model, heater)?;
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```

/// Persisted index façade with cross-process locking
pub mod client;

/// DI concepts: indexers, decoders and identifiers
pub mod concepts;

/// Configuration management with environment variable overrides
pub mod config;

/// Query-time DI elements
pub mod element;

/// Error types and utilities
pub mod error;

/// Index values, binary encoding and the persistent store
pub mod index;

/// Indexing engine
pub mod indexing;

/// Declaration facts boundary
pub mod model;

/// Platform-specific paths
pub mod paths;

/// Related-element resolution
pub mod resolve;

/// Serializable request/response types
pub mod types;

pub use client::DaggerIndex;
pub use concepts::ConceptRegistry;
pub use config::Config;
pub use element::{Element, ElementKind};
pub use error::DaggerIndexError;
pub use index::{IndexStore, IndexValue};
pub use indexing::IndexingEngine;
pub use model::{DeclId, ProjectModel, Scope, SourceModel};
pub use resolve::{Relation, Resolver};
pub use types::*;
