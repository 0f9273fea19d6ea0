//! In-memory source model built from JSON declaration facts.
//!
//! ```json
//! {
//!   "files": [{
//!     "path": "src/com/example/CoffeeModule.java",
//!     "package": "com.example",
//!     "classes": [{
//!       "name": "CoffeeModule",
//!       "annotations": [{"name": "dagger.Module"}],
//!       "members": [{
//!         "kind": "method",
//!         "name": "provideHeater",
//!         "type": "com.example.Heater",
//!         "annotations": [{"name": "dagger.Provides"}],
//!         "parameters": [{"name": "pump", "type": "com.example.Pump"}]
//!       }]
//!     }]
//!   }]
//! }
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::declaration::{Annotation, Declaration, DeclarationKind};
use super::types::{ClassId, TypeRef};
use super::{DeclId, Scope, SourceFile, SourceModel};
use crate::error::ModelError;

/// Root of a facts document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectFacts {
    #[serde(default)]
    pub files: Vec<FileFacts>,
}

/// One source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFacts {
    pub path: String,
    /// Content hash; computed from the facts when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub classes: Vec<ClassFacts>,
    #[serde(default)]
    pub aliases: Vec<AliasFacts>,
}

/// A type alias (`typealias FooAlias = com.example.Foo`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasFacts {
    pub name: String,
    pub target: String,
}

/// A class, interface, object or companion object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassFacts {
    pub name: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub companion: bool,
    #[serde(default)]
    pub members: Vec<MemberFacts>,
    /// Nested classes
    #[serde(default)]
    pub classes: Vec<ClassFacts>,
}

/// Kind of class member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Method,
    Constructor,
    Field,
}

/// A method, constructor or field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberFacts {
    pub kind: MemberKind,
    /// Constructors default to the class name
    #[serde(default)]
    pub name: String,
    /// Return or field type; absent when unresolvable
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub parameters: Vec<ParameterFacts>,
}

/// A method or constructor parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterFacts {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone)]
struct AliasEntry {
    name: String,
    target: String,
    file: String,
}

/// Arena-backed [`SourceModel`]
#[derive(Debug, Default)]
pub struct ProjectModel {
    declarations: Vec<Declaration>,
    files: Vec<SourceFile>,
    by_file: HashMap<String, Vec<DeclId>>,
    classes_by_name: HashMap<String, Vec<DeclId>>,
    members: HashMap<DeclId, Vec<DeclId>>,
    aliases: Vec<AliasEntry>,
}

impl ProjectModel {
    /// Build a model from a facts document
    pub fn from_facts(facts: ProjectFacts) -> Result<Self, ModelError> {
        let mut model = Self::default();
        for file in facts.files {
            model.add_file(file)?;
        }
        Ok(model)
    }

    /// Build a model from a JSON value
    pub fn from_json(value: serde_json::Value) -> Result<Self, ModelError> {
        let facts: ProjectFacts =
            serde_json::from_value(value).map_err(|e| ModelError::ParseFailed(e.to_string()))?;
        Self::from_facts(facts)
    }

    /// Load facts from JSON files. Directories are walked for `*.json` files.
    pub fn load(paths: &[PathBuf]) -> Result<Self, ModelError> {
        let mut facts = ProjectFacts::default();
        for path in paths {
            for file in facts_files(path) {
                let content =
                    std::fs::read_to_string(&file).map_err(|e| ModelError::ReadFailed {
                        path: file.display().to_string(),
                        reason: e.to_string(),
                    })?;
                let parsed: ProjectFacts = serde_json::from_str(&content).map_err(|e| {
                    ModelError::ParseFailed(format!("{}: {}", file.display(), e))
                })?;
                facts.files.extend(parsed.files);
            }
        }
        tracing::debug!("Loaded facts for {} source files", facts.files.len());
        Self::from_facts(facts)
    }

    fn add_file(&mut self, file: FileFacts) -> Result<(), ModelError> {
        if self.by_file.contains_key(&file.path) {
            return Err(ModelError::DuplicateFile(file.path));
        }

        let hash = match &file.hash {
            Some(hash) => hash.clone(),
            None => content_hash(&file),
        };
        self.files.push(SourceFile {
            path: file.path.clone(),
            hash,
        });
        self.by_file.insert(file.path.clone(), Vec::new());

        for alias in &file.aliases {
            self.aliases.push(AliasEntry {
                name: alias.name.clone(),
                target: alias.target.clone(),
                file: file.path.clone(),
            });
        }

        for class in &file.classes {
            self.add_class(&file.path, &file.package, None, class);
        }
        Ok(())
    }

    fn push(&mut self, decl: Declaration) -> DeclId {
        let id = DeclId(self.declarations.len() as u32);
        if let Some(ids) = self.by_file.get_mut(&decl.file) {
            ids.push(id);
        }
        if let Some(container) = decl.container
            && decl.kind != DeclarationKind::Parameter
        {
            self.members.entry(container).or_default().push(id);
        }
        self.declarations.push(decl);
        id
    }

    fn add_class(
        &mut self,
        path: &str,
        package: &str,
        outer: Option<(DeclId, &str)>,
        class: &ClassFacts,
    ) {
        let nested_name = match outer {
            Some((_, outer_name)) => format!("{}.{}", outer_name, class.name),
            None => class.name.clone(),
        };
        let class_id = ClassId::new(package, nested_name.clone());
        let qualified = class_id.qualified_name();

        let class_decl = self.push(Declaration {
            kind: DeclarationKind::Class,
            simple_name: class.name.clone(),
            declared_type: Some(class_id.to_type()),
            type_alias: None,
            container: outer.map(|(id, _)| id),
            annotations: class.annotations.clone(),
            parameters: Vec::new(),
            is_constructor: false,
            class_id: Some(class_id),
            is_companion: class.companion,
            file: path.to_string(),
        });
        self.classes_by_name
            .entry(qualified)
            .or_default()
            .push(class_decl);

        for member in &class.members {
            self.add_member(path, class_decl, &class.name, member);
        }
        for nested in &class.classes {
            self.add_class(path, package, Some((class_decl, &nested_name)), nested);
        }
    }

    fn add_member(&mut self, path: &str, class: DeclId, class_name: &str, member: &MemberFacts) {
        let is_constructor = member.kind == MemberKind::Constructor;
        let kind = match member.kind {
            MemberKind::Field => DeclarationKind::Field,
            MemberKind::Method | MemberKind::Constructor => DeclarationKind::Method,
        };
        let simple_name = if is_constructor && member.name.is_empty() {
            class_name.to_string()
        } else {
            member.name.clone()
        };

        let member_decl = self.push(Declaration {
            kind,
            simple_name,
            declared_type: if is_constructor { None } else { member.ty.clone() },
            type_alias: member.alias.clone(),
            container: Some(class),
            annotations: member.annotations.clone(),
            parameters: Vec::new(),
            is_constructor,
            class_id: None,
            is_companion: false,
            file: path.to_string(),
        });

        let mut parameters = Vec::with_capacity(member.parameters.len());
        for param in &member.parameters {
            parameters.push(self.push(Declaration {
                kind: DeclarationKind::Parameter,
                simple_name: param.name.clone(),
                declared_type: param.ty.clone(),
                type_alias: param.alias.clone(),
                container: Some(member_decl),
                annotations: param.annotations.clone(),
                parameters: Vec::new(),
                is_constructor: false,
                class_id: None,
                is_companion: false,
                file: path.to_string(),
            }));
        }
        self.declarations[member_decl.0 as usize].parameters = parameters;
    }

    /// First class with the given qualified name
    pub fn class(&self, qualified_name: &str) -> Option<DeclId> {
        self.classes_by_name
            .get(qualified_name)
            .and_then(|ids| ids.first().copied())
    }

    /// First non-constructor member of `class` with the given name
    pub fn member(&self, class: DeclId, name: &str) -> Option<DeclId> {
        self.members.get(&class)?.iter().copied().find(|id| {
            self.declarations
                .get(id.0 as usize)
                .is_some_and(|d| d.simple_name == name && !d.is_constructor)
        })
    }

    /// First constructor of `class`
    pub fn constructor(&self, class: DeclId) -> Option<DeclId> {
        self.members.get(&class)?.iter().copied().find(|id| {
            self.declarations
                .get(id.0 as usize)
                .is_some_and(|d| d.is_constructor)
        })
    }

    /// Parameter of `method` with the given name
    pub fn parameter(&self, method: DeclId, name: &str) -> Option<DeclId> {
        let decl = self.declarations.get(method.0 as usize)?;
        decl.parameters.iter().copied().find(|id| {
            self.declarations
                .get(id.0 as usize)
                .is_some_and(|d| d.simple_name == name)
        })
    }

    /// Number of declarations in the arena
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// True if the model holds no declarations
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

impl SourceModel for ProjectModel {
    fn declaration(&self, id: DeclId) -> Option<&Declaration> {
        self.declarations.get(id.0 as usize)
    }

    fn files(&self) -> Vec<SourceFile> {
        self.files.clone()
    }

    fn declarations_in_file(&self, path: &str) -> Vec<DeclId> {
        self.by_file.get(path).cloned().unwrap_or_default()
    }

    fn find_classes(&self, qualified_name: &str, scope: &Scope) -> Vec<DeclId> {
        self.classes_by_name
            .get(qualified_name)
            .map(|ids| {
                ids.iter()
                    .copied()
                    .filter(|id| {
                        self.declarations
                            .get(id.0 as usize)
                            .is_some_and(|d| scope.contains(&d.file))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn members(&self, class: DeclId) -> Vec<DeclId> {
        self.members.get(&class).cloned().unwrap_or_default()
    }

    fn type_aliases(&self, qualified_name: &str, scope: &Scope) -> Vec<String> {
        let mut seen = HashSet::new();
        self.aliases
            .iter()
            .filter(|a| a.target == qualified_name && scope.contains(&a.file))
            .filter(|a| seen.insert(a.name.clone()))
            .map(|a| a.name.clone())
            .collect()
    }
}

fn content_hash(file: &FileFacts) -> String {
    let mut hasher = Sha256::new();
    // Serializing plain data structures cannot fail
    let bytes = serde_json::to_vec(file).unwrap_or_default();
    hasher.update(&bytes);
    format!("{:x}", hasher.finalize())
}

fn facts_files(path: &Path) -> Vec<PathBuf> {
    if path.is_dir() {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    }
}
