//! Canonical type references and durable class identifiers.
//!
//! A [`TypeRef`] is the source model's canonical type id: a qualified name plus
//! generic arguments. It renders to and parses from the textual form
//! `com.example.Outer<java.lang.String, com.example.Foo>`.
//!
//! Dagger treats boxed and unboxed primitives as the same binding, so every
//! comparison and key computation goes through [`TypeRef::unboxed`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ModelError;

/// `dagger.Lazy`
pub const DAGGER_LAZY: &str = "dagger.Lazy";

/// Provider wrappers a consumer may request instead of the bare type
pub const PROVIDER_WRAPPERS: &[&str] = &["javax.inject.Provider", "jakarta.inject.Provider"];

/// Optional wrappers satisfied by `@BindsOptionalOf`
pub const OPTIONAL_WRAPPERS: &[&str] = &["java.util.Optional", "com.google.common.base.Optional"];

/// Simple names of the consumer-visible wrapper forms, used as extra index keys
pub const WRAPPER_KEYS: &[&str] = &["Lazy", "Provider"];

/// Simple name under which optional consumers are indexed
pub const OPTIONAL_KEY: &str = "Optional";

/// (unboxed keyword, Java box, Kotlin name, key)
const PRIMITIVES: &[(&str, &str, &str, &str)] = &[
    ("boolean", "java.lang.Boolean", "kotlin.Boolean", "Boolean"),
    ("byte", "java.lang.Byte", "kotlin.Byte", "Byte"),
    ("char", "java.lang.Character", "kotlin.Char", "Char"),
    ("double", "java.lang.Double", "kotlin.Double", "Double"),
    ("float", "java.lang.Float", "kotlin.Float", "Float"),
    ("int", "java.lang.Integer", "kotlin.Int", "Int"),
    ("long", "java.lang.Long", "kotlin.Long", "Long"),
    ("short", "java.lang.Short", "kotlin.Short", "Short"),
];

const VOID_TYPES: &[&str] = &["void", "java.lang.Void", "kotlin.Unit"];

/// A canonical type: qualified name plus generic arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeRef {
    name: String,
    args: Vec<TypeRef>,
}

impl TypeRef {
    /// A type without generic arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A generic type
    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Parse the textual form, e.g. `javax.inject.Provider<dagger.Lazy<a.Foo>>`
    pub fn parse(text: &str) -> Result<Self, ModelError> {
        let mut parser = TypeParser {
            input: text.as_bytes(),
            pos: 0,
            text,
        };
        let ty = parser.parse_type()?;
        parser.skip_whitespace();
        if parser.pos != parser.input.len() {
            return Err(ModelError::InvalidType(text.to_string()));
        }
        Ok(ty)
    }

    /// Qualified name, without generic arguments
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Generic arguments
    pub fn args(&self) -> &[TypeRef] {
        &self.args
    }

    /// Last dotted segment of the qualified name
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Same type with boxed primitives (Java or Kotlin spelling) collapsed to the
    /// primitive keyword, applied recursively to generic arguments.
    pub fn unboxed(&self) -> TypeRef {
        let name = PRIMITIVES
            .iter()
            .find(|(_, boxed, kotlin, _)| self.name == *boxed || self.name == *kotlin)
            .map(|(keyword, ..)| (*keyword).to_string())
            .unwrap_or_else(|| match self.name.as_str() {
                "kotlin.String" => "java.lang.String".to_string(),
                _ => self.name.clone(),
            });
        TypeRef {
            name,
            args: self.args.iter().map(TypeRef::unboxed).collect(),
        }
    }

    /// Reverse-index key: the simple name of the unboxed outermost type.
    ///
    /// Primitives use their Kotlin spelling so `int`, `Integer` and `Int` share
    /// one key.
    pub fn index_key(&self) -> String {
        let unboxed = self.unboxed();
        PRIMITIVES
            .iter()
            .find(|(keyword, ..)| unboxed.name == *keyword)
            .map(|(.., key)| (*key).to_string())
            .unwrap_or_else(|| unboxed.simple_name().to_string())
    }

    /// True for `void`, `Void` and `Unit`
    pub fn is_void(&self) -> bool {
        VOID_TYPES.contains(&self.name.as_str())
    }

    /// True if this is a primitive or its box
    pub fn is_primitive(&self) -> bool {
        let unboxed = self.unboxed();
        PRIMITIVES.iter().any(|(keyword, ..)| unboxed.name == *keyword)
    }

    fn single_arg_if(&self, names: &[&str]) -> Option<&TypeRef> {
        if names.contains(&self.name.as_str()) && self.args.len() == 1 {
            self.args.first()
        } else {
            None
        }
    }

    /// Strip the wrapper layers a consumer may request around its dependency.
    ///
    /// `Provider<>` is stripped first, then `Lazy<>`, so `Provider<Lazy<T>>`
    /// yields `T` while `Lazy<Provider<T>>` yields `Provider<T>`.
    pub fn unwrap_dependency(&self) -> TypeRef {
        let without_provider = self.single_arg_if(PROVIDER_WRAPPERS).unwrap_or(self);
        let without_lazy = without_provider
            .single_arg_if(&[DAGGER_LAZY])
            .unwrap_or(without_provider);
        without_lazy.clone()
    }

    /// Inner type of `Optional<T>` (Java or Guava)
    pub fn optional_inner(&self) -> Option<&TypeRef> {
        self.single_arg_if(OPTIONAL_WRAPPERS)
    }

    /// Equality after unboxing
    pub fn same_binding(&self, other: &TypeRef) -> bool {
        self.unboxed() == other.unboxed()
    }

    /// Equality of the raw class after unboxing, ignoring generic arguments
    pub fn same_raw_type(&self, other: &TypeRef) -> bool {
        self.unboxed().name == other.unboxed().name
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", arg)?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl TryFrom<String> for TypeRef {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TypeRef::parse(&value)
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

struct TypeParser<'a> {
    input: &'a [u8],
    pos: usize,
    text: &'a str,
}

impl TypeParser<'_> {
    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn error(&self) -> ModelError {
        ModelError::InvalidType(self.text.to_string())
    }

    fn parse_type(&mut self) -> Result<TypeRef, ModelError> {
        self.skip_whitespace();
        let start = self.pos;
        while self.pos < self.input.len() {
            let c = self.input[self.pos];
            if c.is_ascii_alphanumeric() || matches!(c, b'_' | b'.' | b'$' | b'[' | b']' | b'?')
            {
                self.pos += 1;
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(self.error());
        }
        let name = self.text[start..self.pos].to_string();

        self.skip_whitespace();
        let mut args = Vec::new();
        if self.input.get(self.pos) == Some(&b'<') {
            self.pos += 1;
            loop {
                args.push(self.parse_type()?);
                self.skip_whitespace();
                match self.input.get(self.pos) {
                    Some(b',') => self.pos += 1,
                    Some(b'>') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(self.error()),
                }
            }
        }
        Ok(TypeRef { name, args })
    }
}

/// Durable class identifier stored in index values.
///
/// `name` is the dot-joined chain of class names below the package, so a
/// nested class `com.example.Outer.Inner` has package `com.example` and name
/// `Outer.Inner`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId {
    pub package: String,
    pub name: String,
}

impl ClassId {
    /// Create a class id from a package and a (possibly nested) class name
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Split a qualified name at the first segment that starts with an
    /// uppercase letter, following Java naming conventions.
    pub fn from_qualified(qualified: &str) -> Self {
        let segments: Vec<&str> = qualified.split('.').collect();
        let split = segments
            .iter()
            .position(|s| s.chars().next().is_some_and(|c| c.is_ascii_uppercase()))
            .unwrap_or(segments.len().saturating_sub(1));
        Self {
            package: segments[..split].join("."),
            name: segments[split..].join("."),
        }
    }

    /// Package segments
    pub fn package_segments(&self) -> Vec<&str> {
        if self.package.is_empty() {
            Vec::new()
        } else {
            self.package.split('.').collect()
        }
    }

    /// Fully qualified name
    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    /// Innermost class name
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// The class as a type without generic arguments
    pub fn to_type(&self) -> TypeRef {
        TypeRef::new(self.qualified_name())
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}
