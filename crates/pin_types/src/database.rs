//! Type Database - In-memory reflection database
//!
//! Stores classes, interfaces, structs, enums and function signatures and
//! answers the `TypeReflection` queries for them. Handles are indices into the
//! definition table and stay valid for the lifetime of the database.
//!
//! Databases are built either programmatically (`add_class`, `add_enum`, ...)
//! or from a TOML manifest:
//!
//! ```toml
//! [[class]]
//! name = "Actor"
//! parent = "Object"
//! interfaces = ["Damageable"]
//!
//! [[class.property]]
//! name = "RootMesh"
//! class = "MeshComponent"
//!
//! [[enum]]
//! name = "EColor"
//! entries = ["Red", "Green"]
//!
//! [[function]]
//! name = "OnHit"
//! params = ["object<Actor>", "float"]
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    parse_pin_type, property_to_pin_type, property_to_pin_type_lossy, NominalKind, PinCategory,
    PinType, PinTypeError, PropertyConversionError, PropertyDesc, PropertyInfo, PropertyType,
    TypeHandle, TypeReflection, WellKnownStruct,
};

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur when building a type database
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Type already exists: {0}")]
    DuplicateType(String),
    #[error("Type not found: {0}")]
    UnknownType(String),
    #[error("{name} cannot derive from {parent}")]
    InvalidParent { name: String, parent: String },
    #[error("{0} is not an interface")]
    NotAnInterface(String),
    #[error("{0} is not a class")]
    NotAClass(String),
    #[error("Property {property} of {owner} is not object-valued")]
    NotAnObjectProperty { owner: String, property: String },
    #[error("Invalid property on {owner}: {source}")]
    Property {
        owner: String,
        #[source]
        source: PropertyConversionError,
    },
    #[error("Cyclic inheritance involving {0}")]
    CyclicHierarchy(String),
    #[error("Invalid signature for {name}: {source}")]
    Signature {
        name: String,
        #[source]
        source: PinTypeError,
    },
    #[error("Failed to parse type manifest: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Manifest
// ─────────────────────────────────────────────────────────────────────────────

/// Object-valued property declared in a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    /// Declared class of the referenced object
    pub class: String,
    #[serde(default)]
    pub weak: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub readable: bool,
}

fn default_true() -> bool {
    true
}

/// One type definition in a manifest, referring to other types by name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Implemented interfaces (classes only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    #[serde(default, rename = "property", skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyDef>,
    /// Built-in struct tag (structs only)
    #[serde(default)]
    pub well_known: WellKnownStruct,
    /// Entry names (enums only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<String>,
    /// Parameter types in pin type syntax (functions only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub returns: Vec<String>,
}

impl TypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, class: impl Into<String>) -> Self {
        self.properties.push(PropertyDef {
            name: name.into(),
            class: class.into(),
            weak: false,
            visible: true,
            readable: true,
        });
        self
    }
}

/// TOML layout of a type database file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeManifest {
    #[serde(default)]
    pub class: Vec<TypeDef>,
    #[serde(default)]
    pub interface: Vec<TypeDef>,
    #[serde(default, rename = "struct")]
    pub structs: Vec<TypeDef>,
    #[serde(default, rename = "enum")]
    pub enums: Vec<TypeDef>,
    #[serde(default)]
    pub function: Vec<TypeDef>,
}

impl TypeManifest {
    fn into_defs(self) -> Vec<(NominalKind, TypeDef)> {
        let tagged = |kind: NominalKind, defs: Vec<TypeDef>| {
            defs.into_iter().map(move |def| (kind, def))
        };
        tagged(NominalKind::Interface, self.interface)
            .chain(tagged(NominalKind::Class, self.class))
            .chain(tagged(NominalKind::Struct, self.structs))
            .chain(tagged(NominalKind::Enum, self.enums))
            .chain(tagged(NominalKind::Function, self.function))
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Database
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct Signature {
    params: Vec<PinType>,
    returns: Vec<PinType>,
}

#[derive(Debug, Clone)]
struct TypeEntry {
    name: String,
    kind: NominalKind,
    parent: Option<TypeHandle>,
    interfaces: Vec<TypeHandle>,
    properties: Vec<PropertyInfo>,
    well_known: WellKnownStruct,
    entries: Vec<String>,
    signature: Option<Signature>,
}

impl TypeEntry {
    fn new(name: String, kind: NominalKind) -> Self {
        Self {
            name,
            kind,
            parent: None,
            interfaces: Vec::new(),
            properties: Vec::new(),
            well_known: WellKnownStruct::None,
            entries: Vec::new(),
            signature: None,
        }
    }
}

/// In-memory nominal type database
#[derive(Debug, Clone, Default)]
pub struct TypeDatabase {
    entries: Vec<TypeEntry>,
    by_name: HashMap<String, TypeHandle>,
}

impl TypeDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Database with the engine root types and built-in value structs
    pub fn with_engine_types() -> Self {
        let mut db = Self::new();
        db.push_entry("Object".to_string(), NominalKind::Class);
        db.push_entry("Interface".to_string(), NominalKind::Interface);
        for tag in WellKnownStruct::ALL {
            if let Some(name) = tag.type_name() {
                let handle = db.push_entry(name.to_string(), NominalKind::Struct);
                db.set_well_known(handle, tag);
            }
        }
        db
    }

    /// Parse a TOML manifest on top of the engine types
    pub fn from_toml_str(text: &str) -> Result<Self, DatabaseError> {
        let manifest: TypeManifest = toml::from_str(text)?;
        let mut db = Self::with_engine_types();
        db.register_manifest(manifest)?;
        Ok(db)
    }

    /// Load a TOML manifest from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DatabaseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), types = db.len(), "Loaded type database");
        Ok(db)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Handle of a type by name
    pub fn lookup(&self, name: &str) -> Option<TypeHandle> {
        self.by_name.get(name).copied()
    }

    /// Handle of a type by name, or `UnknownType`
    pub fn require(&self, name: &str) -> Result<TypeHandle, DatabaseError> {
        self.lookup(name)
            .ok_or_else(|| DatabaseError::UnknownType(name.to_string()))
    }

    /// All registered handles in registration order
    pub fn handles(&self) -> impl Iterator<Item = TypeHandle> + '_ {
        (0..self.entries.len()).map(|i| TypeHandle::new(i as u32))
    }

    fn entry(&self, ty: TypeHandle) -> Option<&TypeEntry> {
        self.entries.get(ty.index())
    }

    fn name_of(&self, ty: TypeHandle) -> String {
        self.entry(ty)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| ty.to_string())
    }

    fn push_entry(&mut self, name: String, kind: NominalKind) -> TypeHandle {
        let handle = TypeHandle::new(self.entries.len() as u32);
        self.by_name.insert(name.clone(), handle);
        self.entries.push(TypeEntry::new(name, kind));
        handle
    }

    fn add_entry(
        &mut self,
        name: &str,
        kind: NominalKind,
        parent: Option<TypeHandle>,
    ) -> Result<TypeHandle, DatabaseError> {
        if self.by_name.contains_key(name) {
            return Err(DatabaseError::DuplicateType(name.to_string()));
        }
        if let Some(parent) = parent {
            self.check_parent(name, kind, parent)?;
        }
        let handle = self.push_entry(name.to_string(), kind);
        self.entries[handle.index()].parent = parent;
        Ok(handle)
    }

    fn check_parent(
        &self,
        name: &str,
        kind: NominalKind,
        parent: TypeHandle,
    ) -> Result<(), DatabaseError> {
        let parent_kind = self.kind(parent);
        let allowed = matches!(
            kind,
            NominalKind::Class | NominalKind::Interface | NominalKind::Struct
        ) && parent_kind == Some(kind);
        if allowed {
            Ok(())
        } else {
            Err(DatabaseError::InvalidParent {
                name: name.to_string(),
                parent: self.name_of(parent),
            })
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Programmatic Registration
    // ─────────────────────────────────────────────────────────────────────────

    pub fn add_class(
        &mut self,
        name: &str,
        parent: Option<TypeHandle>,
    ) -> Result<TypeHandle, DatabaseError> {
        self.add_entry(name, NominalKind::Class, parent)
    }

    pub fn add_interface(
        &mut self,
        name: &str,
        parent: Option<TypeHandle>,
    ) -> Result<TypeHandle, DatabaseError> {
        self.add_entry(name, NominalKind::Interface, parent)
    }

    pub fn add_struct(
        &mut self,
        name: &str,
        parent: Option<TypeHandle>,
    ) -> Result<TypeHandle, DatabaseError> {
        self.add_entry(name, NominalKind::Struct, parent)
    }

    pub fn add_enum(&mut self, name: &str, entries: Vec<String>) -> Result<TypeHandle, DatabaseError> {
        let handle = self.add_entry(name, NominalKind::Enum, None)?;
        self.entries[handle.index()].entries = entries;
        Ok(handle)
    }

    /// Register a function signature (delegate sub-type)
    pub fn add_function(
        &mut self,
        name: &str,
        params: Vec<PinType>,
        returns: Vec<PinType>,
    ) -> Result<TypeHandle, DatabaseError> {
        let handle = self.add_entry(name, NominalKind::Function, None)?;
        self.entries[handle.index()].signature = Some(Signature { params, returns });
        Ok(handle)
    }

    /// Register a function whose parameters are reflected properties
    ///
    /// Parameters without a pin representation become `bad_type` pins.
    pub fn add_native_function(
        &mut self,
        name: &str,
        params: &[PropertyDesc],
        returns: &[PropertyDesc],
    ) -> Result<TypeHandle, DatabaseError> {
        let convert = |props: &[PropertyDesc]| props.iter().map(property_to_pin_type_lossy).collect();
        self.add_function(name, convert(params), convert(returns))
    }

    /// Declare that `class` implements `interface`
    pub fn add_interface_impl(
        &mut self,
        class: TypeHandle,
        interface: TypeHandle,
    ) -> Result<(), DatabaseError> {
        if self.kind(class) != Some(NominalKind::Class) {
            return Err(DatabaseError::NotAClass(self.name_of(class)));
        }
        if !self.is_interface(interface) {
            return Err(DatabaseError::NotAnInterface(self.name_of(interface)));
        }
        let entry = &mut self.entries[class.index()];
        if !entry.interfaces.contains(&interface) {
            entry.interfaces.push(interface);
        }
        Ok(())
    }

    /// Declare an object-valued property on `class`
    ///
    /// The property is converted to its pin type; anything but a single object
    /// reference to a class or interface is rejected.
    pub fn add_property(
        &mut self,
        class: TypeHandle,
        property: &PropertyDesc,
        blueprint_visible: bool,
        readable: bool,
    ) -> Result<(), DatabaseError> {
        if self.kind(class) != Some(NominalKind::Class) {
            return Err(DatabaseError::NotAClass(self.name_of(class)));
        }
        let pin_type = property_to_pin_type(property).map_err(|source| DatabaseError::Property {
            owner: self.name_of(class),
            source,
        })?;
        let value_class = match pin_type.sub_category_object {
            Some(value_class) if pin_type.category == PinCategory::Object && !pin_type.is_array => {
                value_class
            }
            _ => {
                return Err(DatabaseError::NotAnObjectProperty {
                    owner: self.name_of(class),
                    property: property.name.clone(),
                });
            }
        };
        if !self.is_class_like(value_class) {
            return Err(DatabaseError::NotAClass(self.name_of(value_class)));
        }
        self.entries[class.index()].properties.push(PropertyInfo {
            name: property.name.clone(),
            owner: class,
            value_class,
            blueprint_visible,
            readable,
        });
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Manifest Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Register every definition of a manifest
    ///
    /// Definitions may refer to each other in any order. Either all of them are
    /// registered or the database is left untouched.
    pub fn register_manifest(&mut self, manifest: TypeManifest) -> Result<(), DatabaseError> {
        let mut staged = self.clone();
        staged.register_defs(manifest.into_defs())?;
        *self = staged;
        Ok(())
    }

    fn register_defs(&mut self, defs: Vec<(NominalKind, TypeDef)>) -> Result<(), DatabaseError> {
        // Names first, so that links can point forward
        let mut handles = Vec::with_capacity(defs.len());
        for (kind, def) in &defs {
            if self.by_name.contains_key(&def.name) {
                return Err(DatabaseError::DuplicateType(def.name.clone()));
            }
            handles.push(self.push_entry(def.name.clone(), *kind));
        }

        for ((kind, def), &handle) in defs.iter().zip(&handles) {
            if let Some(parent) = &def.parent {
                let parent = self.require(parent)?;
                self.check_parent(&def.name, *kind, parent)?;
                self.entries[handle.index()].parent = Some(parent);
            }
            for interface in &def.interfaces {
                let interface = self.require(interface)?;
                self.add_interface_impl(handle, interface)?;
            }
            for property in &def.properties {
                let class = self.require(&property.class)?;
                let desc = PropertyDesc::new(
                    property.name.clone(),
                    PropertyType::Object {
                        class,
                        weak: property.weak,
                    },
                );
                self.add_property(handle, &desc, property.visible, property.readable)?;
            }
            let entry = &mut self.entries[handle.index()];
            entry.well_known = def.well_known;
            entry.entries = def.entries.clone();
        }

        for (_, def) in &defs {
            self.check_acyclic(&def.name)?;
        }

        // Signatures last, their parameter types may name anything above
        for ((kind, def), &handle) in defs.iter().zip(&handles) {
            if *kind != NominalKind::Function {
                continue;
            }
            let parse_all = |types: &[String]| {
                types
                    .iter()
                    .map(|text| parse_pin_type(text, self))
                    .collect::<Result<Vec<_>, _>>()
            };
            let signature = parse_all(&def.params)
                .and_then(|params| Ok(Signature { params, returns: parse_all(&def.returns)? }))
                .map_err(|source| DatabaseError::Signature {
                    name: def.name.clone(),
                    source,
                })?;
            self.entries[handle.index()].signature = Some(signature);
        }

        tracing::trace!(count = defs.len(), "Registered type definitions");
        Ok(())
    }

    fn check_acyclic(&self, name: &str) -> Result<(), DatabaseError> {
        let mut current = self.lookup(name);
        let mut steps = 0;
        while let Some(ty) = current {
            if steps > self.entries.len() {
                return Err(DatabaseError::CyclicHierarchy(name.to_string()));
            }
            steps += 1;
            current = self.entry(ty).and_then(|e| e.parent);
        }
        Ok(())
    }

    fn ancestors(&self, ty: TypeHandle) -> impl Iterator<Item = TypeHandle> + '_ {
        let limit = self.entries.len();
        std::iter::successors(self.entry(ty).map(|_| ty), move |t| {
            self.entry(*t).and_then(|e| e.parent)
        })
        .take(limit)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reflection Queries
// ─────────────────────────────────────────────────────────────────────────────

impl TypeReflection for TypeDatabase {
    fn type_name(&self, ty: TypeHandle) -> Option<&str> {
        self.entry(ty).map(|e| e.name.as_str())
    }

    fn kind(&self, ty: TypeHandle) -> Option<NominalKind> {
        self.entry(ty).map(|e| e.kind)
    }

    fn is_child_of(&self, ty: TypeHandle, ancestor: TypeHandle) -> bool {
        self.ancestors(ty).any(|t| t == ancestor)
    }

    fn implements_interface(&self, class: TypeHandle, interface: TypeHandle) -> bool {
        self.ancestors(class).any(|t| {
            self.entry(t).is_some_and(|e| {
                e.interfaces
                    .iter()
                    .any(|&implemented| self.is_child_of(implemented, interface))
            })
        })
    }

    fn well_known_struct(&self, ty: TypeHandle) -> WellKnownStruct {
        self.entry(ty)
            .map(|e| e.well_known)
            .unwrap_or(WellKnownStruct::None)
    }

    fn is_signature_compatible(&self, a: TypeHandle, b: TypeHandle) -> bool {
        if a == b {
            return self.kind(a) == Some(NominalKind::Function);
        }
        match (
            self.entry(a).and_then(|e| e.signature.as_ref()),
            self.entry(b).and_then(|e| e.signature.as_ref()),
        ) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        }
    }

    fn object_properties(&self, class: TypeHandle) -> Vec<PropertyInfo> {
        self.ancestors(class)
            .filter_map(|t| self.entry(t))
            .flat_map(|e| e.properties.iter().cloned())
            .collect()
    }

    fn enum_entries(&self, ty: TypeHandle) -> Option<&[String]> {
        self.entry(ty)
            .filter(|e| e.kind == NominalKind::Enum)
            .map(|e| e.entries.as_slice())
    }
}
