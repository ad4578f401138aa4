// Shared type database for unit tests

use pin_types::{PinType, TypeDatabase, TypeHandle};

use crate::PinSchema;

const TYPES: &str = r#"
[[interface]]
name = "Damageable"
parent = "Interface"

[[class]]
name = "Actor"
parent = "Object"

[[class.property]]
name = "RootMesh"
class = "MeshComponent"

[[class.property]]
name = "Hidden"
class = "MeshComponent"
visible = false

[[class]]
name = "Pawn"
parent = "Actor"
interfaces = ["Damageable"]

[[class]]
name = "Character"
parent = "Pawn"

[[class]]
name = "Widget"
parent = "Object"

[[class]]
name = "Component"
parent = "Object"

[[class]]
name = "MeshComponent"
parent = "Component"

[[struct]]
name = "HitResult"

[[enum]]
name = "EColor"
entries = ["Red", "Green", "Blue"]

[[enum]]
name = "EShape"
entries = ["Box", "Sphere"]

[[function]]
name = "OnHit"
params = ["float"]

[[function]]
name = "OnHitCopy"
params = ["float"]

[[function]]
name = "OnClick"
params = ["int"]
returns = ["bool"]
"#;

pub(crate) struct Fixture {
    pub db: TypeDatabase,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            db: TypeDatabase::from_toml_str(TYPES).unwrap(),
        }
    }

    pub fn ty(&self, name: &str) -> TypeHandle {
        self.db.lookup(name).unwrap()
    }

    pub fn object(&self, name: &str) -> PinType {
        PinType::object(self.ty(name))
    }

    pub fn structure(&self, name: &str) -> PinType {
        PinType::structure(self.ty(name))
    }

    pub fn schema(&self) -> PinSchema<'_> {
        PinSchema::new(&self.db)
    }
}
