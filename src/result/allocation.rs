use crate::foundation::core::{DVec3, Rotator};
use crate::foundation::ids::{DataId, VariableId};

/// Kind of value a variable slot holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum VariableType {
    /// Boolean.
    Bool,
    /// 32-bit integer.
    Int,
    /// Double precision scalar.
    Float,
    /// 3D vector.
    Vector,
    /// Rotation.
    Rotator,
}

/// Typed value stored in a variable slot.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum VariableValue {
    /// Boolean.
    Bool(bool),
    /// 32-bit integer.
    Int(i32),
    /// Double precision scalar.
    Float(f64),
    /// 3D vector.
    Vector(DVec3),
    /// Rotation.
    Rotator(Rotator),
}

impl VariableValue {
    /// Type tag of this value.
    pub fn value_type(&self) -> VariableType {
        match self {
            Self::Bool(_) => VariableType::Bool,
            Self::Int(_) => VariableType::Int,
            Self::Float(_) => VariableType::Float,
            Self::Vector(_) => VariableType::Vector,
            Self::Rotator(_) => VariableType::Rotator,
        }
    }

    /// Scalar payload, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float(v) => Some(v),
            Self::Int(v) => Some(f64::from(v)),
            _ => None,
        }
    }

    /// Boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// Vector payload, if any.
    pub fn as_vector(&self) -> Option<DVec3> {
        match *self {
            Self::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Rotator payload, if any.
    pub fn as_rotator(&self) -> Option<Rotator> {
        match *self {
            Self::Rotator(v) => Some(v),
            _ => None,
        }
    }
}

/// One variable slot to allocate.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VariableDefinition {
    /// Slot identifier.
    pub id: VariableId,
    /// Human readable name.
    pub name: String,
    /// Value the slot holds before any write and after a reset.
    pub default_value: VariableValue,
    /// Revert to the default at the end of every frame.
    #[serde(default)]
    pub auto_reset: bool,
    /// Rig-private state (carried across aim-solver sandbox runs).
    #[serde(default)]
    pub private: bool,
}

impl VariableDefinition {
    /// Public, persistent variable.
    pub fn new(id: VariableId, name: impl Into<String>, default_value: VariableValue) -> Self {
        Self {
            id,
            name: name.into(),
            default_value,
            auto_reset: false,
            private: false,
        }
    }

    /// Flag as auto-reset.
    pub fn auto_reset(mut self) -> Self {
        self.auto_reset = true;
        self
    }

    /// Flag as private.
    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }
}

/// One data slot to allocate.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DataDefinition {
    /// Slot identifier.
    pub id: DataId,
    /// Human readable name.
    pub name: String,
    /// Blob the slot holds before any write and after a reset.
    #[serde(default)]
    pub default_value: serde_json::Value,
    /// Revert to the default at the end of every frame.
    #[serde(default)]
    pub auto_reset: bool,
}

impl DataDefinition {
    /// Persistent data slot defaulting to `null`.
    pub fn new(id: DataId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            default_value: serde_json::Value::Null,
            auto_reset: false,
        }
    }

    /// Flag as auto-reset.
    pub fn auto_reset(mut self) -> Self {
        self.auto_reset = true;
        self
    }
}

/// Precomputed table layout of an asset.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AllocationInfo {
    /// Variable slots.
    #[serde(default)]
    pub variables: Vec<VariableDefinition>,
    /// Data slots.
    #[serde(default)]
    pub data: Vec<DataDefinition>,
}

impl AllocationInfo {
    /// Append a variable definition.
    pub fn with_variable(mut self, def: VariableDefinition) -> Self {
        self.variables.push(def);
        self
    }

    /// Append a data definition.
    pub fn with_data(mut self, def: DataDefinition) -> Self {
        self.data.push(def);
        self
    }

    /// Return `true` when nothing is allocated.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.data.is_empty()
    }

    /// Union with `other`; on id collisions the definition in `self` wins.
    pub fn merged(&self, other: &AllocationInfo) -> AllocationInfo {
        let mut out = self.clone();
        for v in &other.variables {
            if !out.variables.iter().any(|e| e.id == v.id) {
                out.variables.push(v.clone());
            }
        }
        for d in &other.data {
            if !out.data.iter().any(|e| e.id == d.id) {
                out.data.push(d.clone());
            }
        }
        out
    }
}
