/// Stable identifier of a camera variable slot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct VariableId(pub u32);

impl VariableId {
    /// Joint key published by rig nodes exposing a yaw/pitch articulation pivot.
    pub const YAW_PITCH: Self = Self(0xFFFF_0001);
}

/// Stable identifier of a data table slot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct DataId(pub u32);

/// Stable identifier of a camera rig asset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct RigId(pub u64);

/// Identifier of one running rig instance inside the root evaluator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct RigInstanceId(pub u32);
