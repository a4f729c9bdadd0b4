//! camrig evaluates a layered camera-rig pipeline once per frame.
//!
//! - Create [`EvaluationContext`]s through a [`SystemEvaluator`] and push them on its
//!   context stack
//! - The active context's [`Director`] requests rigs; requests are arbitrated onto the
//!   Base, Main, Global and Visual blend stacks of the [`RootEvaluator`]
//! - [`SystemEvaluator::update`] produces the blended [`EvaluationResult`]
//! - An [`AimSolver`] re-runs a rig in isolation to turn it towards a world-space target
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod context;
pub(crate) mod director;
pub(crate) mod ik;
pub(crate) mod result;
pub(crate) mod rig;
pub(crate) mod root;
pub(crate) mod system;

pub use crate::foundation::core::{DQuat, DVec3, Rotator, Transform3, normalize_axis};
pub use crate::foundation::error::{CamRigError, CamRigResult};
pub use crate::foundation::ids::{DataId, RigId, RigInstanceId, VariableId};
pub use crate::foundation::math::ray_sphere_exit;

pub use crate::result::allocation::{
    AllocationInfo, DataDefinition, VariableDefinition, VariableType, VariableValue,
};
pub use crate::result::evaluation_result::EvaluationResult;
pub use crate::result::joints::{CameraRigJoint, CameraRigJoints};
pub use crate::result::pose::{CameraPose, PoseChangedFlags, SENSOR_WIDTH_MM};
pub use crate::result::post_process::PostProcessSettings;
pub use crate::result::table::{
    DataTable, Slot, SlotFilter, SlotFlags, SlotTable, SlotValue, VariableTable,
};

pub use crate::rig::archive::{StateReader, StateWriter};
pub use crate::rig::asset::{CameraAsset, CameraRigAsset, DirectorConfig, RigReference};
pub use crate::rig::combined::{CombinedRigCache, CombinedRigsNode};
pub use crate::rig::node::{
    CameraNode, CameraNodeEvaluator, NodeEvaluationParams, NodeEvaluatorFlags,
    NodeEvaluatorTree, NodeInitializeParams, NodeOperationParams,
};
pub use crate::rig::nodes::{
    ArrayNode, BoomArmNode, FieldOfViewNode, LensNode, OffsetNode, OffsetSpace, PostProcessNode,
    SetVariableNode, ShakeNode,
};
pub use crate::rig::operation::{
    CONSUMABLE_EPSILON, CameraOperation, ConsumableValue, YawPitchOperation,
};
pub use crate::rig::transition::{BlendCurve, TransitionSpec};

pub use crate::context::arena::{ContextArena, ContextHandle};
pub use crate::context::context::{ContextOwnerInfo, EvaluationContext, ResultCondition};
pub use crate::context::stack::{ContextStack, ContextStackChange, ContextStackEvent};

pub use crate::director::director::{
    Director, DirectorInstance, DirectorLifecycleParams, DirectorRunContext, DirectorState,
};
pub use crate::director::priority_queue::{PriorityQueueDirector, PriorityQueueDirectorFactory};
pub use crate::director::registry::{DirectorFactory, DirectorRegistry};
pub use crate::director::request::{
    CameraRigRequest, DirectorEvaluationResult, DirectorRequest, Layer, RequestKind,
};
pub use crate::director::single_rig::{SingleRigDirector, SingleRigDirectorFactory};

pub use crate::root::blend_stack::{BlendStack, BlendStackKind};
pub use crate::root::evaluator::{RigEvent, RigEventKind, RootEvaluator, SingleRigHierarchy};
pub use crate::root::instance::{BlendDirection, BlendState, CameraRigInfo, RigInstance};

pub use crate::system::evaluator::SystemEvaluator;
pub use crate::system::opts::{AimSolverSettings, CameraSystemOpts};
pub use crate::system::service::{EvaluationService, ServiceUpdateParams};
pub use crate::system::services::auto_reset::AutoResetVariableService;

pub use crate::ik::aim_solver::{AimError, AimSolver, AimSolverParams, AimSolverState};
