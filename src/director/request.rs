use std::sync::Arc;

use crate::context::arena::ContextHandle;
use crate::rig::asset::{CameraRigAsset, RigReference};
use crate::rig::transition::TransitionSpec;

/// Blend-stack layer a rig runs on.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Persistent rigs evaluated before Main.
    Base,
    /// Exclusive, transient gameplay rigs.
    #[default]
    Main,
    /// Persistent rigs evaluated on top of Main.
    Global,
    /// Persistent rigs evaluated last, excluded from the pre-visual result.
    Visual,
}

impl Layer {
    /// Layers in evaluation order.
    pub const ALL: [Layer; 4] = [Layer::Base, Layer::Main, Layer::Global, Layer::Visual];
}

/// Activation or deactivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Start running a rig.
    Activate,
    /// Stop running a rig.
    Deactivate,
}

/// Request emitted by a director.
#[derive(Clone, Debug)]
pub struct DirectorRequest {
    /// Activation or deactivation.
    pub kind: RequestKind,
    /// Requesting context.
    pub context: ContextHandle,
    /// Target rig or proxy.
    pub rig: RigReference,
    /// Target layer.
    pub layer: Layer,
    /// Position among the layer's persistent instances.
    pub order_key: i32,
    /// Replaces the rig's own transition.
    pub transition_override: Option<TransitionSpec>,
    /// Apply even when it would be a no-op.
    pub force: bool,
}

impl DirectorRequest {
    fn with_kind(kind: RequestKind, context: ContextHandle, rig: RigReference) -> Self {
        Self {
            kind,
            context,
            rig,
            layer: Layer::Main,
            order_key: 0,
            transition_override: None,
            force: false,
        }
    }

    /// Main-layer activation of `rig`.
    pub fn activate(context: ContextHandle, rig: impl Into<RigReference>) -> Self {
        Self::with_kind(RequestKind::Activate, context, rig.into())
    }

    /// Main-layer deactivation of `rig`.
    pub fn deactivate(context: ContextHandle, rig: impl Into<RigReference>) -> Self {
        Self::with_kind(RequestKind::Deactivate, context, rig.into())
    }

    /// Target `layer` instead of Main.
    pub fn on_layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    /// Set the order key.
    pub fn with_order_key(mut self, order_key: i32) -> Self {
        self.order_key = order_key;
        self
    }

    /// Override the transition.
    pub fn with_transition(mut self, transition: TransitionSpec) -> Self {
        self.transition_override = Some(transition);
        self
    }

    /// Force the request.
    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }
}

/// Requests a director emitted during one run.
#[derive(Clone, Debug, Default)]
pub struct DirectorEvaluationResult {
    /// Requests, in emission order.
    pub requests: Vec<DirectorRequest>,
    /// Contexts whose rigs must stop, e.g. a child that lost the lead.
    pub released_contexts: Vec<ContextHandle>,
}

impl DirectorEvaluationResult {
    /// Append a request.
    pub fn push(&mut self, request: DirectorRequest) {
        self.requests.push(request);
    }

    /// Stop every rig of `context` once the run is over.
    pub fn release_context(&mut self, context: ContextHandle) {
        if !self.released_contexts.contains(&context) {
            self.released_contexts.push(context);
        }
    }

    /// Return `true` when nothing was requested or released.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.released_contexts.is_empty()
    }
}

/// Request with its rig resolved, as executed by the root evaluator.
#[derive(Clone, Debug)]
pub struct CameraRigRequest {
    /// Activation or deactivation.
    pub kind: RequestKind,
    /// Requesting context.
    pub context: ContextHandle,
    /// Target rig.
    pub rig: Arc<CameraRigAsset>,
    /// Target layer.
    pub layer: Layer,
    /// Position among the layer's persistent instances.
    pub order_key: i32,
    /// Replaces the rig's own transition.
    pub transition_override: Option<TransitionSpec>,
    /// Apply even when it would be a no-op.
    pub force: bool,
}

impl CameraRigRequest {
    /// Main-layer activation of `rig` for `context`.
    pub fn activate(context: ContextHandle, rig: Arc<CameraRigAsset>) -> Self {
        Self {
            kind: RequestKind::Activate,
            context,
            rig,
            layer: Layer::Main,
            order_key: 0,
            transition_override: None,
            force: false,
        }
    }

    /// Main-layer deactivation of `rig` for `context`.
    pub fn deactivate(context: ContextHandle, rig: Arc<CameraRigAsset>) -> Self {
        Self {
            kind: RequestKind::Deactivate,
            ..Self::activate(context, rig)
        }
    }

    /// Target `layer` instead of Main.
    pub fn on_layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    /// Set the order key.
    pub fn with_order_key(mut self, order_key: i32) -> Self {
        self.order_key = order_key;
        self
    }

    /// Override the transition.
    pub fn with_transition(mut self, transition: TransitionSpec) -> Self {
        self.transition_override = Some(transition);
        self
    }

    /// Force the request.
    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }
}
