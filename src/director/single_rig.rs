use std::sync::Arc;

use crate::director::director::{Director, DirectorRunContext};
use crate::director::registry::DirectorFactory;
use crate::director::request::{DirectorEvaluationResult, DirectorRequest, Layer};
use crate::foundation::error::{CamRigError, CamRigResult};
use crate::rig::asset::{CameraAsset, CameraRigAsset, RigReference};

/// Keeps one rig requested every frame.
#[derive(Debug, Clone)]
pub struct SingleRigDirector {
    rig: RigReference,
    layer: Layer,
    order_key: i32,
}

impl SingleRigDirector {
    /// Request `rig` on the Main layer.
    pub fn new(rig: impl Into<RigReference>) -> Self {
        Self {
            rig: rig.into(),
            layer: Layer::Main,
            order_key: 0,
        }
    }

    /// Request on `layer` with `order_key` instead.
    pub fn on_layer(mut self, layer: Layer, order_key: i32) -> Self {
        self.layer = layer;
        self.order_key = order_key;
        self
    }
}

impl Director for SingleRigDirector {
    fn run(&mut self, run: &mut DirectorRunContext<'_>, out: &mut DirectorEvaluationResult) {
        out.push(
            DirectorRequest::activate(run.context(), self.rig.clone())
                .on_layer(self.layer)
                .with_order_key(self.order_key),
        );
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct SingleRigParams {
    rig: String,
    #[serde(default)]
    layer: Layer,
    #[serde(default)]
    order_key: i32,
}

impl SingleRigParams {
    fn parse(params: &serde_json::Value) -> CamRigResult<Self> {
        serde_json::from_value(params.clone())
            .map_err(|e| CamRigError::configuration(format!("single_rig params: {e}")))
    }
}

fn resolve(asset: &CameraAsset, name: &str) -> CamRigResult<RigReference> {
    if asset.has_proxy(name) {
        return Ok(RigReference::Proxy(name.to_owned()));
    }
    asset
        .find_rig(name)
        .map(|rig| RigReference::Rig(Arc::clone(rig)))
        .ok_or_else(|| {
            CamRigError::configuration(format!(
                "camera asset '{}' has no rig or proxy named '{name}'",
                asset.name
            ))
        })
}

/// Factory for [`SingleRigDirector`].
///
/// Params: `{"rig": <rig or proxy name>, "layer": "main", "order_key": 0}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleRigDirectorFactory;

impl DirectorFactory for SingleRigDirectorFactory {
    fn build_director(
        &self,
        asset: &Arc<CameraAsset>,
        params: &serde_json::Value,
    ) -> CamRigResult<Box<dyn Director>> {
        let p = SingleRigParams::parse(params)?;
        let rig = resolve(asset, &p.rig)?;
        Ok(Box::new(
            SingleRigDirector::new(rig).on_layer(p.layer, p.order_key),
        ))
    }

    fn gather_rig_usage(
        &self,
        asset: &CameraAsset,
        params: &serde_json::Value,
    ) -> CamRigResult<Vec<Arc<CameraRigAsset>>> {
        let p = SingleRigParams::parse(params)?;
        let rig = match resolve(asset, &p.rig)? {
            RigReference::Rig(rig) => Some(rig),
            RigReference::Proxy(name) => asset.resolve_proxy(&name).cloned(),
        };
        Ok(rig.into_iter().collect())
    }
}
