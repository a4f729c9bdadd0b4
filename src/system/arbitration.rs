use std::sync::Arc;

use crate::context::arena::ContextArena;
use crate::director::request::{CameraRigRequest, DirectorRequest, Layer, RequestKind};
use crate::foundation::error::{CamRigError, CamRigResult};
use crate::rig::asset::RigReference;
use crate::rig::combined::CombinedRigCache;

/// Turn a director's raw requests into what the root evaluator executes, in order.
///
/// Unresolvable requests are dropped. Non-Main requests keep their order and come first.
/// Main activations then Main deactivations follow, each bucket collapsed into a single
/// request on a combined rig when it holds more than one.
pub(crate) fn arbitrate(
    arena: &ContextArena,
    cache: &mut CombinedRigCache,
    requests: Vec<DirectorRequest>,
) -> Vec<CameraRigRequest> {
    let mut out = Vec::new();
    let mut main_activations = Vec::new();
    let mut main_deactivations = Vec::new();

    for request in requests {
        let resolved = match resolve(arena, request) {
            Ok(r) => r,
            Err(err) => {
                tracing::warn!(%err, "dropping director request");
                continue;
            }
        };
        match (resolved.layer, resolved.kind) {
            (Layer::Main, RequestKind::Activate) => main_activations.push(resolved),
            (Layer::Main, RequestKind::Deactivate) => main_deactivations.push(resolved),
            _ => out.push(resolved),
        }
    }

    for bucket in [main_activations, main_deactivations] {
        match collapse(cache, bucket) {
            Ok(Some(r)) => out.push(r),
            Ok(None) => {}
            Err(err) => tracing::error!(%err, "cannot combine main layer requests"),
        }
    }
    out
}

fn resolve(arena: &ContextArena, request: DirectorRequest) -> CamRigResult<CameraRigRequest> {
    let ctx = arena.get(request.context).ok_or_else(|| {
        CamRigError::configuration(format!("context {:?} is gone", request.context))
    })?;
    let rig = match request.rig {
        RigReference::Rig(rig) => rig,
        RigReference::Proxy(proxy) => ctx
            .asset()
            .and_then(|asset| asset.resolve_proxy(&proxy))
            .cloned()
            .ok_or_else(|| {
                CamRigError::configuration(format!(
                    "context '{}' cannot resolve rig proxy '{proxy}'",
                    ctx.name()
                ))
            })?,
    };
    Ok(CameraRigRequest {
        kind: request.kind,
        context: request.context,
        rig,
        layer: request.layer,
        order_key: request.order_key,
        transition_override: request.transition_override,
        force: request.force,
    })
}

/// Fold same-kind Main requests into one. Conflicting contexts or transition overrides
/// are reported and the first one seen wins.
fn collapse(
    cache: &mut CombinedRigCache,
    mut bucket: Vec<CameraRigRequest>,
) -> CamRigResult<Option<CameraRigRequest>> {
    if bucket.len() <= 1 {
        return Ok(bucket.pop());
    }
    let mut rigs = Vec::with_capacity(bucket.len());
    let mut iter = bucket.into_iter();
    let Some(mut combined) = iter.next() else {
        return Ok(None);
    };
    rigs.push(Arc::clone(&combined.rig));
    for other in iter {
        if other.context != combined.context {
            let err = CamRigError::combination(format!(
                "rig '{}' requested by {:?}, combined rig belongs to {:?}",
                other.rig.name(),
                other.context,
                combined.context
            ));
            tracing::error!(%err, "keeping first context");
        }
        match (combined.transition_override, other.transition_override) {
            (None, Some(t)) => combined.transition_override = Some(t),
            (Some(a), Some(b)) if a != b => {
                let err = CamRigError::combination(format!(
                    "rig '{}' overrides the transition with {b:?}, already {a:?}",
                    other.rig.name()
                ));
                tracing::error!(%err, "keeping first transition override");
            }
            _ => {}
        }
        combined.force |= other.force;
        rigs.push(other.rig);
    }
    combined.rig = cache.get_or_build(&rigs)?;
    Ok(Some(combined))
}

#[cfg(test)]
#[path = "../../tests/unit/system/arbitration.rs"]
mod tests;
