use std::sync::Arc;

use camrig::{
    AimSolver, AimSolverParams, ArrayNode, BoomArmNode, CameraAsset, CameraRigAsset,
    CameraSystemOpts, ContextOwnerInfo, DVec3, DirectorConfig, DirectorRegistry,
    FieldOfViewNode, SystemEvaluator,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let rig = Arc::new(CameraRigAsset::new(
        "third_person",
        Arc::new(ArrayNode::new(vec![
            Arc::new(BoomArmNode {
                pivot_offset: DVec3::new(0.0, 0.0, 60.0),
                ..BoomArmNode::default()
            }),
            Arc::new(FieldOfViewNode { field_of_view: 80.0 }),
        ])),
    ));
    let director: DirectorConfig =
        serde_json::from_str(include_str!("../tests/data/player_director.json"))?;
    let asset = Arc::new(
        CameraAsset::new("player")
            .with_rig(rig)
            .with_proxy("default", "third_person")
            .with_director(director),
    );

    let opts = CameraSystemOpts::from_json_str(include_str!("../tests/data/camera_system.json"))?;
    let mut system = SystemEvaluator::new(opts, DirectorRegistry::with_builtins());
    let player = system.create_context("player", Some(asset), ContextOwnerInfo::default())?;
    if let Some(ctx) = system.context_mut(player) {
        ctx.initial_result_mut().pose.set_location(DVec3::new(0.0, 0.0, 90.0));
    }
    system.push_context(player)?;

    for _ in 0..3 {
        let pose = system.update(1.0 / 60.0).pose.clone();
        println!(
            "frame {}: location {:?} rotation {:?}",
            system.frame(),
            pose.location(),
            pose.rotation()
        );
    }

    let target = DVec3::new(1500.0, -900.0, 200.0);
    let mut solver = AimSolver::for_context(&system, player, AimSolverParams::default())?;
    let aimed = solver.run(&mut system, target);
    println!(
        "aim at {target:?}: {:?} after {} iteration(s), error {:?}",
        solver.state(),
        solver.iterations(),
        solver.last_error()
    );

    if aimed {
        let pose = &system.update(1.0 / 60.0).pose;
        println!("aimed rotation {:?}", pose.rotation());
    }

    Ok(())
}
