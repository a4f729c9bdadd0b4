use super::*;
use crate::rig::operation::YawPitchOperation;

#[derive(Debug)]
struct Tracer {
    counter: u32,
    flags: NodeEvaluatorFlags,
    yaw_budget: f64,
    children: Vec<Box<dyn CameraNodeEvaluator>>,
}

impl Tracer {
    fn leaf(flags: NodeEvaluatorFlags) -> Box<dyn CameraNodeEvaluator> {
        Box::new(Self {
            counter: 0,
            flags,
            yaw_budget: 0.0,
            children: Vec::new(),
        })
    }
}

impl CameraNodeEvaluator for Tracer {
    fn flags(&self) -> NodeEvaluatorFlags {
        self.flags
    }

    fn run(&mut self, _params: &NodeEvaluationParams, _out: &mut EvaluationResult) {
        self.counter += 1;
    }

    fn execute_operation(&mut self, _params: &NodeOperationParams, op: &mut CameraOperation) {
        let CameraOperation::YawPitch(yp) = op;
        yp.yaw.consume(self.yaw_budget);
    }

    fn serialize_state(&self, w: &mut StateWriter) -> CamRigResult<()> {
        w.write(&self.counter)
    }

    fn deserialize_state(&mut self, r: &mut StateReader<'_>) -> CamRigResult<()> {
        self.counter = r.read()?;
        Ok(())
    }

    fn for_each_child(&self, f: &mut dyn FnMut(&dyn CameraNodeEvaluator)) {
        for c in &self.children {
            f(c.as_ref());
        }
    }

    fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut dyn CameraNodeEvaluator)) {
        for c in &mut self.children {
            f(c.as_mut());
        }
    }
}

fn tree() -> NodeEvaluatorTree {
    let mut root = Tracer {
        counter: 3,
        flags: NodeEvaluatorFlags::STATEFUL,
        yaw_budget: 0.0,
        children: Vec::new(),
    };
    let mut mid = Tracer {
        counter: 0,
        flags: NodeEvaluatorFlags::ARTICULATED,
        yaw_budget: 5.0,
        children: Vec::new(),
    };
    mid.children.push(Tracer::leaf(NodeEvaluatorFlags::NONE));
    root.children.push(Box::new(mid));
    root.children.push(Box::new(Tracer {
        counter: 7,
        flags: NodeEvaluatorFlags::ARTICULATED,
        yaw_budget: 100.0,
        children: Vec::new(),
    }));
    NodeEvaluatorTree {
        root: Box::new(root),
    }
}

fn flag_order(t: &NodeEvaluatorTree) -> Vec<NodeEvaluatorFlags> {
    let mut out = Vec::new();
    t.visit(&mut |n| out.push(n.flags()));
    out
}

#[test]
fn visit_is_pre_order() {
    let t = tree();
    assert_eq!(
        flag_order(&t),
        vec![
            NodeEvaluatorFlags::STATEFUL,
            NodeEvaluatorFlags::ARTICULATED,
            NodeEvaluatorFlags::NONE,
            NodeEvaluatorFlags::ARTICULATED,
        ]
    );
    assert_eq!(t.evaluator_count(), 4);
}

#[test]
fn state_round_trips_through_archive() {
    let t = tree();
    let mut w = StateWriter::new();
    t.serialize_state(&mut w).unwrap();
    let bytes = w.into_bytes();

    let mut other = tree();
    let params = NodeEvaluationParams {
        context: ContextHandle::new(0, 0),
        delta_time: 0.016,
        is_first_frame: true,
        is_isolated: false,
    };
    other.run(&params, &mut EvaluationResult::default());
    let mut moved = StateWriter::new();
    other.serialize_state(&mut moved).unwrap();
    assert_ne!(moved.into_bytes(), bytes);

    let mut r = StateReader::new(&bytes);
    other.deserialize_state(&mut r).unwrap();
    r.finish().unwrap();

    let mut again = StateWriter::new();
    other.serialize_state(&mut again).unwrap();
    assert_eq!(again.into_bytes(), bytes);
}

#[test]
fn operations_reach_only_capable_nodes_in_order() {
    let mut t = tree();
    let params = NodeOperationParams {
        context: ContextHandle::new(0, 0),
    };
    let mut op = CameraOperation::YawPitch(YawPitchOperation::new(12.0, 0.0));
    t.execute_operation(&params, &mut op);
    let CameraOperation::YawPitch(yp) = op;
    assert!(!yp.has_remaining());

    let mut op = CameraOperation::YawPitch(YawPitchOperation::new(-3.0, 0.0));
    t.execute_operation(&params, &mut op);
    let CameraOperation::YawPitch(yp) = op;
    assert!((yp.yaw.remaining() + 3.0).abs() < 1e-12);
}
