//! Forward then inverse kinematics reproduces the joint values.

use approx::assert_relative_eq;
use armature_core::types::{AxisConfiguration, ExternalAxisTarget, JointPosition, TargetPose};
use armature_kinematics::{forward_kinematics, wrap_degrees, AnalyticSolver, KinematicChain, Tool};
use armature_test_utils::{irb1200, irb1200_on_track, irb4600, random_joint_position, seeded_rng};
use nalgebra::Isometry3;

fn assert_roundtrip(chain: &KinematicChain, seed: u64, samples: usize) {
    let solver = AnalyticSolver::with_defaults(chain).unwrap();
    let mut rng = seeded_rng(seed);
    for _ in 0..samples {
        let position = random_joint_position(&mut rng);
        let tcp = forward_kinematics(chain, &position).unwrap().tcp_frame;
        let cfg = solver.configuration_of(&position).unwrap();
        let solution = solver.solve(&TargetPose::new(tcp, cfg)).unwrap();

        assert!(
            solution.diagnostics.is_empty(),
            "{:?} -> {:?}",
            position.internal,
            solution.diagnostics
        );
        for (got, want) in solution.position.internal.iter().zip(&position.internal) {
            assert_relative_eq!(wrap_degrees(got - want), 0.0, epsilon = 1e-6);
        }
    }
}

#[test]
fn irb1200_roundtrip() {
    assert_roundtrip(&irb1200(), 1, 200);
}

#[test]
fn irb4600_roundtrip() {
    assert_roundtrip(&irb4600(), 2, 200);
}

#[test]
fn roundtrip_with_tool_and_mounting() {
    let chain = irb1200()
        .with_tool(Tool::new("torch", Isometry3::translation(20.0, 0.0, 180.0)))
        .with_mounting_frame(Isometry3::translation(1000.0, -500.0, 200.0));
    assert_roundtrip(&chain, 3, 100);
}

#[test]
fn every_branch_reaches_the_target_pose() {
    let chain = irb4600();
    let solver = AnalyticSolver::with_defaults(&chain).unwrap();
    let mut rng = seeded_rng(4);
    for _ in 0..20 {
        let position = random_joint_position(&mut rng);
        let tcp = forward_kinematics(&chain, &position).unwrap().tcp_frame;
        for cfg in 0..AxisConfiguration::BRANCH_COUNT {
            let solution = solver
                .solve(&TargetPose::new(tcp, AxisConfiguration::new(cfg)))
                .unwrap();
            if !solution.is_reachable() {
                continue;
            }
            let reached = forward_kinematics(&chain, &solution.position)
                .unwrap()
                .tcp_frame;
            assert_relative_eq!(
                reached.translation.vector,
                tcp.translation.vector,
                epsilon = 1e-6
            );
            assert_relative_eq!(reached.rotation.angle_to(&tcp.rotation), 0.0, epsilon = 1e-6);
        }
    }
}

#[test]
fn track_value_is_reproduced() {
    let chain = irb1200_on_track();
    let solver = AnalyticSolver::with_defaults(&chain).unwrap();
    let mut rng = seeded_rng(5);
    for i in 0..50 {
        let track = 50.0 * i as f64;
        let position = JointPosition {
            external: vec![track],
            ..random_joint_position(&mut rng)
        };
        let tcp = forward_kinematics(&chain, &position).unwrap().tcp_frame;
        let cfg = solver.configuration_of(&position).unwrap();
        let target = TargetPose::new(tcp, cfg).with_external(ExternalAxisTarget::Value(track));
        let solution = solver.solve(&target).unwrap();
        assert!(solution.diagnostics.is_empty());
        assert_relative_eq!(solution.position.external[0], track);
        for (got, want) in solution.position.internal.iter().zip(&position.internal) {
            assert_relative_eq!(wrap_degrees(got - want), 0.0, epsilon = 1e-6);
        }
    }
}
