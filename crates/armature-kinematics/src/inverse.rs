//! Closed-form inverse kinematics for six-axis robots with a spherical wrist.
//!
//! Supported arms have the ABB layout at home: axis 1 along +Z, axes 2, 3
//! and 5 along +Y, axes 4 and 6 along +X, the arm in the XZ plane through
//! axis 1, and axes 4, 5 and 6 meeting in one point (the wrist centre).
//!
//! The solve splits into position (axes 1-3 place the wrist centre) and
//! orientation (axes 4-6 as an X-Y-X Euler decomposition). Each of the three
//! two-way choices is picked by a bit of the [`AxisConfiguration`].

use std::f64::consts::PI;

use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};

use armature_core::error::{ArmatureError, ChainError, InputError};
use armature_core::types::{
    AxisConfiguration, Diagnostic, DiagnosticKind, JointLimits, JointPosition, TargetPose,
    INTERNAL_AXIS_COUNT,
};

use crate::chain::{joint_transform, KinematicChain};

/// Tolerances for the closed-form solver.
#[derive(Debug, Clone)]
pub struct IkConfig {
    /// Tolerance of the home geometry checks (mm, and unitless for axis
    /// directions).
    pub geometry_tolerance: f64,
    /// The wrist counts as singular when `|sin(axis 5)|` is below this.
    pub wrist_singularity: f64,
    /// The shoulder counts as singular when the wrist centre is closer than
    /// this to axis 1 (mm).
    pub shoulder_singularity: f64,
}

impl Default for IkConfig {
    fn default() -> Self {
        Self {
            geometry_tolerance: 1e-6,
            wrist_singularity: 1e-6,
            shoulder_singularity: 1e-6,
        }
    }
}

/// Result of an IK solve.
#[derive(Debug, Clone, PartialEq)]
pub struct IkSolution {
    /// Solved joint values. Carries one external value when the chain has an
    /// external axis.
    pub position: JointPosition,
    /// Branch actually used.
    pub configuration: AxisConfiguration,
    /// Non-fatal findings: out of reach, singularities, limit violations.
    pub diagnostics: Vec<Diagnostic>,
}

impl IkSolution {
    /// No joint or external axis limit is violated.
    pub fn in_limits(&self) -> bool {
        !self.diagnostics.iter().any(|d| {
            matches!(
                d.kind,
                DiagnosticKind::JointOutOfLimits { .. } | DiagnosticKind::ExternalAxisOutOfLimits { .. }
            )
        })
    }

    /// The wrist centre was within reach of the arm.
    pub fn is_reachable(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::OutOfReach)
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.diagnostics.iter().map(|d| d.message.as_str())
    }
}

/// Arm dimensions extracted from the chain's home pose.
#[derive(Debug, Clone)]
struct ArmGeometry {
    /// Where axis 1 pierces the XY plane.
    axis1: [f64; 2],
    /// Radial offset of axis 2 from axis 1.
    shoulder_offset: f64,
    /// Height of axis 2.
    shoulder_height: f64,
    /// Axis 2 to axis 3.
    upper_arm: f64,
    /// Axis 3 to the wrist centre.
    forearm: f64,
    /// Planar angles of the two links at home (radians, from +X toward +Z).
    upper_angle: f64,
    forearm_angle: f64,
    wrist_in_flange: Point3<f64>,
    flange_home_rotation: UnitQuaternion<f64>,
}

impl ArmGeometry {
    fn from_chain(chain: &KinematicChain, tol: f64) -> Result<Self, ChainError> {
        let frames = chain.home_frames();
        let expected = [
            ("+Z", Vector3::z()),
            ("+Y", Vector3::y()),
            ("+Y", Vector3::y()),
            ("+X", Vector3::x()),
            ("+Y", Vector3::y()),
            ("+X", Vector3::x()),
        ];
        for (i, ((frame, joint), (label, want))) in
            frames.iter().zip(chain.joints()).zip(expected).enumerate()
        {
            let axis = frame.rotation * joint.axis.into_inner();
            if (axis - want).norm() > tol {
                return Err(ChainError::UnsupportedGeometry(format!(
                    "axis {} must point along {label} at home",
                    i + 1
                )));
            }
        }

        let p: Vec<Vector3<f64>> = frames.iter().map(|f| f.translation.vector).collect();
        if p.len() != INTERNAL_AXIS_COUNT {
            return Err(ChainError::JointCount {
                expected: INTERNAL_AXIS_COUNT,
                got: p.len(),
            });
        }
        let plane_y = p[0].y;
        if [p[1].y, p[2].y, p[3].y, p[5].y]
            .iter()
            .any(|y| (y - plane_y).abs() > tol)
        {
            return Err(ChainError::UnsupportedGeometry(
                "axes 2, 3, 4 and 6 must lie in the plane of axis 1".into(),
            ));
        }
        if (p[4].z - p[3].z).abs() > tol || (p[5].z - p[3].z).abs() > tol {
            return Err(ChainError::UnsupportedGeometry(
                "axes 4, 5 and 6 must intersect in one point".into(),
            ));
        }

        let wrist = Point3::new(p[4].x, p[3].y, p[3].z);
        let upper = (p[2].x - p[1].x, p[2].z - p[1].z);
        let fore = (wrist.x - p[2].x, wrist.z - p[2].z);
        let upper_arm = upper.0.hypot(upper.1);
        let forearm = fore.0.hypot(fore.1);
        if upper_arm < tol || forearm < tol {
            return Err(ChainError::UnsupportedGeometry(
                "upper arm and forearm must have non-zero length".into(),
            ));
        }

        let flange = chain.home_flange();
        Ok(Self {
            axis1: [p[0].x, p[0].y],
            shoulder_offset: p[1].x - p[0].x,
            shoulder_height: p[1].z,
            upper_arm,
            forearm,
            upper_angle: upper.1.atan2(upper.0),
            forearm_angle: fore.1.atan2(fore.0),
            wrist_in_flange: flange.inverse_transform_point(&wrist),
            flange_home_rotation: flange.rotation,
        })
    }

    fn reach(&self) -> (f64, f64) {
        (
            (self.upper_arm - self.forearm).abs(),
            self.upper_arm + self.forearm,
        )
    }
}

/// Closed-form IK solver for one chain.
pub struct AnalyticSolver<'a> {
    chain: &'a KinematicChain,
    geometry: ArmGeometry,
    config: IkConfig,
}

impl<'a> AnalyticSolver<'a> {
    /// Create a solver for `chain`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnsupportedGeometry`] if the chain does not have
    /// the supported layout.
    pub fn new(chain: &'a KinematicChain, config: IkConfig) -> Result<Self, ChainError> {
        chain.validate()?;
        let geometry = ArmGeometry::from_chain(chain, config.geometry_tolerance)?;
        Ok(Self {
            chain,
            geometry,
            config,
        })
    }

    /// Create a solver with default tolerances.
    pub fn with_defaults(chain: &'a KinematicChain) -> Result<Self, ChainError> {
        Self::new(chain, IkConfig::default())
    }

    /// Solve for the joint values placing the TCP at `target`.
    ///
    /// Always returns a solution for finite input. Unreachable targets are
    /// clamped to the nearest reachable wrist position and reported, as are
    /// singularities and limit violations.
    pub fn solve(&self, target: &TargetPose) -> Result<IkSolution, InputError> {
        target.validate()?;
        let g = &self.geometry;
        let mut diagnostics = Vec::new();

        let requested = target.configuration;
        if !requested.is_valid() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::InvalidConfiguration {
                    value: requested.value(),
                },
                format!("Axis configuration {requested} is not valid, using configuration 0."),
            ));
        }
        let cfg = requested.effective();
        tracing::debug!(configuration = cfg.value(), "solving inverse kinematics");

        let external = self
            .chain
            .external_axis()
            .map(|ext| ext.resolve(target.external, &target.pose));
        let base = self.chain.base_frame(external.unwrap_or(0.0));
        let flange = base.inverse() * target.pose * self.chain.tool().tcp.inverse();
        let wrist = flange * g.wrist_in_flange;

        // Axis 1
        let dx = wrist.x - g.axis1[0];
        let dy = wrist.y - g.axis1[1];
        let radius = dx.hypot(dy);
        let mut q1 = if radius < self.config.shoulder_singularity {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::ShoulderSingularity,
                "The wrist centre lies on axis 1, axis 1 is undetermined.",
            ));
            0.0
        } else {
            dy.atan2(dx)
        };
        let mut radial = radius;
        if cfg.shoulder_back() {
            q1 += PI;
            radial = -radius;
        }

        // Axes 2 and 3
        let px = radial - g.shoulder_offset;
        let pz = wrist.z - g.shoulder_height;
        let distance = px.hypot(pz);
        let mut cos_elbow = (distance * distance - g.upper_arm * g.upper_arm - g.forearm * g.forearm)
            / (2.0 * g.upper_arm * g.forearm);
        if !(-1.0..=1.0).contains(&cos_elbow) {
            let (min, max) = g.reach();
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::OutOfReach,
                format!(
                    "The target is out of reach: the wrist centre is {distance:.2} mm from axis 2, reach is {min:.2} to {max:.2} mm."
                ),
            ));
            cos_elbow = cos_elbow.clamp(-1.0, 1.0);
        }
        let elbow = if cfg.elbow_alternate() {
            cos_elbow.acos()
        } else {
            -cos_elbow.acos()
        };
        let q3 = g.forearm_angle - g.upper_angle - elbow;
        let q2 = g.upper_angle - pz.atan2(px)
            + (g.forearm * elbow.sin()).atan2(g.upper_arm + g.forearm * elbow.cos());

        // Axes 4, 5 and 6: the remaining rotation is Rx(q4) Ry(q5) Rx(q6).
        let arm = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), q1)
            * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), q2 + q3);
        let wrist_rotation =
            (arm.inverse() * flange.rotation * g.flange_home_rotation.inverse()).to_rotation_matrix();
        let m = wrist_rotation.matrix();
        let sin5 = m[(1, 0)].hypot(m[(2, 0)]);
        let cos5 = m[(0, 0)];
        let flip = cfg.wrist_flip();
        let (q4, q5, q6) = if sin5 < self.config.wrist_singularity {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::WristSingularity,
                "Axis 5 is at a wrist singularity, axes 4 and 6 are coupled.",
            ));
            if cos5 > 0.0 {
                (0.0, 0.0, m[(2, 1)].atan2(m[(1, 1)]))
            } else {
                let q5 = if flip { -PI } else { PI };
                (0.0, q5, (-m[(1, 2)]).atan2(m[(1, 1)]))
            }
        } else if flip {
            (
                (-m[(1, 0)]).atan2(m[(2, 0)]),
                (-sin5).atan2(cos5),
                (-m[(0, 1)]).atan2(-m[(0, 2)]),
            )
        } else {
            (
                m[(1, 0)].atan2(-m[(2, 0)]),
                sin5.atan2(cos5),
                m[(0, 1)].atan2(m[(0, 2)]),
            )
        };

        let mut internal = [0.0; INTERNAL_AXIS_COUNT];
        for (i, (slot, value)) in internal
            .iter_mut()
            .zip([q1, q2, q3, q4, q5, q6])
            .enumerate()
        {
            let limits = self.chain.joints()[i].limits;
            *slot = representative_angle(value.to_degrees(), limits);
            if !limits.contains(*slot) {
                diagnostics.push(Diagnostic::joint_out_of_limits(i + 1, *slot, limits));
            }
        }

        let mut position = JointPosition::new(internal);
        if let (Some(ext), Some(value)) = (self.chain.external_axis(), external) {
            if !ext.limits.contains(value) {
                diagnostics.push(Diagnostic::external_out_of_limits(&ext.name, value, ext.limits));
            }
            position.external.push(value);
        }

        for d in &diagnostics {
            tracing::warn!("{d}");
        }

        Ok(IkSolution {
            position,
            configuration: cfg,
            diagnostics,
        })
    }

    /// Branch selector that reproduces `position` when passed back to
    /// [`solve`](Self::solve).
    pub fn configuration_of(&self, position: &JointPosition) -> Result<AxisConfiguration, InputError> {
        position.validate()?;
        let g = &self.geometry;
        let q = &position.internal;

        let mut transform = Isometry3::identity();
        for (joint, &value) in self.chain.joints().iter().zip(q) {
            transform *= joint.origin;
            transform *= joint_transform(&joint.axis, value);
        }
        let wrist = transform * self.chain.flange_offset() * g.wrist_in_flange;

        let q1 = q[0].to_radians();
        let radial = (wrist.x - g.axis1[0]) * q1.cos() + (wrist.y - g.axis1[1]) * q1.sin();
        let elbow = wrap_degrees((g.forearm_angle - g.upper_angle).to_degrees() - q[2]);

        Ok(AxisConfiguration::from_branches(
            radial < 0.0,
            elbow > 0.0,
            wrap_degrees(q[4]) < 0.0,
        ))
    }
}

/// Solve IK for `target` with default tolerances.
pub fn inverse_kinematics(
    chain: &KinematicChain,
    target: &TargetPose,
) -> Result<IkSolution, ArmatureError> {
    Ok(AnalyticSolver::with_defaults(chain)?.solve(target)?)
}

/// Wrap an angle in degrees into `(-180, 180]`.
pub fn wrap_degrees(degrees: f64) -> f64 {
    180.0 - (180.0 - degrees).rem_euclid(360.0)
}

/// Wrapped angle, shifted by a full turn when that brings it into `limits`.
fn representative_angle(degrees: f64, limits: JointLimits) -> f64 {
    let wrapped = wrap_degrees(degrees);
    if limits.contains(wrapped) {
        return wrapped;
    }
    [wrapped - 360.0, wrapped + 360.0]
        .into_iter()
        .find(|v| limits.contains(*v))
        .unwrap_or(wrapped)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
