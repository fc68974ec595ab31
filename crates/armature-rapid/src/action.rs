//! Program steps.
//!
//! Every [`Action`] can declare the variables it needs (first pass) and emits
//! exactly one instruction line (second pass).

use armature_core::types::{Diagnostic, JointPosition};
use armature_kinematics::{forward_kinematics, AnalyticSolver, IkSolution, KinematicChain, Tool};

use crate::context::{Declaration, GenerationContext};
use crate::error::ActionError;
use crate::format::{self, is_identifier};
use crate::speed::{SpeedData, ZoneData};
use crate::target::Target;

/// Work object referenced by pose-based moves. Targets are world poses.
const WORK_OBJECT: &str = "wobj0";

/// Reserved for joining lines before the final line-ending pass.
pub(crate) const LINE_SEPARATOR: char = '\u{1e}';

/// Interpolation of a [`Move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionType {
    /// Straight TCP path (`MoveL` to a robtarget).
    Linear,
    /// Axis interpolation (`MoveAbsJ` to a solved jointtarget).
    Joint,
}

/// Move the TCP to a target.
#[derive(Debug, Clone, PartialEq)]
pub struct Move {
    pub target: Target,
    pub speed: SpeedData,
    pub motion: MotionType,
    /// Negative for an exact stop, otherwise the zone size.
    pub precision: i32,
    /// Tool for this move only.
    pub tool: Option<Tool>,
}

impl Move {
    pub fn linear(target: Target, speed: SpeedData) -> Self {
        Self::new(target, speed, MotionType::Linear)
    }

    pub fn joint(target: Target, speed: SpeedData) -> Self {
        Self::new(target, speed, MotionType::Joint)
    }

    fn new(target: Target, speed: SpeedData, motion: MotionType) -> Self {
        Self {
            target,
            speed,
            motion,
            precision: 0,
            tool: None,
        }
    }

    pub fn with_precision(mut self, precision: i32) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tool = Some(tool);
        self
    }

    fn declare(
        &self,
        ctx: &mut GenerationContext,
        chain: &KinematicChain,
    ) -> Result<Vec<String>, ActionError> {
        let mut lines = declare_speed(&self.speed, ctx);
        match self.motion {
            MotionType::Linear => {
                let name = self.target.rob_target_name();
                if ctx.register(&name, Declaration::RobTarget(self.target.clone())) {
                    let external: Vec<f64> = chain
                        .external_axis()
                        .map(|ext| ext.resolve(self.target.external, &self.target.pose))
                        .into_iter()
                        .collect();
                    lines.push(self.target.rob_target_declaration(&external));
                }
            }
            MotionType::Joint => {
                let tool = self.tool.as_ref().unwrap_or(ctx.current_tool()).clone();
                let name = self.target.joint_target_name();
                let declaration = Declaration::JointTarget {
                    target: self.target.clone(),
                    tool: tool.clone(),
                };
                if ctx.register(&name, declaration) {
                    let solution = solve(chain, &tool, &self.target)?;
                    for d in solution.diagnostics {
                        ctx.report(for_target(&self.target.name, d));
                    }
                    lines.push(self.target.joint_target_declaration(&solution.position));
                }
            }
        }
        Ok(lines)
    }

    fn emit(&self, ctx: &GenerationContext) -> String {
        let tool = self.tool.as_ref().unwrap_or(ctx.current_tool());
        let (instruction, target) = match self.motion {
            MotionType::Linear => ("MoveL", self.target.rob_target_name()),
            MotionType::Joint => ("MoveAbsJ", self.target.joint_target_name()),
        };
        format!(
            "\t{instruction} {target}, {}, {}, {}\\WObj:={WORK_OBJECT};",
            self.speed.name,
            ZoneData::from_precision(self.precision),
            tool.name
        )
    }
}

/// Move to explicitly given joint values.
#[derive(Debug, Clone, PartialEq)]
pub struct AbsoluteJointMove {
    /// Declared as `<name>_jm`.
    pub name: String,
    pub position: JointPosition,
    pub speed: SpeedData,
    /// Negative for an exact stop, otherwise the zone size.
    pub precision: i32,
    /// Tool for this move only.
    pub tool: Option<Tool>,
}

impl AbsoluteJointMove {
    /// Move at the slowest predefined speed (`v5`) with zone `z0`.
    pub fn new(name: impl Into<String>, position: JointPosition) -> Self {
        Self {
            name: name.into(),
            position,
            speed: SpeedData::default(),
            precision: 0,
            tool: None,
        }
    }

    pub fn with_speed(mut self, speed: SpeedData) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_precision(mut self, precision: i32) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tool = Some(tool);
        self
    }

    pub fn joint_target_name(&self) -> String {
        format!("{}_jm", self.name)
    }

    fn declare(
        &self,
        ctx: &mut GenerationContext,
        chain: &KinematicChain,
    ) -> Result<Vec<String>, ActionError> {
        let mut lines = declare_speed(&self.speed, ctx);
        let name = self.joint_target_name();
        if ctx.register(&name, Declaration::AbsoluteJoints(self.position.clone())) {
            let posed = forward_kinematics(chain, &self.position)?;
            for d in posed.diagnostics {
                ctx.report(for_target(&self.name, d));
            }
            lines.push(format!(
                "\tCONST jointtarget {name}:=[{}];",
                format::joint_record(&self.position)
            ));
        }
        Ok(lines)
    }

    fn emit(&self, ctx: &GenerationContext) -> String {
        let tool = self.tool.as_ref().unwrap_or(ctx.current_tool());
        format!(
            "\tMoveAbsJ {}, {}, {}, {};",
            self.joint_target_name(),
            self.speed.name,
            ZoneData::from_precision(self.precision),
            tool.name
        )
    }
}

/// One step of a robot program.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Move(Move),
    AbsoluteJointMove(AbsoluteJointMove),
    /// Wait until a digital input has the given state.
    WaitDigitalInput { signal: String, state: bool },
    /// Make `tool` the active tool for all following actions.
    OverrideTool { tool: Tool },
    SetDigitalOutput { signal: String, value: bool },
    /// Pause for a number of seconds.
    WaitTime { seconds: f64 },
    /// `!` comment line.
    Comment { text: String },
    /// A verbatim line of RAPID code.
    CodeLine { code: String },
}

impl Action {
    /// Check names and values. Nothing is generated for a list containing an
    /// invalid action.
    pub fn validate(&self) -> Result<(), ActionError> {
        match self {
            Self::Move(m) => {
                m.target.validate()?;
                m.speed.validate()?;
                if let Some(tool) = &m.tool {
                    validate_identifier(&tool.name, "Tool")?;
                }
                Ok(())
            }
            Self::AbsoluteJointMove(m) => {
                validate_identifier(&m.joint_target_name(), "Joint target")?;
                m.position.validate()?;
                m.speed.validate()?;
                if let Some(tool) = &m.tool {
                    validate_identifier(&tool.name, "Tool")?;
                }
                Ok(())
            }
            Self::WaitDigitalInput { signal, .. } | Self::SetDigitalOutput { signal, .. } => {
                validate_identifier(signal, "Signal")
            }
            Self::OverrideTool { tool } => validate_identifier(&tool.name, "Tool"),
            Self::WaitTime { seconds } => {
                if seconds.is_finite() && *seconds >= 0.0 {
                    Ok(())
                } else {
                    Err(ActionError::OutOfRange {
                        what: "Wait time",
                        value: *seconds,
                    })
                }
            }
            Self::Comment { text } => single_line(text),
            Self::CodeLine { code } => single_line(code),
        }
    }

    /// First pass: declaration lines this action contributes, if any.
    ///
    /// Names already registered in `ctx` are skipped. Joint moves run the
    /// inverse kinematics here; its diagnostics go to `ctx`.
    pub fn declare(
        &self,
        ctx: &mut GenerationContext,
        chain: &KinematicChain,
    ) -> Result<Vec<String>, ActionError> {
        match self {
            Self::Move(m) => m.declare(ctx, chain),
            Self::AbsoluteJointMove(m) => m.declare(ctx, chain),
            Self::OverrideTool { tool } => {
                ctx.set_current_tool(tool.clone());
                Ok(Vec::new())
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Second pass: the instruction line.
    pub fn emit(&self, ctx: &mut GenerationContext) -> String {
        match self {
            Self::Move(m) => m.emit(ctx),
            Self::AbsoluteJointMove(m) => m.emit(ctx),
            Self::WaitDigitalInput { signal, state } => {
                format!("\tWaitDI {signal}, {};", u8::from(*state))
            }
            Self::OverrideTool { tool } => {
                ctx.set_current_tool(tool.clone());
                format!("\t! Tool changed to {}", tool.name)
            }
            Self::SetDigitalOutput { signal, value } => {
                format!("\tSetDO {signal}, {};", u8::from(*value))
            }
            Self::WaitTime { seconds } => format!("\tWaitTime {};", format::number(*seconds, 3)),
            Self::Comment { text } => format!("\t! {text}"),
            Self::CodeLine { code } => format!("\t{code}"),
        }
    }

    /// Whether this action moves the robot.
    pub fn is_motion(&self) -> bool {
        matches!(self, Self::Move(_) | Self::AbsoluteJointMove(_))
    }

    /// Whether the emitted instruction is `MoveAbsJ`.
    pub fn is_absolute_joint_move(&self) -> bool {
        match self {
            Self::Move(m) => m.motion == MotionType::Joint,
            Self::AbsoluteJointMove(_) => true,
            _ => false,
        }
    }
}

impl From<Move> for Action {
    fn from(value: Move) -> Self {
        Self::Move(value)
    }
}

impl From<AbsoluteJointMove> for Action {
    fn from(value: AbsoluteJointMove) -> Self {
        Self::AbsoluteJointMove(value)
    }
}

fn declare_speed(speed: &SpeedData, ctx: &mut GenerationContext) -> Vec<String> {
    if !speed.is_predefined() && ctx.register(&speed.name, Declaration::Speed(speed.clone())) {
        vec![speed.declaration()]
    } else {
        Vec::new()
    }
}

/// Solve `target` for `chain` carrying `tool`.
fn solve(chain: &KinematicChain, tool: &Tool, target: &Target) -> Result<IkSolution, ActionError> {
    let pose = target.to_target_pose();
    if chain.tool() == tool {
        return Ok(AnalyticSolver::with_defaults(chain)?.solve(&pose)?);
    }
    let chain = chain.clone().with_tool(tool.clone());
    Ok(AnalyticSolver::with_defaults(&chain)?.solve(&pose)?)
}

fn for_target(name: &str, diagnostic: Diagnostic) -> Diagnostic {
    Diagnostic::new(diagnostic.kind, format!("{name}: {}", diagnostic.message))
}

fn validate_identifier(name: &str, what: &'static str) -> Result<(), ActionError> {
    if name.is_empty() {
        return Err(ActionError::EmptyName { what });
    }
    if !is_identifier(name) {
        return Err(ActionError::InvalidIdentifier(name.to_owned()));
    }
    Ok(())
}

fn single_line(text: &str) -> Result<(), ActionError> {
    if text.contains(['\n', '\r', LINE_SEPARATOR]) {
        return Err(ActionError::MultiLine(text.to_owned()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
