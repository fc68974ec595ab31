//! Per-run generation state.
//!
//! A [`GenerationContext`] lives for exactly one generation run. It records
//! every declared name so each variable is written once, tracks the active
//! tool, and collects diagnostics.

use std::collections::HashMap;

use armature_core::types::{Diagnostic, DiagnosticKind, JointPosition};
use armature_kinematics::Tool;

use crate::speed::SpeedData;
use crate::target::Target;

/// Compilation phase. Runs strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Start,
    DeclaringVariables,
    EmittingInstructions,
    Assembled,
}

/// What a registered name was declared from.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Speed(SpeedData),
    RobTarget(Target),
    /// Joint values depend on the tool the target was solved for.
    JointTarget { target: Target, tool: Tool },
    AbsoluteJoints(JointPosition),
}

impl Declaration {
    fn describe(&self) -> &'static str {
        match self {
            Self::Speed(_) => "speeddata",
            Self::RobTarget(_) => "robtarget",
            Self::JointTarget { .. } | Self::AbsoluteJoints(_) => "jointtarget",
        }
    }
}

/// Mutable state threaded through both passes of one generation run.
#[derive(Debug)]
pub struct GenerationContext {
    registry: HashMap<String, Declaration>,
    initial_tool: Tool,
    current_tool: Tool,
    phase: Phase,
    diagnostics: Vec<Diagnostic>,
}

impl GenerationContext {
    /// Fresh context; `tool` is active until an action overrides it.
    pub fn new(tool: Tool) -> Self {
        Self {
            registry: HashMap::new(),
            current_tool: tool.clone(),
            initial_tool: tool,
            phase: Phase::Start,
            diagnostics: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn begin_declarations(&mut self) {
        self.advance(Phase::DeclaringVariables);
    }

    /// Enter the instruction pass. The active tool starts over from the
    /// initial tool.
    pub(crate) fn begin_instructions(&mut self) {
        self.advance(Phase::EmittingInstructions);
        self.current_tool = self.initial_tool.clone();
    }

    /// Close the run and hand back its diagnostics.
    pub(crate) fn finish(mut self) -> Vec<Diagnostic> {
        self.advance(Phase::Assembled);
        self.diagnostics
    }

    fn advance(&mut self, next: Phase) {
        debug_assert!(next > self.phase, "{:?} after {:?}", next, self.phase);
        tracing::debug!(from = ?self.phase, to = ?next, "generation phase");
        self.phase = next;
    }

    /// Register `name`. Returns `true` if the caller should write the
    /// declaration, `false` if the name is already taken.
    ///
    /// The first declaration wins; a later, different one is reported as a
    /// conflict and dropped.
    pub fn register(&mut self, name: &str, declaration: Declaration) -> bool {
        match self.registry.get(name) {
            None => {
                self.registry.insert(name.to_owned(), declaration);
                true
            }
            Some(existing) if *existing == declaration => false,
            Some(existing) => {
                let diagnostic = Diagnostic::new(
                    DiagnosticKind::DeclarationConflict {
                        name: name.to_owned(),
                    },
                    format!(
                        "'{name}' is already declared as a different {}, the first declaration is kept.",
                        existing.describe()
                    ),
                );
                tracing::warn!("{diagnostic}");
                self.diagnostics.push(diagnostic);
                false
            }
        }
    }

    pub fn current_tool(&self) -> &Tool {
        &self.current_tool
    }

    pub fn set_current_tool(&mut self, tool: Tool) {
        self.current_tool = tool;
    }

    /// Attach a diagnostic to this run.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Isometry3;

    #[test]
    fn first_registration_wins() {
        let mut ctx = GenerationContext::new(Tool::tool0());
        let slow = SpeedData::new("slow", 50.0);
        assert!(ctx.register("slow", Declaration::Speed(slow.clone())));
        assert!(!ctx.register("slow", Declaration::Speed(slow)));
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn conflicting_registration_is_reported() {
        let mut ctx = GenerationContext::new(Tool::tool0());
        assert!(ctx.register("slow", Declaration::Speed(SpeedData::new("slow", 50.0))));
        assert!(!ctx.register("slow", Declaration::Speed(SpeedData::new("slow", 80.0))));
        assert_eq!(ctx.diagnostics().len(), 1);
        assert_eq!(
            ctx.diagnostics()[0].kind,
            DiagnosticKind::DeclarationConflict {
                name: "slow".into()
            }
        );
    }

    #[test]
    fn phases_advance_in_order() {
        let mut ctx = GenerationContext::new(Tool::tool0());
        assert_eq!(ctx.phase(), Phase::Start);
        ctx.begin_declarations();
        assert_eq!(ctx.phase(), Phase::DeclaringVariables);
        ctx.begin_instructions();
        assert_eq!(ctx.phase(), Phase::EmittingInstructions);
        assert!(ctx.finish().is_empty());
    }

    #[test]
    fn instruction_pass_restarts_with_initial_tool() {
        let mut ctx = GenerationContext::new(Tool::tool0());
        ctx.begin_declarations();
        ctx.set_current_tool(Tool::new("gripper", Isometry3::translation(0.0, 0.0, 100.0)));
        assert_eq!(ctx.current_tool().name, "gripper");
        ctx.begin_instructions();
        assert_eq!(ctx.current_tool().name, "tool0");
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn phases_cannot_go_back() {
        let mut ctx = GenerationContext::new(Tool::tool0());
        ctx.begin_declarations();
        ctx.begin_instructions();
        ctx.begin_declarations();
    }
}
