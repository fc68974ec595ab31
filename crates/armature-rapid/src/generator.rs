//! Two-pass program compiler.
//!
//! ```text
//! actions ──► declare (pass 1) ──► declarations ─┐
//!        └──► emit    (pass 2) ──► instructions ─┴─► MODULE … ENDMODULE
//! ```

use armature_core::config::GeneratorConfig;
use armature_core::types::Diagnostic;
use armature_kinematics::KinematicChain;
use tracing::{debug, info};

use crate::action::{Action, LINE_SEPARATOR};
use crate::context::GenerationContext;
use crate::error::ActionError;
use crate::format::is_identifier;

/// Output of one generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedProgram {
    /// Complete module text with the configured line endings.
    pub code: String,
    /// Whether the first motion instruction is a `MoveAbsJ`. Advisory only.
    pub first_movement_is_absolute_joint: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl GeneratedProgram {
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.diagnostics.iter().map(|d| d.message.as_str())
    }
}

/// Compiles action lists into a RAPID main module for one robot.
#[derive(Debug, Clone)]
pub struct RapidGenerator<'a> {
    module_name: String,
    chain: &'a KinematicChain,
    config: GeneratorConfig,
}

impl<'a> RapidGenerator<'a> {
    pub fn new(module_name: impl Into<String>, chain: &'a KinematicChain) -> Result<Self, ActionError> {
        let module_name = module_name.into();
        if module_name.is_empty() {
            return Err(ActionError::EmptyName { what: "Module" });
        }
        if !is_identifier(&module_name) {
            return Err(ActionError::InvalidIdentifier(module_name));
        }
        chain.validate()?;
        Ok(Self {
            module_name,
            chain,
            config: GeneratorConfig::default(),
        })
    }

    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Compile `actions`.
    ///
    /// All actions are validated before any text is produced. Kinematic
    /// problems do not fail the run; they end up in
    /// [`GeneratedProgram::diagnostics`].
    pub fn generate(&self, actions: &[Action]) -> Result<GeneratedProgram, ActionError> {
        for action in actions {
            action.validate()?;
        }

        let mut ctx = GenerationContext::new(self.chain.tool().clone());

        ctx.begin_declarations();
        let mut declarations = Vec::new();
        for action in actions {
            declarations.extend(action.declare(&mut ctx, self.chain)?);
        }

        ctx.begin_instructions();
        let instructions: Vec<String> = actions.iter().map(|a| a.emit(&mut ctx)).collect();
        let first_movement_is_absolute_joint = actions
            .iter()
            .find(|a| a.is_motion())
            .is_some_and(Action::is_absolute_joint_move);

        let diagnostics = ctx.finish();
        let code = self.assemble(&declarations, &instructions);
        info!(
            module = %self.module_name,
            declarations = declarations.len(),
            instructions = instructions.len(),
            diagnostics = diagnostics.len(),
            "generated program"
        );
        if !first_movement_is_absolute_joint {
            debug!("first movement is not an absolute joint move");
        }

        Ok(GeneratedProgram {
            code,
            first_movement_is_absolute_joint,
            diagnostics,
        })
    }

    fn assemble(&self, declarations: &[String], instructions: &[String]) -> String {
        let sep = LINE_SEPARATOR;
        let mut code = format!("MODULE {}{sep}", self.module_name);
        for line in declarations {
            code.push(sep);
            code.push_str(line);
        }
        code.push(sep);
        code.push(sep);
        code.push_str("\tPROC main()");
        for line in instructions {
            code.push(sep);
            code.push_str(line);
        }
        code.push(sep);
        code.push_str("\tENDPROC");
        code.push(sep);
        code.push(sep);
        code.push_str("ENDMODULE");
        normalize_line_endings(&code, &self.config)
    }
}

/// Replace the internal separator with the configured line ending.
pub(crate) fn normalize_line_endings(code: &str, config: &GeneratorConfig) -> String {
    code.replace(LINE_SEPARATOR, config.line_ending.as_str())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use armature_core::config::LineEnding;
    use armature_core::types::JointPosition;
    use armature_test_utils::irb1200;

    use crate::action::AbsoluteJointMove;

    fn lf() -> GeneratorConfig {
        GeneratorConfig {
            line_ending: LineEnding::Lf,
        }
    }

    #[test]
    fn empty_program_layout() {
        let chain = irb1200();
        let generator = RapidGenerator::new("MainModule", &chain).unwrap().with_config(lf());
        let program = generator.generate(&[]).unwrap();
        assert_eq!(
            program.code,
            "MODULE MainModule\n\n\n\tPROC main()\n\tENDPROC\n\nENDMODULE"
        );
        assert!(!program.first_movement_is_absolute_joint);
        assert!(program.diagnostics.is_empty());
    }

    #[test]
    fn crlf_is_the_default() {
        let chain = irb1200();
        let generator = RapidGenerator::new("M", &chain).unwrap();
        let program = generator
            .generate(&[Action::Comment { text: "hi".into() }])
            .unwrap();
        assert_eq!(
            program.code,
            "MODULE M\r\n\r\n\r\n\tPROC main()\r\n\t! hi\r\n\tENDPROC\r\n\r\nENDMODULE"
        );
    }

    #[test]
    fn module_name_must_be_identifier() {
        let chain = irb1200();
        assert!(matches!(
            RapidGenerator::new("", &chain),
            Err(ActionError::EmptyName { what: "Module" })
        ));
        assert!(matches!(
            RapidGenerator::new("2nd module", &chain),
            Err(ActionError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn invalid_action_aborts_before_generation() {
        let chain = irb1200();
        let generator = RapidGenerator::new("M", &chain).unwrap();
        let actions = [
            Action::Comment { text: "ok".into() },
            Action::WaitTime { seconds: f64::NAN },
        ];
        assert!(matches!(
            generator.generate(&actions),
            Err(ActionError::OutOfRange { .. })
        ));
    }

    #[test]
    fn generation_is_repeatable() {
        let chain = irb1200();
        let generator = RapidGenerator::new("M", &chain).unwrap();
        let actions = [Action::from(AbsoluteJointMove::new(
            "home",
            JointPosition::default(),
        ))];
        let first = generator.generate(&actions).unwrap();
        let second = generator.generate(&actions).unwrap();
        assert_eq!(first, second);
        assert!(first.first_movement_is_absolute_joint);
    }
}
