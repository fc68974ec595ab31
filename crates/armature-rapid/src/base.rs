//! The `BASE` system module: predefined `tool0`/`wobj0`/`load0` records plus
//! user tools, work objects and custom lines.

use armature_core::config::GeneratorConfig;

use crate::action::LINE_SEPARATOR;
use crate::error::ActionError;
use crate::generator::normalize_line_endings;
use crate::records::{ToolData, WorkObject};

const HEADER: [&str; 8] = [
    "MODULE BASE (SYSMODULE, NOSTEPIN, VIEWONLY)",
    "",
    " ! System module with basic predefined system data",
    " !************************************************",
    "",
    " ! System data tool0, wobj0 and load0",
    " ! Do not translate or delete tool0, wobj0, load0",
    " PERS tooldata tool0 := [TRUE, [[0, 0, 0], [1, 0, 0, 0]], [0.001, [0, 0, 0.001], [1, 0, 0, 0], 0, 0, 0]];",
];

const DEFAULT_RECORDS: [&str; 2] = [
    " PERS wobjdata wobj0 := [FALSE, TRUE, \"\" , [[0, 0, 0], [1, 0, 0, 0]], [[0, 0, 0], [1, 0, 0, 0]]];",
    " PERS loaddata load0 := [0.001, [0, 0, 0.001], [1, 0, 0, 0], 0, 0, 0];",
];

/// User records for the base module. Independent of any action list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseModule {
    pub tools: Vec<ToolData>,
    pub work_objects: Vec<WorkObject>,
    /// Verbatim lines appended after the records.
    pub custom_code: Vec<String>,
}

impl BaseModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, tool: ToolData) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_work_object(mut self, work_object: WorkObject) -> Self {
        self.work_objects.push(work_object);
        self
    }

    pub fn with_custom_line(mut self, line: impl Into<String>) -> Self {
        self.custom_code.push(line.into());
        self
    }

    pub fn validate(&self) -> Result<(), ActionError> {
        for tool in &self.tools {
            tool.validate()?;
        }
        for work_object in &self.work_objects {
            work_object.validate()?;
        }
        for line in &self.custom_code {
            if line.contains(['\n', '\r', LINE_SEPARATOR]) {
                return Err(ActionError::MultiLine(line.clone()));
            }
        }
        Ok(())
    }

    /// Render the module text.
    pub fn to_code(&self, config: &GeneratorConfig) -> Result<String, ActionError> {
        self.validate()?;
        let sep = LINE_SEPARATOR;

        let mut code = String::new();
        for line in HEADER.iter().chain(&DEFAULT_RECORDS) {
            code.push_str(line);
            code.push(sep);
        }
        code.push(sep);

        if !self.tools.is_empty() {
            let lines: Vec<String> = self.tools.iter().map(ToolData::declaration).collect();
            push_block(&mut code, " ! User defined tooldata ", &lines);
        }
        if !self.work_objects.is_empty() {
            let lines: Vec<String> = self.work_objects.iter().map(WorkObject::declaration).collect();
            push_block(&mut code, " ! User defined wobjdata ", &lines);
        }
        if !self.custom_code.is_empty() {
            code.push_str(" ! User defined custom code lines ");
            code.push(sep);
            for line in &self.custom_code {
                code.push_str(line);
                code.push(sep);
                code.push(' ');
            }
            code.push(sep);
            code.push(' ');
        }

        code.push_str("ENDMODULE");
        Ok(normalize_line_endings(&code, config))
    }
}

/// Banner, then each record indented by one space.
fn push_block(code: &mut String, banner: &str, lines: &[String]) {
    code.push_str(banner);
    code.push(LINE_SEPARATOR);
    code.push(' ');
    for line in lines {
        code.push_str(line);
        code.push(LINE_SEPARATOR);
        code.push(' ');
    }
    code.push(LINE_SEPARATOR);
    code.push(' ');
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
