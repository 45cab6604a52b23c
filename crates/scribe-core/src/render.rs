//! Script renderer - action log to Playwright test source
//!
//! Rendering is a pure function of the log and the open step names. Steps
//! still open when rendering get synthetic closers, innermost first, so any
//! snapshot of a live session is a syntactically closed script.

use crate::action::{Action, StepEdge};
use crate::events::Rect;

/// Indent unit used by `render`
pub const INDENT: &str = "  ";

/// Body lines for `log`, with every open step closed
pub fn render(log: &[Action], open_steps: &[String]) -> Vec<String> {
    render_with_indent(log, open_steps, INDENT)
}

pub fn render_with_indent(log: &[Action], open_steps: &[String], indent: &str) -> Vec<String> {
    let mut out = LineWriter::new(indent);
    for action in log {
        out.action(action);
    }
    for name in open_steps.iter().rev() {
        out.action(&Action::step_end(Some(name.clone())));
    }
    out.lines
}

/// Whole-file rendering: template header, indented body, template footer
pub fn compile(log: &[Action], open_steps: &[String], template: &ScriptTemplate) -> String {
    let body = render_with_indent(log, open_steps, &template.indent);
    template.wrap(&body)
}

/// Frame around the rendered body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTemplate {
    pub header: Vec<String>,
    pub footer: Vec<String>,
    /// Indent levels applied to every body line
    pub body_depth: usize,
    pub indent: String,
}

impl ScriptTemplate {
    /// A Playwright test file with a single test named `test_name`
    pub fn playwright(test_name: &str) -> Self {
        Self {
            header: vec![
                r#"import { test, expect } from "@playwright/test";"#.to_string(),
                String::new(),
                format!("test({}, async ({{ page }}) => {{", quote(test_name)),
            ],
            footer: vec!["});".to_string()],
            body_depth: 1,
            indent: INDENT.to_string(),
        }
    }

    /// Body only, no surrounding test
    pub fn bare() -> Self {
        Self {
            header: Vec::new(),
            footer: Vec::new(),
            body_depth: 0,
            indent: INDENT.to_string(),
        }
    }

    pub fn indent_width(mut self, width: usize) -> Self {
        self.indent = " ".repeat(width);
        self
    }

    pub fn wrap(&self, body: &[String]) -> String {
        let prefix = self.indent.repeat(self.body_depth);
        let mut text = String::new();
        for line in &self.header {
            text.push_str(line);
            text.push('\n');
        }
        for line in body {
            text.push_str(&prefix);
            text.push_str(line);
            text.push('\n');
        }
        for line in &self.footer {
            text.push_str(line);
            text.push('\n');
        }
        text
    }
}

impl Default for ScriptTemplate {
    fn default() -> Self {
        Self::playwright("recorded")
    }
}

struct LineWriter<'a> {
    indent: &'a str,
    depth: usize,
    lines: Vec<String>,
}

impl<'a> LineWriter<'a> {
    fn new(indent: &'a str) -> Self {
        Self {
            indent,
            depth: 0,
            lines: Vec::new(),
        }
    }

    fn line(&mut self, text: String) {
        self.lines.push(format!("{}{}", self.indent.repeat(self.depth), text));
    }

    fn action(&mut self, action: &Action) {
        match action {
            Action::MouseDown { x, y } => {
                self.line(format!("await page.mouse.move({}, {});", num(*x), num(*y)));
                self.line("await page.mouse.down();".to_string());
            }
            Action::MouseMoveRun { x, y, steps } => self.line(format!(
                "await page.mouse.move({}, {}, {{ steps: {} }});",
                num(*x),
                num(*y),
                steps
            )),
            Action::MouseUp => self.line("await page.mouse.up();".to_string()),
            Action::Click { x, y } => {
                self.line(format!("await page.mouse.click({}, {});", num(*x), num(*y)))
            }
            Action::DoubleClick { x, y } => {
                self.line(format!("await page.mouse.dblclick({}, {});", num(*x), num(*y)))
            }
            Action::Wheel {
                x,
                y,
                delta_x,
                delta_y,
            } => {
                self.line(format!("await page.mouse.move({}, {});", num(*x), num(*y)));
                self.line(format!(
                    "await page.mouse.wheel({}, {});",
                    num(*delta_x),
                    num(*delta_y)
                ));
            }
            Action::KeyDown { label } => {
                self.line(format!("await page.keyboard.down({});", quote(label)))
            }
            Action::KeyUp { label } => {
                self.line(format!("await page.keyboard.up({});", quote(label)))
            }
            Action::KeyPress { label } => {
                self.line(format!("await page.keyboard.press({});", quote(label)))
            }
            Action::Screenshot {
                name,
                locator,
                region,
            } => self.line(screenshot(name, locator, region.as_ref())),
            Action::StepBoundary {
                which: StepEdge::Start,
                name,
            } => {
                let name = name.as_deref().unwrap_or(crate::normalizer::DEFAULT_STEP_NAME);
                self.line(format!("await test.step({}, async () => {{", quote(name)));
                self.depth += 1;
            }
            Action::StepBoundary {
                which: StepEdge::End,
                ..
            } => {
                self.depth = self.depth.saturating_sub(1);
                self.line("});".to_string());
            }
            Action::Comment { text } => {
                for part in comment_lines(text) {
                    self.line(format!("// {}", part).trim_end().to_string());
                }
            }
            Action::Navigation { url } => self.line(format!("await page.goto({});", quote(url))),
        }
    }
}

fn screenshot(name: &str, locator: &str, region: Option<&Rect>) -> String {
    let target = if locator.is_empty() {
        "page".to_string()
    } else {
        format!("page.locator({})", quote(locator))
    };
    let file = if name.ends_with(".png") {
        name.to_string()
    } else {
        format!("{}.png", name)
    };
    match region {
        Some(r) => format!(
            "await expect({}).toHaveScreenshot({}, {{ clip: {{ x: {}, y: {}, width: {}, height: {} }} }});",
            target,
            quote(&file),
            num(r.x),
            num(r.y),
            num(r.width),
            num(r.height)
        ),
        None => format!("await expect({}).toHaveScreenshot({});", target, quote(&file)),
    }
}

/// Split on every JS line terminator, `\r\n` counting as one break.
/// Empty text yields a single empty line.
fn comment_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .flat_map(|line| line.split(['\r', '\u{2028}', '\u{2029}']))
}

/// JSON string literal, valid in JS/TS source
fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Integral values print without a fraction; `-0` prints as `0`
fn num(v: f64) -> String {
    match v {
        v if v == 0.0 => "0".to_string(),
        v if v.is_infinite() && v > 0.0 => "Infinity".to_string(),
        v if v.is_infinite() => "-Infinity".to_string(),
        v => format!("{}", v),
    }
}
