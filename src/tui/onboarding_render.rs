//! Onboarding Wizard Rendering
//!
//! Terminal renderer for the wizard steps. Plain lines, so the same renderer
//! serves the one-shot CLI commands and the interactive `run` loop.

use std::io::Write;

use crossterm::style::Stylize;
use crossterm::{cursor, queue, terminal};

use crate::onboarding::selection::PROVIDER_CHOICES;
use crate::onboarding::{Renderer, Step, StepView};

/// Renders each step as a small text card
pub struct ConsoleRenderer<W: Write + Send> {
    out: W,
    /// Clear the screen and emit `\r\n` (raw mode) before each frame
    interactive: bool,
    color: bool,
}

impl<W: Write + Send> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            interactive: false,
            color: false,
        }
    }

    /// Full-screen mode for the interactive loop
    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self.color = true;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn newline(&self) -> &'static str {
        if self.interactive { "\r\n" } else { "\n" }
    }

    fn frame(&self, view: &StepView) -> Vec<String> {
        let mut lines = Vec::new();

        lines.push(format!(
            "{}  Step {}/{}",
            progress_dots(view),
            view.number,
            view.total
        ));
        lines.push(String::new());

        let title = view.step.title();
        lines.push(if self.color {
            title.bold().yellow().to_string()
        } else {
            title.to_string()
        });
        lines.push(view.step.subtitle().to_string());
        lines.push(String::new());

        if view.step == Step::ProviderSelection {
            for (i, choice) in PROVIDER_CHOICES.iter().enumerate() {
                let marker = if view.selection == Some(*choice) {
                    "[*]"
                } else {
                    "[ ]"
                };
                lines.push(format!("  {} {}. {}", marker, i + 1, choice.label()));
            }
            lines.push(String::new());
        }

        lines.push(hint(view));
        lines
    }
}

impl<W: Write + Send> Renderer for ConsoleRenderer<W> {
    fn render(&mut self, view: &StepView) {
        let lines = self.frame(view);
        let newline = self.newline();

        let result = (|| -> std::io::Result<()> {
            if self.interactive {
                queue!(
                    self.out,
                    terminal::Clear(terminal::ClearType::All),
                    cursor::MoveTo(0, 0)
                )?;
            }
            for line in &lines {
                write!(self.out, "{}{}", line, newline)?;
            }
            self.out.flush()
        })();

        if let Err(e) = result {
            tracing::warn!("Failed to render onboarding step {}: {}", view.step, e);
        }
    }

    fn finished(&mut self) {
        let newline = self.newline();
        let result = write!(self.out, "Onboarding complete.{}", newline)
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            tracing::warn!("Failed to render onboarding completion: {}", e);
        }
    }
}

fn progress_dots(view: &StepView) -> String {
    (1..=view.total)
        .map(|i| if i <= view.number { "●" } else { "○" })
        .collect::<Vec<_>>()
        .join(" ")
}

fn hint(view: &StepView) -> String {
    let mut parts = Vec::new();
    if view.step == Step::ProviderSelection {
        parts.push("[1-4] choose");
    }
    if view.step.is_terminal() {
        parts.push("[Enter] get started");
    } else {
        parts.push("[Enter] next");
    }
    if view.can_go_back {
        parts.push("[Esc] back");
    }
    if !view.step.is_terminal() {
        parts.push("[s] skip");
    }
    parts.push("[q] quit");
    parts.join("  ")
}
