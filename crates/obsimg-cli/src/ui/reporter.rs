//! Console implementation of the resolver's [`Reporter`].
//!
//! Everything goes to stderr; stdout is reserved for command results.

use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use obsimg_core::Reporter;

use super::theme::{Theme, format_progress_bar, format_size};

const BAR_WIDTH: usize = 24;

#[derive(Debug)]
pub struct ConsoleReporter {
    theme: Theme,
    quiet: bool,
    /// Last drawn download percentage, to redraw only on change.
    drawn: Mutex<Option<u64>>,
}

impl ConsoleReporter {
    /// `quiet` suppresses everything but warnings.
    pub fn new(theme: Theme, quiet: bool) -> Self {
        Self {
            theme,
            quiet,
            drawn: Mutex::new(None),
        }
    }

    fn line(&self, text: &str) {
        if !self.quiet {
            eprintln!("{text}");
        }
    }
}

impl Reporter for ConsoleReporter {
    fn section(&self, title: &str) {
        let icon = self.theme.paint(self.theme.icons.active, self.theme.colors.header);
        self.line(&format!("{icon} {}", self.theme.bold(title)));
    }

    fn downloading(&self, filename: &str, current: u64, total: Option<u64>) {
        if self.quiet {
            return;
        }
        let Some(total) = total.filter(|t| *t > 0) else {
            return;
        };

        let pct = (current * 100 / total).min(100);
        let Ok(mut drawn) = self.drawn.lock() else {
            return;
        };
        if *drawn == Some(pct) {
            return;
        }
        *drawn = Some(pct);

        let bar = self.theme.paint(
            &format_progress_bar(current, total, BAR_WIDTH),
            self.theme.colors.secondary,
        );
        eprint!("\r  {filename}  {bar} {pct:>3}%  {}", format_size(total));
        if pct == 100 {
            eprintln!();
            *drawn = None;
        }
        let _ = std::io::stderr().flush();
    }

    fn waiting(&self, attempt: u32, pause: Duration, unmet: &[String]) {
        let icon = self.theme.paint(self.theme.icons.warning, self.theme.colors.warning);
        self.line(&format!(
            "{icon} Attempt {attempt}: not met: {}. Retrying in {}s",
            unmet.join(", "),
            pause.as_secs()
        ));
    }

    fn info(&self, msg: &str) {
        let icon = self.theme.paint(self.theme.icons.info, self.theme.colors.secondary);
        self.line(&format!("  {icon} {msg}"));
    }

    fn success(&self, msg: &str) {
        let icon = self.theme.paint(self.theme.icons.success, self.theme.colors.success);
        self.line(&format!("  {icon} {msg}"));
    }

    fn warning(&self, msg: &str) {
        let icon = self.theme.paint(self.theme.icons.warning, self.theme.colors.warning);
        eprintln!("  {icon} {msg}");
    }
}
