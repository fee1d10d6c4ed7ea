use std::io::{self, Write};

use harvester_core::{AppViewModel, Notice, RunStatus};

use super::constants::*;

/// Draws the view model onto a terminal: one progress line rewritten in
/// place, and notices on lines of their own.
#[derive(Debug, Default)]
pub struct Renderer {
    line_open: bool,
    last_notice: Option<Notice>,
}

impl Renderer {
    pub fn render(&mut self, view: &AppViewModel, out: &mut impl Write) -> io::Result<()> {
        if view.status != RunStatus::Idle {
            write!(out, "\r{}", progress_line(view))?;
            self.line_open = true;
            if view.status.is_terminal() {
                self.close_line(out)?;
            }
        }

        if view.notice != self.last_notice {
            if let Some(notice) = &view.notice {
                self.close_line(out)?;
                match notice {
                    Notice::Info(text) => writeln!(out, "{text}")?,
                    Notice::Error(text) => writeln!(out, "error: {text}")?,
                }
            }
            self.last_notice = view.notice.clone();
        }
        out.flush()
    }

    fn close_line(&mut self, out: &mut impl Write) -> io::Result<()> {
        if std::mem::take(&mut self.line_open) {
            writeln!(out)?;
        }
        Ok(())
    }
}

fn progress_line(view: &AppViewModel) -> String {
    format!(
        "[{bar}] {percent:>3}% ({downloaded}/{requested}) {status:<width$}",
        bar = progress_bar(view.progress),
        percent = view.progress.min(100),
        downloaded = view.downloaded,
        requested = view.requested,
        status = view.status_line,
        width = STATUS_WIDTH,
    )
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    let mut bar = String::with_capacity(BAR_WIDTH);
    bar.extend(std::iter::repeat_n(BAR_FILLED, filled));
    bar.extend(std::iter::repeat_n(BAR_EMPTY, BAR_WIDTH - filled));
    bar
}
