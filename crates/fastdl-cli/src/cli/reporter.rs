//! Console progress output.

use fastdl_core::engine::Reporter;
use fastdl_core::fetch::FetchOutcome;
use std::io::Write;

/// Terminal bell, emitted when a load has finished.
pub const BELL: &str = "\x07";

/// Prints engine progress as plain lines to `out`.
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        // Console output is best-effort; a closed stdout must not stop downloads.
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }
}

fn label(outcome: &FetchOutcome) -> &'static str {
    match outcome {
        FetchOutcome::Fetched { .. } => "fetched",
        FetchOutcome::Skipped => "skipped",
        FetchOutcome::Placeholder { .. } => "placeholder",
        FetchOutcome::Missing => "missing",
        FetchOutcome::NotCompressed => "not compressed",
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn connected(&mut self, endpoint: &str) {
        self.line(&format!("connected to {endpoint}"));
    }

    fn fetch_finished(&mut self, rel_path: &str, outcome: &FetchOutcome) {
        let text = match outcome {
            FetchOutcome::Fetched { bytes, .. } => {
                format!("{:<14} {rel_path} ({bytes} bytes)", label(outcome))
            }
            _ => format!("{:<14} {rel_path}", label(outcome)),
        };
        self.line(&text);
    }

    fn all_loaded(&mut self) {
        self.line(&format!("{BELL}all downloads finished"));
    }
}
