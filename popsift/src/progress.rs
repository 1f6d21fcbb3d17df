use std::io::Write;

use popsift_dataset as pd;

/// An overwritable status line, on stderr by default.
///
/// The line is terminated whenever a window fails, so the warning logged for it starts on a
/// line of its own.
pub struct ConsoleProgress<W = std::io::Stderr> {
    out: W,
    window_count: u32,
    records: usize,
}
impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new(std::io::stderr())
    }
}
impl<W: Write> ConsoleProgress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            window_count: 0,
            records: 0,
        }
    }
}
impl<W: Write> pd::FetchProgress for ConsoleProgress<W> {
    fn window_started(&mut self, window: &pd::FetchWindow, window_count: u32) {
        self.window_count = window_count;
        let _ = write!(
            self.out,
            "\r window {}/{window_count} (offset {}), {} tracks so far",
            window.index + 1,
            window.offset,
            self.records
        );
        let _ = self.out.flush();
    }

    fn window_finished(&mut self, report: &pd::WindowReport) {
        self.records += report.records;
        if report.failure.is_some() || report.window.index + 1 == self.window_count {
            let _ = writeln!(self.out);
            let _ = self.out.flush();
        }
    }
}
