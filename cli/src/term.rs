use std::io::{self, Write};

use indicatif::MultiProgress;

/// Stderr writer that hides the progress bars while a line is written, so
/// log output lands above them instead of through them.
#[derive(Clone)]
pub struct ProgressAwareStderr {
    multi: MultiProgress,
}

impl ProgressAwareStderr {
    pub fn new(multi: MultiProgress) -> Self {
        Self { multi }
    }
}

impl Write for ProgressAwareStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.multi.suspend(|| io::stderr().write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.multi.suspend(|| io::stderr().flush())
    }
}
