//! Completion notification after a long-running release.

use std::io::{self, Write};

/// ASCII BEL, which most terminals render as a short beep.
const BELL: &[u8] = b"\x07";

/// Something that can tell the user an operation has finished.
///
/// Notification is best effort: implementations swallow their own failures.
pub trait CompletionNotifier {
    /// Signal completion.
    fn notify(&mut self);
}

/// Rings the terminal bell on the wrapped writer.
#[derive(Debug)]
pub struct TerminalBell<W: Write> {
    out: W,
}

impl<W: Write> TerminalBell<W> {
    /// Ring the bell on `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the notifier and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl TerminalBell<io::Stderr> {
    /// Ring the bell on standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> CompletionNotifier for TerminalBell<W> {
    fn notify(&mut self) {
        if let Err(err) = self.out.write_all(BELL).and_then(|()| self.out.flush()) {
            log::debug!("completion bell failed: {err}");
        }
    }
}

/// A notifier that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl CompletionNotifier for Silent {
    fn notify(&mut self) {}
}

/// Pick the notifier matching the `notify` setting.
#[must_use]
pub fn notifier_for(enabled: bool) -> Box<dyn CompletionNotifier> {
    if enabled {
        Box::new(TerminalBell::stderr())
    } else {
        Box::new(Silent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn bell_writes_bel_byte() {
        let mut bell = TerminalBell::new(Vec::new());
        bell.notify();
        assert_eq!(bell.into_inner(), vec![0x07]);
    }

    #[test]
    fn bell_ignores_write_failures() {
        let mut bell = TerminalBell::new(BrokenPipe);
        bell.notify();
    }

    #[test]
    fn silent_notifier_is_a_no_op() {
        let mut notifier = Silent;
        notifier.notify();
    }
}
