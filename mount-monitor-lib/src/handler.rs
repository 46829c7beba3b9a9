use std::io::Write;

use log::trace;

use mount_monitor_common::MountEvent;

use crate::Result;

/// Receiver of decoded mount events. Invoked synchronously by the dispatch loop,
/// one event at a time
pub trait EventHandler {
    fn handle(&mut self, event: &MountEvent) -> Result<()>;
}

impl<F> EventHandler for F
where
    F: FnMut(&MountEvent) -> Result<()>,
{
    fn handle(&mut self, event: &MountEvent) -> Result<()> {
        self(event)
    }
}

/// Writes every event as a single line and flushes immediately
pub struct LineWriter<W: Write> {
    writer: W,
}

impl<W: Write> LineWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventHandler for LineWriter<W> {
    fn handle(&mut self, event: &MountEvent) -> Result<()> {
        let line = event.render();
        trace!("Writing event line: {line}");

        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(())
    }
}
