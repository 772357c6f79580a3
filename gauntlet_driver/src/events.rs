//! JSON-lines export of orchestrator events.

use anyhow::{Context, Result};
use gauntlet::GauntletEvent;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

/// Writes one JSON object per event.
pub struct EventSink {
    out: Box<dyn Write + Send>,
}

impl EventSink {
    pub fn stdout() -> Self {
        Self {
            out: Box::new(io::stdout()),
        }
    }

    pub fn file(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create event file {}", path.display()))?;
        Ok(Self {
            out: Box::new(BufWriter::new(file)),
        })
    }

    pub fn write_all(&mut self, events: impl IntoIterator<Item = GauntletEvent>) -> Result<()> {
        for event in events {
            tracing::info!("{event}");
            serde_json::to_writer(&mut self.out, &event)?;
            self.out.write_all(b"\n")?;
        }
        self.out.flush()?;
        Ok(())
    }
}
