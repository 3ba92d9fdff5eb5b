use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::game::{DrawStatus, PlayerId, SessionId};

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct DrawRecord {
    pub draw_id: String,
    pub session_id: SessionId,
    pub player: PlayerId,
    pub card: Card,
    pub status: DrawStatus,
    pub remaining: usize,
    #[serde(default)]
    pub ts: Option<String>,
}

pub fn format_draw_id(yyyymmdd: &str, seq: u32) -> String {
    format!("{}-{:06}", yyyymmdd, seq)
}

use chrono::{SecondsFormat, Utc};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Appends one JSON line per resolved draw.
pub struct DrawLogger {
    writer: Option<BufWriter<File>>,
    date: String,
    seq: u32,
}

impl DrawLogger {
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        let f = File::create(path)?;
        Ok(Self {
            writer: Some(BufWriter::new(f)),
            date: Utc::now().format("%Y%m%d").to_string(),
            seq: 0,
        })
    }

    pub fn with_seq_for_test(date: &str) -> Self {
        Self {
            writer: None,
            date: date.to_string(),
            seq: 0,
        }
    }

    pub fn next_id(&mut self) -> String {
        self.seq += 1;
        format_draw_id(&self.date, self.seq)
    }

    pub fn write(&mut self, record: &DrawRecord) -> std::io::Result<()> {
        // inject timestamp if missing
        let mut rec = record.clone();
        if rec.ts.is_none() {
            rec.ts = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        let line = serde_json::to_string(&rec)?;
        if let Some(w) = &mut self.writer {
            w.write_all(line.as_bytes())?;
            w.write_all(b"\n")?;
            w.flush()?;
        }
        Ok(())
    }
}
