use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use rewind_frame::{AreaDesc, Frame};
use rewind_listener::SessionSummary;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    kind: &'static str,
    seq: u64,
    primitives: usize,
    frame: &'a Frame,
    timestamp: String,
}

#[derive(Serialize)]
struct AreaOutput<'a> {
    kind: &'static str,
    area: &'a AreaDesc,
    timestamp: String,
}

#[derive(Serialize)]
struct SummaryOutput<'a> {
    kind: &'static str,
    peer: Option<String>,
    envelopes: u64,
    frames: u64,
    areas: u64,
    discarded_records: usize,
    stopped_by: &'a str,
}

pub fn print_frame(frame: &Frame, seq: u64, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                kind: "frame",
                seq,
                primitives: frame.primitive_count(),
                frame,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FRAME", "CIRCLES", "RECTS", "LINES", "UNITS", "MESSAGE"])
                .add_row(vec![
                    seq.to_string(),
                    frame.circles.len().to_string(),
                    frame.rectangles.len().to_string(),
                    frame.lines.len().to_string(),
                    frame.units.len().to_string(),
                    message_preview(frame.message.as_deref()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "frame={} circles={} rects={} lines={} units={} message={}",
                seq,
                frame.circles.len(),
                frame.rectangles.len(),
                frame.lines.len(),
                frame.units.len(),
                message_preview(frame.message.as_deref())
            );
        }
    }
}

pub fn print_area(area: &AreaDesc, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = AreaOutput {
                kind: "area",
                area,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("area x={} y={} type={:?}", area.x, area.y, area.area_type);
        }
    }
}

pub fn print_summary(summary: &SessionSummary, stopped_by: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SummaryOutput {
                kind: "summary",
                peer: summary.peer.map(|p| p.to_string()),
                envelopes: summary.envelopes,
                frames: summary.frames,
                areas: summary.areas,
                discarded_records: summary.discarded_records,
                stopped_by,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PEER", "ENVELOPES", "FRAMES", "AREAS", "STOPPED BY"])
                .add_row(vec![
                    summary
                        .peer
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    summary.envelopes.to_string(),
                    summary.frames.to_string(),
                    summary.areas.to_string(),
                    stopped_by.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "session envelopes={} frames={} areas={} discarded={} stopped_by={}",
                summary.envelopes,
                summary.frames,
                summary.areas,
                summary.discarded_records,
                stopped_by
            );
        }
    }
}

fn message_preview(message: Option<&str>) -> String {
    const MAX_CHARS: usize = 48;
    match message {
        None => "-".to_string(),
        Some(text) if text.chars().count() > MAX_CHARS => {
            let cut: String = text.chars().take(MAX_CHARS).collect();
            format!("{cut}…")
        }
        Some(text) => text.to_string(),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
