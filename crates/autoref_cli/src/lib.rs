//! Replay Library
//!
//! Drives an [`Autoref`] from a recorded JSON-lines log. Each line is one
//! inbound record tagged by `type`:
//!
//! ```text
//! {"type":"geometry","field_length":9000.0,"field_width":6000.0,"goal_depth":180.0,"goal_width":1000.0}
//! {"type":"referee","stage":"FirstHalf","command":"Stop","blue":{"score":0},"yellow":{"score":0}}
//! {"type":"vision","camera":0,"t_capture":0.0,"robots":[],"balls":[]}
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use autoref_core::{
    Autoref, AutorefConfig, DetectionFrame, FrameOutcome, GameState, GeometryRecord, RefereeRecord,
    Stage, Team,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

/// One inbound record of a replay log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEntry {
    Vision(DetectionFrame),
    Geometry(GeometryRecord),
    Referee(RefereeRecord),
}

/// Result of replaying one log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaySummary {
    /// SHA256 of the log contents (hex)
    pub log_checksum: String,
    /// Replay time (RFC3339)
    pub replayed_at: String,
    pub entries: usize,
    pub vision_frames: usize,
    /// Fused worlds the engine processed
    pub worlds: usize,
    pub firings: usize,
    pub fouls: usize,
    /// Frames abandoned by an engine fault
    pub faults: usize,
    /// Vision frames the tracker rejected
    pub rejected: usize,
    pub state: GameState,
    pub stage: Stage,
    pub score: [u32; 2],
}

/// Replay the log at `path`, calling `on_outcome` for every frame in which
/// a rule committed.
pub fn replay_file(
    path: &Path,
    config: AutorefConfig,
    on_outcome: impl FnMut(&FrameOutcome),
) -> Result<ReplaySummary> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read replay log: {}", path.display()))?;
    replay_str(&text, config, on_outcome)
}

pub fn replay_str(
    text: &str,
    config: AutorefConfig,
    mut on_outcome: impl FnMut(&FrameOutcome),
) -> Result<ReplaySummary> {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let log_checksum = format!("{:x}", hasher.finalize());

    let mut autoref = Autoref::new(config);
    let mut entries = 0;
    let mut vision_frames = 0;
    let mut worlds = 0;
    let mut firings = 0;
    let mut fouls = 0;
    let mut faults = 0;
    let mut rejected = 0;

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let entry: LogEntry = serde_json::from_str(line)
            .with_context(|| format!("Malformed log entry on line {}", index + 1))?;
        entries += 1;

        match entry {
            LogEntry::Geometry(record) => autoref.update_geometry(&record),
            LogEntry::Referee(record) => autoref.update_referee(record),
            LogEntry::Vision(frame) => {
                vision_frames += 1;
                match autoref.update_vision(&frame) {
                    Ok(Some(outcome)) => {
                        worlds += 1;
                        if !outcome.fired.is_empty() {
                            firings += outcome.fired.len();
                            fouls += outcome.fouls().count();
                            on_outcome(&outcome);
                        }
                    }
                    Ok(None) => {}
                    Err(e) if e.is_internal_fault() => {
                        worlds += 1;
                        faults += 1;
                        warn!(line = index + 1, error = %e, "Frame abandoned");
                    }
                    Err(e) => {
                        rejected += 1;
                        warn!(line = index + 1, error = %e, "Vision frame rejected");
                    }
                }
            }
        }
    }

    let vars = autoref.vars();
    let summary = ReplaySummary {
        log_checksum,
        replayed_at: chrono::Utc::now().to_rfc3339(),
        entries,
        vision_frames,
        worlds,
        firings,
        fouls,
        faults,
        rejected,
        state: vars.state,
        stage: vars.stage,
        score: [vars.team_info(Team::Blue).score, vars.team_info(Team::Yellow).score],
    };
    info!(entries, worlds, firings, fouls, faults, "Replay finished");
    Ok(summary)
}
