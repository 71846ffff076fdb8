/*
 *  scores.rs
 *
 *  Arcade - hot-swappable game host
 *
 *  High-score persistence, one text file per game
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use log::{debug, info};
use thiserror::Error;

use crate::module::types::ScoreRecord;

const PLAYER_TAG: &str = "Player: ";
const SCORE_TAG: &str = " - Score: ";

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("score file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Score files under one directory, `score_<game>.txt` each.
///
/// Every file keeps the best score of each player, highest first.
#[derive(Debug, Clone)]
pub struct ScoreBoard {
    dir: PathBuf,
}

impl ScoreBoard {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the scores of `game`
    pub fn file_for(&self, game: &str) -> PathBuf {
        let stem: String = game
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.dir.join(format!("score_{}.txt", stem))
    }

    /// Scores recorded for `game`; a missing file is an empty board.
    /// Lines that do not parse are ignored.
    pub fn load(&self, game: &str) -> Result<Vec<ScoreRecord>, ScoreError> {
        let path = self.file_for(game);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(ScoreError::Io { path, source }),
        };
        Ok(content.lines().filter_map(parse_line).collect())
    }

    /// Merge `record` into the board of `game` and rewrite the file.
    ///
    /// Returns `false` without touching the disk when the player is anonymous.
    pub fn save(&self, game: &str, record: &ScoreRecord) -> Result<bool, ScoreError> {
        if record.player.is_empty() {
            debug!("Anonymous score for {} not saved", game);
            return Ok(false);
        }

        let mut scores = self.load(game)?;
        merge(&mut scores, record);

        fs::create_dir_all(&self.dir)
            .map_err(|source| ScoreError::Io { path: self.dir.clone(), source })?;

        let path = self.file_for(game);
        let content: String = scores.iter().map(format_line).collect();
        fs::write(&path, content).map_err(|source| ScoreError::Io { path: path.clone(), source })?;

        info!("Saved score {} for {} in {}", record.score, record.player, path.display());
        Ok(true)
    }
}

fn parse_line(line: &str) -> Option<ScoreRecord> {
    let start = line.find(PLAYER_TAG)? + PLAYER_TAG.len();
    let split = line.find(SCORE_TAG)?;
    if split < start {
        return None;
    }
    let player = &line[start..split];
    let score = line[split + SCORE_TAG.len()..].trim().parse::<f32>().ok()?;
    Some(ScoreRecord::new(player, score))
}

fn format_line(record: &ScoreRecord) -> String {
    format!("{}{}{}{}\n", PLAYER_TAG, record.player, SCORE_TAG, record.score)
}

/// Keep the best score per player, sorted descending
fn merge(scores: &mut Vec<ScoreRecord>, record: &ScoreRecord) {
    match scores.iter_mut().find(|s| s.player == record.player) {
        Some(existing) => {
            if record.score > existing.score {
                existing.score = record.score;
            }
        }
        None => scores.push(record.clone()),
    }
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
}
