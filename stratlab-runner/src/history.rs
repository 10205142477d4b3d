//! Prompt history — JSONL append-only persistence.
//!
//! Three files in one directory, one JSON object per line:
//! - `prompts.jsonl` — captured [`UserPrompt`]s
//! - `records.jsonl` — classified [`StrategyRecord`]s
//! - `results.jsonl` — one [`ResultEntry`] per pipeline run
//!
//! Appends never rewrite existing lines. Deleting a prompt rewrites all three
//! files without the prompt and anything derived from it.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use stratlab_core::domain::{PromptId, RecordId, StrategyRecord, UserPrompt};

pub const PROMPTS_FILE: &str = "prompts.jsonl";
pub const RECORDS_FILE: &str = "records.jsonl";
pub const RESULTS_FILE: &str = "results.jsonl";

/// Characters kept in a history preview before the ellipsis.
pub const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode history entry: {0}")]
    Encode(#[from] serde_json::Error),
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> HistoryError + '_ {
    move |source| HistoryError::Io { path: path.to_path_buf(), source }
}

/// Outcome of one pipeline run, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub prompt_id: PromptId,
    #[serde(default)]
    pub record_id: Option<RecordId>,
    pub success: bool,
    pub is_valid: bool,
    #[serde(default)]
    pub quality_score: Option<u32>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub processing_ms: f64,
    pub recorded_at: DateTime<Utc>,
}

/// One line of `stratlab history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub id: PromptId,
    pub preview: String,
    pub captured_at: DateTime<Utc>,
    pub user_id: Option<String>,
    pub length: usize,
    pub word_count: usize,
}

impl From<&UserPrompt> for HistorySummary {
    fn from(prompt: &UserPrompt) -> Self {
        Self {
            id: prompt.id.clone(),
            preview: prompt.preview(PREVIEW_CHARS),
            captured_at: prompt.captured_at,
            user_id: prompt.user_id.clone(),
            length: prompt.raw_text.chars().count(),
            word_count: prompt.word_count(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_prompts: usize,
    pub total_records: usize,
    pub total_results: usize,
    pub successful_results: usize,
    pub user_prompts: usize,
    pub anonymous_prompts: usize,
    /// Record count per strategy kind (wire name).
    pub records_by_strategy: BTreeMap<String, usize>,
    pub mean_confidence: Option<f64>,
    pub size_bytes: u64,
}

/// JSONL history directory manager.
#[derive(Debug, Clone)]
pub struct PromptHistory {
    dir: PathBuf,
}

impl PromptHistory {
    /// Open (and create if needed) a history directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(io_err(&dir))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    // ── Appends ──

    pub fn append_prompt(&self, prompt: &UserPrompt) -> Result<(), HistoryError> {
        self.append(PROMPTS_FILE, prompt)
    }

    pub fn append_record(&self, record: &StrategyRecord) -> Result<(), HistoryError> {
        self.append(RECORDS_FILE, record)
    }

    pub fn append_result(&self, result: &ResultEntry) -> Result<(), HistoryError> {
        self.append(RESULTS_FILE, result)
    }

    fn append<T: Serialize>(&self, name: &str, entry: &T) -> Result<(), HistoryError> {
        let json = serde_json::to_string(entry)?;
        let path = self.file(name);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err(&path))?;
        writeln!(file, "{json}").map_err(io_err(&path))?;
        file.flush().map_err(io_err(&path))?;
        debug!(file = name, "history entry appended");
        Ok(())
    }

    // ── Reads ──

    pub fn prompts(&self) -> Result<Vec<UserPrompt>, HistoryError> {
        self.read_all(PROMPTS_FILE)
    }

    pub fn records(&self) -> Result<Vec<StrategyRecord>, HistoryError> {
        self.read_all(RECORDS_FILE)
    }

    pub fn results(&self) -> Result<Vec<ResultEntry>, HistoryError> {
        self.read_all(RESULTS_FILE)
    }

    /// Read every entry of one file. Malformed lines are skipped.
    fn read_all<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>, HistoryError> {
        let path = self.file(name);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&path).map_err(io_err(&path))?;
        let reader = io::BufReader::new(file);
        let mut entries = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(io_err(&path))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<T>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(file = name, line = index + 1, error = %e, "skipping malformed history line"),
            }
        }

        Ok(entries)
    }

    /// Prompts newest first, optionally for one user only.
    pub fn list_prompts(
        &self,
        limit: Option<usize>,
        user_id: Option<&str>,
    ) -> Result<Vec<UserPrompt>, HistoryError> {
        let mut prompts: Vec<UserPrompt> = self
            .prompts()?
            .into_iter()
            .filter(|p| user_id.map_or(true, |u| p.user_id.as_deref() == Some(u)))
            .collect();
        prompts.sort_by(|a, b| b.captured_at.cmp(&a.captured_at));
        if let Some(limit) = limit {
            prompts.truncate(limit);
        }
        Ok(prompts)
    }

    pub fn history(
        &self,
        limit: Option<usize>,
        user_id: Option<&str>,
    ) -> Result<Vec<HistorySummary>, HistoryError> {
        Ok(self.list_prompts(limit, user_id)?.iter().map(HistorySummary::from).collect())
    }

    pub fn get_prompt(&self, id: &PromptId) -> Result<Option<UserPrompt>, HistoryError> {
        Ok(self.prompts()?.into_iter().find(|p| &p.id == id))
    }

    pub fn records_for(&self, id: &PromptId) -> Result<Vec<StrategyRecord>, HistoryError> {
        Ok(self.records()?.into_iter().filter(|r| r.source_id() == id).collect())
    }

    /// Case-insensitive substring search over raw prompt text, newest first.
    pub fn search(&self, query: &str, user_id: Option<&str>) -> Result<Vec<UserPrompt>, HistoryError> {
        let needle = query.to_lowercase();
        Ok(self
            .list_prompts(None, user_id)?
            .into_iter()
            .filter(|p| p.raw_text.to_lowercase().contains(&needle))
            .collect())
    }

    // ── Deletes ──

    /// Remove a prompt with its records and results.
    ///
    /// Returns `false` when no prompt had that id.
    pub fn delete_prompt(&self, id: &PromptId) -> Result<bool, HistoryError> {
        let prompts = self.prompts()?;
        let before = prompts.len();
        let prompts: Vec<UserPrompt> = prompts.into_iter().filter(|p| &p.id != id).collect();
        if prompts.len() == before {
            return Ok(false);
        }

        let records: Vec<StrategyRecord> =
            self.records()?.into_iter().filter(|r| r.source_id() != id).collect();
        let results: Vec<ResultEntry> =
            self.results()?.into_iter().filter(|r| &r.prompt_id != id).collect();

        self.rewrite(PROMPTS_FILE, &prompts)?;
        self.rewrite(RECORDS_FILE, &records)?;
        self.rewrite(RESULTS_FILE, &results)?;
        debug!(prompt = %id, "prompt deleted from history");
        Ok(true)
    }

    /// Replace a file's contents via a temporary sibling and rename.
    fn rewrite<T: Serialize>(&self, name: &str, entries: &[T]) -> Result<(), HistoryError> {
        let path = self.file(name);
        let tmp = self.file(&format!("{name}.tmp"));
        let mut body = String::new();
        for entry in entries {
            body.push_str(&serde_json::to_string(entry)?);
            body.push('\n');
        }
        fs::write(&tmp, body).map_err(io_err(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_err(&path))
    }

    // ── Stats ──

    pub fn file_size_bytes(&self) -> Result<u64, HistoryError> {
        let mut total = 0;
        for name in [PROMPTS_FILE, RECORDS_FILE, RESULTS_FILE] {
            let path = self.file(name);
            match fs::metadata(&path) {
                Ok(meta) => total += meta.len(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_err(&path)(e)),
            }
        }
        Ok(total)
    }

    pub fn stats(&self) -> Result<HistoryStats, HistoryError> {
        let prompts = self.prompts()?;
        let records = self.records()?;
        let results = self.results()?;

        let user_prompts = prompts.iter().filter(|p| p.user_id.is_some()).count();
        let mut records_by_strategy = BTreeMap::new();
        for record in &records {
            *records_by_strategy
                .entry(record.strategy_kind().as_str().to_string())
                .or_insert(0) += 1;
        }
        let mean_confidence = (!records.is_empty())
            .then(|| records.iter().map(StrategyRecord::confidence).sum::<f64>() / records.len() as f64);

        Ok(HistoryStats {
            total_prompts: prompts.len(),
            total_records: records.len(),
            total_results: results.len(),
            successful_results: results.iter().filter(|r| r.success).count(),
            user_prompts,
            anonymous_prompts: prompts.len() - user_prompts,
            records_by_strategy,
            mean_confidence,
            size_bytes: self.file_size_bytes()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use stratlab_core::domain::Metadata;

    fn prompt_at(text: &str, user: Option<&str>, minute: u32) -> UserPrompt {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap();
        UserPrompt::capture_at(text, user.map(String::from), Metadata::new(), at)
    }

    #[test]
    fn read_all_on_missing_files_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let history = PromptHistory::open(dir.path().join("nested")).unwrap();
        assert!(history.prompts().unwrap().is_empty());
        assert_eq!(history.file_size_bytes().unwrap(), 0);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let history = PromptHistory::open(dir.path()).unwrap();
        history.append_prompt(&prompt_at("first prompt", None, 0)).unwrap();
        fs::OpenOptions::new()
            .append(true)
            .open(history.dir().join(PROMPTS_FILE))
            .unwrap()
            .write_all(b"{not json\n\n")
            .unwrap();
        history.append_prompt(&prompt_at("second prompt", None, 1)).unwrap();

        assert_eq!(history.prompts().unwrap().len(), 2);
    }

    #[test]
    fn list_is_newest_first_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let history = PromptHistory::open(dir.path()).unwrap();
        history.append_prompt(&prompt_at("old", Some("ana"), 0)).unwrap();
        history.append_prompt(&prompt_at("new", Some("ana"), 5)).unwrap();
        history.append_prompt(&prompt_at("other", Some("bo"), 9)).unwrap();

        let all = history.list_prompts(None, None).unwrap();
        let texts: Vec<&str> = all.iter().map(|p| p.raw_text.as_str()).collect();
        assert_eq!(texts, vec!["other", "new", "old"]);

        let ana = history.list_prompts(Some(1), Some("ana")).unwrap();
        assert_eq!(ana.len(), 1);
        assert_eq!(ana[0].raw_text, "new");
    }

    #[test]
    fn history_preview_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let history = PromptHistory::open(dir.path()).unwrap();
        history.append_prompt(&prompt_at(&"a".repeat(150), None, 0)).unwrap();

        let rows = history.history(None, None).unwrap();
        assert_eq!(rows[0].preview.len(), PREVIEW_CHARS + 3);
        assert!(rows[0].preview.ends_with("..."));
        assert_eq!(rows[0].length, 150);
    }
}
