//! Compiles a training-set directory into ordered, wire-ready prompt sets.
//!
//! Each immediate subdirectory of the root becomes one [`PromptSet`]. Its `.txt`
//! fragments are ordered by the integer immediately before the extension,
//! separated by a hyphen (`name-12.txt` sorts as 12). That one ordering drives the
//! filename sequence, the position of each fragment in the wire string, and hence
//! which returned image lands in which file.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, error, info, warn};

/// Extension of prompt fragment files.
pub const FRAGMENT_EXTENSION: &str = "txt";

/// A single text fragment read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptFragment {
    pub filename: String,
    /// Sort key parsed from the filename; `None` sorts after every numbered fragment.
    pub ordinal: Option<u64>,
    /// File content with surrounding whitespace trimmed.
    pub content: String,
}

/// One folder's compiled unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    pub folder: String,
    pub filenames: Vec<String>,
    /// Every fragment quoted and comma-joined in sort order: `"cat","dog"`.
    pub wire: String,
    /// Raw content of the first fragment in sort order.
    pub anchor_prompt: String,
}

impl PromptSet {
    /// Builds a prompt set from fragments that are already in sort order.
    /// Returns `None` when there are no fragments.
    pub fn from_fragments(folder: impl Into<String>, fragments: Vec<PromptFragment>) -> Option<Self> {
        let anchor_prompt = fragments.first()?.content.clone();
        let wire = fragments
            .iter()
            .map(|f| format!("\"{}\"", f.content))
            .collect::<Vec<_>>()
            .join(",");
        let filenames = fragments.into_iter().map(|f| f.filename).collect();
        Some(Self {
            folder: folder.into(),
            filenames,
            wire,
            anchor_prompt,
        })
    }

    pub fn fragment_count(&self) -> usize {
        self.filenames.len()
    }
}

fn ordinal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-(\d+)\.[^.]+$").expect("ordinal pattern is valid"))
}

/// Extracts the sort key of a fragment filename: the digits between the last
/// hyphen and the extension. `a-12.txt` yields `Some(12)`, `a.txt` yields `None`.
pub fn fragment_ordinal(filename: &str) -> Option<u64> {
    ordinal_pattern()
        .captures(filename)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Numbered fragments ascending, then unnumbered ones; ties broken by filename so
/// the order never depends on directory listing order.
fn compare_fragments(a: &PromptFragment, b: &PromptFragment) -> Ordering {
    match (a.ordinal, b.ordinal) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.filename.cmp(&b.filename))
}

fn is_fragment_file(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(FRAGMENT_EXTENSION)
}

/// Reads and sorts every fragment in one folder. Unreadable files are logged and
/// left out so the filename sequence and the wire string stay aligned.
pub fn read_fragments(folder_path: &Path) -> Vec<PromptFragment> {
    let entries = match fs::read_dir(folder_path) {
        Ok(entries) => entries,
        Err(e) => {
            error!(error = ?e, path = %folder_path.display(), "Failed to list prompt folder");
            return Vec::new();
        }
    };

    let mut fragments = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !is_fragment_file(&path) {
            continue;
        }
        let filename = entry.file_name().to_string_lossy().into_owned();
        match fs::read_to_string(&path) {
            Ok(raw) => {
                let ordinal = fragment_ordinal(&filename);
                if ordinal.is_none() {
                    warn!(file = %filename, "Fragment has no -<number> suffix, sorting it last");
                }
                fragments.push(PromptFragment {
                    filename,
                    ordinal,
                    content: raw.trim().to_string(),
                });
            }
            Err(e) => {
                error!(error = ?e, path = %path.display(), "Failed to read prompt fragment, skipping");
            }
        }
    }
    fragments.sort_by(compare_fragments);
    fragments
}

/// Compiles every immediate subdirectory of `root` into a [`PromptSet`], in
/// directory discovery order.
///
/// A missing or unreadable root yields an empty list rather than an error, and a
/// folder without fragments is left out (with a warning).
pub fn compile_prompt_sets(root: &Path) -> Vec<PromptSet> {
    info!(root = %root.display(), "Compiling prompt sets");

    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = ?e, root = %root.display(), "Training set directory is not readable, no prompt sets compiled");
            return Vec::new();
        }
    };

    let folders: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();

    let mut sets = Vec::new();
    for folder_path in folders {
        let folder = match folder_path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        debug!(folder = %folder, "Detected prompt folder");

        match PromptSet::from_fragments(folder.clone(), read_fragments(&folder_path)) {
            Some(set) => {
                info!(folder = %folder, fragments = set.fragment_count(), "Compiled prompt set");
                sets.push(set);
            }
            None => warn!(folder = %folder, "Folder has no .txt fragments, skipping"),
        }
    }

    info!(sets = sets.len(), "Prompt set compilation finished");
    sets
}
