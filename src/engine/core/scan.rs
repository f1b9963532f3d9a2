use super::naming::{TEMP_PREFIX, has_video_extension, is_eligible, natural_cmp};
use super::types::MediaEntry;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// A discovered directory and whether it directly holds eligible media
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDirectory {
    pub path: PathBuf,
    pub has_media: bool,
}

/// Every directory under a root in natural order of base name, annotated
/// with whether it will be processed.
#[derive(Debug, Clone, Default)]
pub struct DirectoryPlan {
    candidates: Vec<CandidateDirectory>,
}

impl DirectoryPlan {
    /// Order candidates naturally by base name (full path breaks ties)
    pub fn from_candidates(mut candidates: Vec<CandidateDirectory>) -> Self {
        candidates.sort_by(|a, b| {
            natural_cmp(&base_name(&a.path), &base_name(&b.path)).then_with(|| a.path.cmp(&b.path))
        });
        Self { candidates }
    }

    pub fn candidates(&self) -> &[CandidateDirectory] {
        &self.candidates
    }

    /// The processing plan: directories with at least one eligible file
    pub fn directories(&self) -> Vec<&Path> {
        self.candidates
            .iter()
            .filter(|c| c.has_media)
            .map(|c| c.path.as_path())
            .collect()
    }

    /// Directories dropped from the plan
    pub fn excluded(&self) -> Vec<&Path> {
        self.candidates
            .iter()
            .filter(|c| !c.has_media)
            .map(|c| c.path.as_path())
            .collect()
    }

    /// Number of directories in the processing plan
    pub fn len(&self) -> usize {
        self.candidates.iter().filter(|c| c.has_media).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Last path component for display and ordering
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Walk `root` and every descendant directory and build the plan.
///
/// Eligibility is checked per directory, non-recursively: a directory whose
/// only videos live in subdirectories is excluded itself.
pub fn discover(root: &Path) -> Result<DirectoryPlan> {
    let root = fs::canonicalize(root)
        .with_context(|| format!("Failed to resolve directory: {}", root.display()))?;
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }

    let mut candidates = vec![CandidateDirectory {
        has_media: has_eligible_media(&root),
        path: root.clone(),
    }];

    // Symlinked directories are not followed
    for entry in WalkDir::new(&root).min_depth(1).follow_links(false) {
        match entry {
            Ok(entry) if entry.file_type().is_dir() => {
                let path = entry.into_path();
                candidates.push(CandidateDirectory {
                    has_media: has_eligible_media(&path),
                    path,
                });
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "skipping unreadable path during discovery"),
        }
    }

    Ok(DirectoryPlan::from_candidates(candidates))
}

/// File name as UTF-8. Videos whose name is not are reported and skipped.
fn utf8_name(dir: &Path, file_name: OsString) -> Option<String> {
    match file_name.into_string() {
        Ok(name) => Some(name),
        Err(raw) => {
            if has_video_extension(Path::new(&raw)) {
                warn!(dir = %dir.display(), file = ?raw, "skipping video with a non UTF-8 name");
            }
            None
        }
    }
}

/// Check if a directory directly contains at least one eligible video file
pub fn has_eligible_media(dir: &Path) -> bool {
    match fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).any(|e| {
            e.path().is_file() && utf8_name(dir, e.file_name()).is_some_and(|n| is_eligible(&n))
        }),
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "failed to read directory");
            false
        }
    }
}

/// Eligible files directly inside `dir`, in natural order of file name.
///
/// No two entries share a final name, and no rename targets a name already
/// present in the directory; a clashing entry keeps its current name.
pub fn list_media(dir: &Path) -> io::Result<Vec<MediaEntry>> {
    let mut taken: HashSet<OsString> = HashSet::new();
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)?.filter_map(|e| e.ok()) {
        let file_name = entry.file_name();
        taken.insert(file_name.clone());
        if !entry.path().is_file() {
            continue;
        }
        if let Some(name) = utf8_name(dir, file_name) {
            if is_eligible(&name) {
                names.push(name);
            }
        }
    }

    names.sort_by(|a, b| natural_cmp(a, b).then_with(|| a.cmp(b)));

    Ok(names
        .iter()
        .map(|name| {
            let entry = MediaEntry::new(dir, name);
            if entry.is_renamed() && !taken.insert(OsString::from(&entry.normalized_name)) {
                warn!(
                    file = %name,
                    target = %entry.normalized_name,
                    "normalized name already taken, keeping original name"
                );
                MediaEntry::keeping_name(dir, name)
            } else {
                entry
            }
        })
        .collect())
}

/// Encoder temporaries left behind in `dir`, typically by a killed run
pub fn find_orphaned_temporaries(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut found: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && has_video_extension(p)
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(TEMP_PREFIX))
        })
        .collect();
    found.sort();
    found
}

/// Validate a requested start index against the plan.
/// Anything negative or past the end falls back to the first directory.
pub fn select_start_offset(plan: &DirectoryPlan, requested: Option<i64>) -> usize {
    match requested {
        Some(index) if index >= 0 && (index as u64) < plan.len() as u64 => index as usize,
        Some(index) => {
            warn!(index, len = plan.len(), "start index out of range, starting from the beginning");
            0
        }
        None => 0,
    }
}
