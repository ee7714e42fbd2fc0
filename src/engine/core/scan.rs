use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Broad family a file extension belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    Video,
    Audio,
    Image,
    Document,
    Archive,
}

impl MediaCategory {
    pub const ALL: [MediaCategory; 5] = [
        MediaCategory::Video,
        MediaCategory::Audio,
        MediaCategory::Image,
        MediaCategory::Document,
        MediaCategory::Archive,
    ];

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            MediaCategory::Video => VIDEO_EXTENSIONS,
            MediaCategory::Audio => AUDIO_EXTENSIONS,
            MediaCategory::Image => IMAGE_EXTENSIONS,
            MediaCategory::Document => DOCUMENT_EXTENSIONS,
            MediaCategory::Archive => ARCHIVE_EXTENSIONS,
        }
    }

    /// Whether files of this family are picked up by a folder conversion
    pub fn is_folder_input(self) -> bool {
        !matches!(self, MediaCategory::Archive)
    }
}

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm", "flv"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "aac", "wav", "flac", "ogg", "m4a"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "docx", "txt", "xlsx", "pptx"];
const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "tar", "gz", "rar", "7z"];

/// Offered when none of the scanned extensions is recognized
pub const FALLBACK_FORMATS: &[&str] = &["mp4", "mp3", "png", "pdf"];

/// Category for an extension, case-insensitive, with or without a leading dot
pub fn category_for_extension(ext: &str) -> Option<MediaCategory> {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    MediaCategory::ALL
        .into_iter()
        .find(|c| c.extensions().contains(&ext.as_str()))
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Whether a folder conversion should pick this file up
pub fn is_convertible_input(path: &Path) -> bool {
    extension_of(path)
        .and_then(|e| category_for_extension(&e))
        .is_some_and(MediaCategory::is_folder_input)
}

/// Output formats to offer for a set of input extensions.
///
/// The union of every recognized extension's category, sorted and without
/// duplicates. Falls back to [`FALLBACK_FORMATS`] when nothing is recognized.
pub fn offered_formats<S: AsRef<str>>(extensions: &[S]) -> Vec<String> {
    let mut formats: BTreeSet<&'static str> = BTreeSet::new();
    for ext in extensions {
        if let Some(category) = category_for_extension(ext.as_ref()) {
            formats.extend(category.extensions().iter().copied());
        }
    }
    if formats.is_empty() {
        formats.extend(FALLBACK_FORMATS.iter().copied());
    }
    formats.into_iter().map(str::to_string).collect()
}

/// Distinct lowercase extensions of the files directly inside `dir`
pub fn folder_extensions(dir: &Path) -> Vec<String> {
    let set: BTreeSet<String> = list_files(dir)
        .iter()
        .filter_map(|p| extension_of(p))
        .collect();
    set.into_iter().collect()
}

/// Files directly inside `dir` that a folder conversion would process,
/// ordered by file name. Subfolders are not descended into.
pub fn scan_folder(dir: &Path) -> Vec<PathBuf> {
    list_files(dir)
        .into_iter()
        .filter(|p| is_convertible_input(p))
        .collect()
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}
