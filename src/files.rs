use std::cmp::Reverse;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use walkdir::WalkDir;

use crate::error::{Result, ViewerError};

/// Extensions (lower-case, leading dot) that count as images when the
/// "supported only" filter is on.
pub const RECOGNISED_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".jfif", ".pjpeg", ".pjp", // JPEG
    ".png", ".apng", // PNG
    ".tga", ".icb", ".vda", ".vst", // TGA
    ".bmp", ".psd", ".gif", ".hdr", ".pic",
    ".pbm", ".pgm", ".ppm", ".pnm", // portable any map
    ".exr",
    ".cr2", ".crw", ".dcr", ".mrw", ".arw", ".nef", ".orf", ".raf", ".x3f", // camera RAW
    ".heic", ".webp", ".rgf", ".rla", ".svg", ".tif", ".tiff", ".miff",
    ".ttf", ".otf", ".xcf", ".wpg", ".wdp", ".viff", ".vicar", ".sfw", ".sct",
    ".rle", ".bpg", ".cur", ".dcx", ".ico",
];

/// Lower-cased extension with its leading dot, e.g. `".png"`.
pub fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
}

pub fn is_image_file(path: &Path) -> bool {
    dotted_extension(path)
        .map(|e| RECOGNISED_EXTENSIONS.contains(&e.as_str()))
        .unwrap_or(false)
}

/// Decide whether a filesystem entry belongs in the browsing list.
///
/// Only regular files (after following symlinks) qualify. With
/// `supported_only` the extension must also be recognised. Errors reading
/// the entry's metadata are returned so the caller can log and skip it.
pub fn classify(path: &Path, supported_only: bool) -> Result<bool> {
    let meta = fs::metadata(path).map_err(|source| ViewerError::Enumeration {
        path: path.to_path_buf(),
        source,
    })?;
    if !meta.is_file() {
        return Ok(false);
    }
    Ok(!supported_only || is_image_file(path))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortMode {
    /// Scan order, which is file-name order.
    #[default]
    Alphabetical,
    /// Newest modification time first.
    #[value(name = "modified")]
    ModifiedDescending,
}

pub fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Sort a browsing list in place. Stable: entries with equal keys keep
/// their relative order.
pub fn sort_list(list: &mut Vec<PathBuf>, mode: SortMode) {
    match mode {
        SortMode::Alphabetical => {}
        SortMode::ModifiedDescending => {
            let mut keyed: Vec<(Reverse<SystemTime>, PathBuf)> = list
                .drain(..)
                .map(|p| {
                    let t = modified_time(&p).unwrap_or_else(|| {
                        log::warn!("No modification time for {:?}, sorting it last", p);
                        SystemTime::UNIX_EPOCH
                    });
                    (Reverse(t), p)
                })
                .collect();
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
            list.extend(keyed.into_iter().map(|(_, p)| p));
        }
    }
}

/// Re-order a live list after the sort mode changed. Plain path order is
/// the same order a file-name sorted walk produces, subdirectories included.
pub fn resort_list(list: &mut Vec<PathBuf>, mode: SortMode) {
    match mode {
        SortMode::Alphabetical => list.sort(),
        SortMode::ModifiedDescending => sort_list(list, mode),
    }
}

/// Walk `dir` in file-name order and keep every entry that passes
/// [`classify`]. Entries that fail to classify are logged and dropped.
pub fn collect_entries(dir: &Path, recursive: bool, supported_only: bool) -> Vec<PathBuf> {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {:?}: {}", dir, e);
                continue;
            }
        };
        match classify(entry.path(), supported_only) {
            Ok(true) => files.push(entry.into_path()),
            Ok(false) => {}
            Err(e) => log::warn!("Skipping entry: {}", e),
        }
    }
    files
}

/// A freshly built browsing list and the entry to show first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowsingSelection {
    pub list: Vec<PathBuf>,
    pub index: usize,
}

/// Build the browsing list for a directory or for the siblings of a file.
pub fn build_list(
    open_path: &Path,
    supported_only: bool,
    recursive: bool,
    sort: SortMode,
) -> Result<BrowsingSelection> {
    let meta = fs::metadata(open_path)
        .map_err(|_| ViewerError::PathNotFound(open_path.to_path_buf()))?;
    let start = Instant::now();

    if meta.is_dir() {
        let mut list = collect_entries(open_path, recursive, supported_only);
        if list.is_empty() {
            return Err(ViewerError::EmptyDirectory(open_path.to_path_buf()));
        }
        sort_list(&mut list, sort);
        log::info!(
            "Scanned {:?} in {:.2}s, found {} images",
            open_path,
            start.elapsed().as_secs_f64(),
            list.len()
        );
        return Ok(BrowsingSelection { list, index: 0 });
    }

    let parent = match open_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut list = collect_entries(parent, false, supported_only);
    if list.is_empty() {
        // The opened file itself was filtered out; browse just that file.
        list.push(open_path.to_path_buf());
    }
    sort_list(&mut list, sort);

    let index = position_of(&list, open_path).unwrap_or(0);
    log::info!(
        "Scanned siblings of {:?} in {:.2}s, {} entries, selected {}",
        open_path,
        start.elapsed().as_secs_f64(),
        list.len(),
        index
    );
    Ok(BrowsingSelection { list, index })
}

/// Index of the entry that refers to the same file as `target`.
pub fn position_of(list: &[PathBuf], target: &Path) -> Option<usize> {
    let target = fs::canonicalize(target).ok()?;
    list.iter()
        .position(|p| fs::canonicalize(p).map(|c| c == target).unwrap_or(false))
}

/// Move `index` by `delta` within a list of `len` entries. Running off the
/// end lands on the first entry; running off the start lands on the last.
pub fn step_index(index: usize, delta: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let next = index as i64 + delta;
    if next >= len as i64 {
        0
    } else if next < 0 {
        len - 1
    } else {
        next as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"not really an image").expect("write fixture");
        path
    }

    fn set_mtime(path: &Path, secs: u64) {
        let file = fs::File::options()
            .write(true)
            .open(path)
            .expect("open fixture");
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .expect("set mtime");
    }

    fn names(list: &[PathBuf]) -> Vec<String> {
        list.iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert!(is_image_file(Path::new("photo.JPG")));
        assert!(is_image_file(Path::new("scan.TiFf")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("README")));
    }

    #[test]
    fn classify_skips_directories_and_respects_filter() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("nested.png");
        fs::create_dir(&sub).unwrap();
        let txt = touch(dir.path(), "b.txt");

        assert!(!classify(&sub, false).unwrap());
        assert!(!classify(&txt, true).unwrap());
        assert!(classify(&txt, false).unwrap());
    }

    #[test]
    fn classify_reports_missing_entries() {
        let dir = tempdir().unwrap();
        let err = classify(&dir.path().join("gone.png"), true).unwrap_err();
        assert!(matches!(err, ViewerError::Enumeration { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn broken_entry_is_skipped_and_scan_continues() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a.png");
        std::os::unix::fs::symlink(dir.path().join("gone.png"), dir.path().join("b.png")).unwrap();
        touch(dir.path(), "c.png");

        let sel = build_list(dir.path(), true, false, SortMode::Alphabetical).unwrap();
        assert_eq!(names(&sel.list), ["a.png", "c.png"]);

        let all = collect_entries(dir.path(), false, false);
        assert_eq!(names(&all), ["a.png", "c.png"]);
    }

    #[test]
    fn directory_scan_keeps_only_supported_files() {
        let dir = tempdir().unwrap();
        for name in ["a.png", "b.txt", "c.jpg", "d.PNG", "e.doc", "f.svg"] {
            touch(dir.path(), name);
        }

        let sel = build_list(dir.path(), true, false, SortMode::Alphabetical).unwrap();
        assert_eq!(names(&sel.list), ["a.png", "c.jpg", "d.PNG", "f.svg"]);
        assert_eq!(sel.index, 0);
    }

    #[test]
    fn unfiltered_scan_includes_every_file() {
        let dir = tempdir().unwrap();
        for name in ["a.png", "b.txt"] {
            touch(dir.path(), name);
        }
        let sel = build_list(dir.path(), false, false, SortMode::Alphabetical).unwrap();
        assert_eq!(sel.list.len(), 2);
    }

    #[test]
    fn modified_sort_puts_newest_first() {
        let dir = tempdir().unwrap();
        let a = touch(dir.path(), "a.png");
        touch(dir.path(), "b.txt");
        let c = touch(dir.path(), "c.jpg");
        set_mtime(&a, 1);
        set_mtime(&c, 2);

        let alpha = build_list(dir.path(), true, false, SortMode::Alphabetical).unwrap();
        assert_eq!(names(&alpha.list), ["a.png", "c.jpg"]);

        let newest = build_list(dir.path(), true, false, SortMode::ModifiedDescending).unwrap();
        assert_eq!(names(&newest.list), ["c.jpg", "a.png"]);
    }

    #[test]
    fn modified_sort_is_stable_for_ties() {
        let dir = tempdir().unwrap();
        let mut list = Vec::new();
        for name in ["a.png", "b.png", "c.png", "d.png"] {
            let p = touch(dir.path(), name);
            set_mtime(&p, 42);
            list.push(p);
        }
        let before = list.clone();
        sort_list(&mut list, SortMode::ModifiedDescending);
        assert_eq!(list, before);
    }

    #[test]
    fn opening_a_file_selects_it_among_siblings() {
        let dir = tempdir().unwrap();
        for name in ["a.png", "c.jpg", "d.png"] {
            touch(dir.path(), name);
        }

        let sel = build_list(&dir.path().join("c.jpg"), true, false, SortMode::Alphabetical)
            .unwrap();
        assert_eq!(names(&sel.list), ["a.png", "c.jpg", "d.png"]);
        assert_eq!(sel.index, 1);
    }

    #[test]
    fn opening_a_file_matches_by_equivalence_not_spelling() {
        let dir = tempdir().unwrap();
        for name in ["a.png", "b.png"] {
            touch(dir.path(), name);
        }
        let roundabout = dir.path().join(".").join("b.png");
        let sel = build_list(&roundabout, true, false, SortMode::Alphabetical).unwrap();
        assert_eq!(sel.index, 1);
    }

    #[test]
    fn filtered_out_file_is_still_browsable() {
        let dir = tempdir().unwrap();
        let txt = touch(dir.path(), "notes.txt");
        let sel = build_list(&txt, true, false, SortMode::Alphabetical).unwrap();
        assert_eq!(sel.list, vec![txt]);
        assert_eq!(sel.index, 0);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "readme.txt");
        let err = build_list(dir.path(), true, false, SortMode::Alphabetical).unwrap_err();
        assert!(matches!(err, ViewerError::EmptyDirectory(_)));
    }

    #[test]
    fn missing_path_is_reported() {
        let dir = tempdir().unwrap();
        let err = build_list(&dir.path().join("nope"), true, false, SortMode::Alphabetical)
            .unwrap_err();
        assert!(matches!(err, ViewerError::PathNotFound(_)));
    }

    #[test]
    fn recursion_is_opt_in() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "top.png");
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        touch(&sub, "deep.png");

        let flat = build_list(dir.path(), true, false, SortMode::Alphabetical).unwrap();
        assert_eq!(names(&flat.list), ["top.png"]);

        let deep = build_list(dir.path(), true, true, SortMode::Alphabetical).unwrap();
        assert_eq!(names(&deep.list), ["deep.png", "top.png"]);
    }

    #[test]
    fn resorting_back_to_alphabetical_restores_scan_order() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("b");
        fs::create_dir(&sub).unwrap();
        for (i, p) in [
            touch(dir.path(), "a.png"),
            touch(&sub, "x.png"),
            touch(dir.path(), "c.png"),
        ]
        .iter()
        .enumerate()
        {
            set_mtime(p, 10 + i as u64);
        }

        let scanned = build_list(dir.path(), true, true, SortMode::Alphabetical).unwrap().list;
        assert_eq!(names(&scanned), ["a.png", "x.png", "c.png"]);

        let mut live = scanned.clone();
        resort_list(&mut live, SortMode::ModifiedDescending);
        assert_eq!(names(&live), ["c.png", "x.png", "a.png"]);
        resort_list(&mut live, SortMode::Alphabetical);
        assert_eq!(live, scanned);
    }

    #[test]
    fn stepping_wraps_to_the_opposite_end() {
        assert_eq!(step_index(4, 1, 5), 0);
        assert_eq!(step_index(0, -1, 5), 4);
        assert_eq!(step_index(2, 1, 5), 3);
        assert_eq!(step_index(95, 10, 100), 0);
        assert_eq!(step_index(5, -10, 100), 99);
        assert_eq!(step_index(0, 1, 0), 0);
    }
}
