use std::path::Path;
use walkdir::WalkDir;

fn normalized_suffix(path: &Path, prefix: &Path) -> String {
    path.strip_prefix(prefix)
        .expect("strip prefix from path")
        .to_str()
        .expect("convert suffix to UTF-8")
        .replace('\\', "/")
}

/// Sorted list of directories and links under `root`, relative to `root`.
pub fn get_all_folders(root: &Path) -> Vec<String> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| entry.expect("access entry"))
        .filter(|entry| entry.file_type().is_dir() || entry.file_type().is_symlink())
        .map(|entry| normalized_suffix(entry.path(), root))
        .filter(|suffix| !suffix.is_empty())
        .collect()
}

/// Sorted list of regular files under `root`, relative to `root`. Links are not followed.
pub fn get_all_files(root: &Path) -> Vec<String> {
    let mut files: Vec<_> = WalkDir::new(root)
        .into_iter()
        .map(|entry| entry.expect("access entry"))
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| normalized_suffix(entry.path(), root))
        .collect();
    files.sort();
    files
}
