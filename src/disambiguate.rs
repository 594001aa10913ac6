use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Path → collision-free upload name, scoped to one batch. Only paths whose
/// basename collides with an earlier path in the same batch appear here.
pub type RenameMap = HashMap<PathBuf, String>;

/// Computes a collision-free upload name for each path in one batch.
///
/// Deterministic given the same ordered input: the first occurrence of a
/// basename keeps its original name (and stays absent from the map); the Nth
/// subsequent occurrence maps to `{base}_{N}{ext}`, splitting on the last
/// extension boundary. Uniqueness is only needed within one batch because the
/// upload transport is invoked once per batch.
pub fn disambiguate<P: AsRef<Path>>(paths: &[P]) -> RenameMap {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut renames = RenameMap::new();
    for path in paths {
        let path = path.as_ref();
        let name = basename(path);
        let count = seen.entry(name.clone()).or_insert(0);
        if *count > 0 {
            renames.insert(path.to_path_buf(), numbered(&name, *count));
        }
        *count += 1;
    }
    renames
}

/// The name a path uploads under: its batch rename if one was assigned,
/// otherwise its original basename.
pub fn upload_name(path: &Path, renames: &RenameMap) -> String {
    renames
        .get(path)
        .cloned()
        .unwrap_or_else(|| basename(path))
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn numbered(name: &str, n: usize) -> String {
    match name.rfind('.') {
        // A leading dot (".env") marks a hidden file, not an extension.
        Some(i) if i > 0 => format!("{}_{}{}", &name[..i], n, &name[i..]),
        _ => format!("{name}_{n}"),
    }
}
