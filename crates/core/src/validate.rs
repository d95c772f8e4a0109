use crate::error::{Result, StorageError};
use std::path::{Path, PathBuf};

/// Rejects traversal and absolute names, then strips everything outside
/// letters, digits, `.`, `_`, `-` and space.
pub fn sanitize_filename(raw: &str) -> Result<String> {
    let invalid = || StorageError::InvalidFilename(raw.to_string());
    if raw.starts_with(['/', '\\']) || raw.split(['/', '\\']).any(|seg| seg == "..") {
        return Err(invalid());
    }
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | ' '))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.chars().all(|c| c == '.' || c == ' ') {
        return Err(invalid());
    }
    Ok(cleaned.to_string())
}

/// Case-insensitive allow-list check; an empty list allows everything.
pub fn check_extension(name: &str, allowed: &[String]) -> Result<()> {
    if allowed.is_empty() {
        return Ok(());
    }
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    let Some(ext) = ext else {
        return Err(StorageError::ExtensionNotAllowed(name.to_string()));
    };
    if allowed
        .iter()
        .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(&ext))
    {
        Ok(())
    } else {
        Err(StorageError::ExtensionNotAllowed(name.to_string()))
    }
}

/// A limit of 0 disables the check.
pub fn check_size(name: &str, size: u64, limit: u64) -> Result<()> {
    if limit > 0 && size > limit {
        return Err(StorageError::TooLarge {
            name: name.to_string(),
            size,
            limit,
        });
    }
    Ok(())
}

/// Resolves `path` to its real location and requires it to sit below the
/// canonical `root`. A file that no longer exists is resolved through its
/// parent directory.
pub fn ensure_within_root(root: &Path, path: &Path) -> Result<PathBuf> {
    let outside = || StorageError::OutsideRoot(path.to_path_buf());
    let resolved = match path.canonicalize() {
        Ok(p) => p,
        Err(_) => {
            let name = path.file_name().ok_or_else(outside)?;
            let parent = path.parent().ok_or_else(outside)?;
            parent.canonicalize().map_err(|_| outside())?.join(name)
        }
    };
    if resolved != root && resolved.starts_with(root) {
        Ok(resolved)
    } else {
        Err(outside())
    }
}
