//! Error helper functions for creating actionable error messages

use std::io;
use std::path::Path;

/// Check if an IO error is a permission denied error
pub fn is_permission_denied(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
}

/// Check if an IO error is a "not found" error
pub fn is_not_found(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

/// Create an enhanced error message for file permission issues
pub fn permission_error(path: &Path, operation: &str) -> String {
    let parent_dir = path.parent()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ".".to_string());

    format!(
        "Permission denied when {} '{}'\n\n\
         Possible fixes:\n\
         1. Check file permissions: ls -l '{}'\n\
         2. Rewrites replace the file, so the directory must be writable: chmod u+w '{}'\n\
         3. Exclude the file by narrowing --ext or the tree root",
        operation,
        path.display(),
        path.display(),
        parent_dir
    )
}

/// Create an enhanced error message for file not found issues
pub fn not_found_error(path: &Path, context: &str) -> String {
    format!(
        "File not found: '{}'\n\n\
         Context: {}\n\n\
         Possible fixes:\n\
         1. Check the path is correct\n\
         2. Use an absolute path if the relative path is ambiguous\n\
         3. The file may have been moved while the tree was being rewritten",
        path.display(),
        context,
    )
}

/// Create an enhanced error message for directory creation failures
pub fn dir_create_error(path: &Path, underlying_err: &io::Error) -> String {
    let base = format!("Failed to create directory: '{}'", path.display());

    if is_permission_denied(underlying_err) {
        format!(
            "{}\n\n\
             Cause: Permission denied\n\n\
             Possible fixes:\n\
             1. Check write permissions on the parent directory: ls -la '{}'\n\
             2. Try creating it manually: mkdir -p '{}'",
            base,
            path.parent().map(|p| p.display().to_string()).unwrap_or_else(|| ".".to_string()),
            path.display()
        )
    } else {
        format!(
            "{}\n\n\
             Underlying error: {}",
            base,
            underlying_err
        )
    }
}

/// Wrap an IO error from `operation` on `path` with a fix-oriented message
pub fn describe_io_error(path: &Path, operation: &str, err: io::Error) -> anyhow::Error {
    if is_permission_denied(&err) {
        anyhow::anyhow!(permission_error(path, operation))
    } else if is_not_found(&err) {
        anyhow::anyhow!(not_found_error(path, operation))
    } else {
        anyhow::Error::new(err).context(format!("Failed {} '{}'", operation, path.display()))
    }
}
