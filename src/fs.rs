//! Temporary directories and fixture copies

use crate::macros::eprintln;

/// A file or directory to copy into a temporary directory
///
/// See [`Assert::it_env`][crate::Assert::it_env].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fixture {
    pub source: std::path::PathBuf,
    /// Relative to the temporary directory
    pub dest: std::path::PathBuf,
}

impl Fixture {
    pub fn new(
        source: impl Into<std::path::PathBuf>,
        dest: impl Into<std::path::PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
        }
    }
}

/// Copy `source` to `dest`, whether `source` is a file or a directory
///
/// Directories are copied recursively.  Permissions and modification times are preserved, missing
/// parents of `dest` are created.
pub fn copy(
    source: impl AsRef<std::path::Path>,
    dest: impl AsRef<std::path::Path>,
) -> crate::Result<()> {
    let source = source.as_ref();
    let dest = dest.as_ref();
    let meta = source
        .metadata()
        .map_err(|e| format!("Failed to read metadata from {}: {}", source.display(), e))?;

    if !meta.is_dir() {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }
        return shallow_copy(source, dest);
    }

    for current in walkdir::WalkDir::new(source) {
        let current = current.map_err(|e| format!("Failed to walk {}: {}", source.display(), e))?;
        let rel = current.path().strip_prefix(source).map_err(|e| {
            format!(
                "{} is outside of {}: {}",
                current.path().display(),
                source.display(),
                e
            )
        })?;
        let target = dest.join(rel);

        shallow_copy(current.path(), &target)?;
    }

    Ok(())
}

/// Copy a file system entry, without recursing
fn shallow_copy(source: &std::path::Path, dest: &std::path::Path) -> crate::Result<()> {
    let meta = source
        .symlink_metadata()
        .map_err(|e| format!("Failed to read metadata from {}: {}", source.display(), e))?;
    if meta.is_dir() {
        std::fs::create_dir_all(dest)
            .map_err(|e| format!("Failed to create {}: {}", dest.display(), e))?;
    } else if meta.is_file() {
        std::fs::copy(source, dest).map_err(|e| {
            format!(
                "Failed to copy {} to {}: {}",
                source.display(),
                dest.display(),
                e
            )
        })?;
        // Tests comparing mtimes must not see the copy as a fresh write.
        let mtime = filetime::FileTime::from_last_modification_time(&meta);
        filetime::set_file_mtime(dest, mtime).map_err(|e| {
            format!(
                "Failed to copy {} metadata to {}: {}",
                source.display(),
                dest.display(),
                e
            )
        })?;
    } else if let Ok(target) = std::fs::read_link(source) {
        symlink_to_file(dest, &target)
            .map_err(|e| format!("Failed to create symlink {}: {}", dest.display(), e))?;
    }

    Ok(())
}

#[cfg(windows)]
fn symlink_to_file(link: &std::path::Path, target: &std::path::Path) -> Result<(), std::io::Error> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(windows))]
fn symlink_to_file(link: &std::path::Path, target: &std::path::Path) -> Result<(), std::io::Error> {
    std::os::unix::fs::symlink(target, link)
}

/// Run `f` inside a fresh temporary directory, then delete it
///
/// The directory is deleted even if `f` panics, unless `keep` is set or `CAPBOX_TMP_DISABLE` is
/// enabled when `f` finishes; then its path is reported on stderr instead.
pub fn tmp_dir<F, R>(keep: bool, f: F) -> crate::Result<R>
where
    F: FnOnce(&std::path::Path) -> R,
{
    let temp = tempfile::Builder::new()
        .prefix("capbox-")
        .tempdir()
        .map_err(|e| format!("Failed to create temporary directory: {e}"))?;
    // Mac puts temp dirs behind a `/private` symlink; tests comparing paths need the real one.
    let path = dunce::canonicalize(temp.path())
        .map_err(|e| format!("Failed to canonicalize {}: {}", temp.path().display(), e))?;
    crate::macros::debug!("Created {}", path.display());
    let guard = TmpDir {
        temp: Some(temp),
        keep,
    };

    let ret = f(&path);
    drop(guard);
    Ok(ret)
}

struct TmpDir {
    temp: Option<tempfile::TempDir>,
    keep: bool,
}

impl Drop for TmpDir {
    fn drop(&mut self) {
        let Some(temp) = self.temp.take() else {
            return;
        };
        let keep = self.keep
            || crate::config::flag_with_env_var(crate::config::TMP_DISABLE_ENV).unwrap_or(false);
        if keep {
            #[allow(deprecated)]
            let path = temp.into_path();
            eprintln!(
                "WARNING: Temporary directory deletion canceled: {}",
                path.display()
            );
        } else {
            let _path = temp.path().to_owned();
            if let Err(_err) = temp.close() {
                crate::macros::debug!("Failed to remove {}: {}", _path.display(), _err);
            }
        }
    }
}

/// Whether `path` is an existing regular file
pub fn is_file(path: impl AsRef<std::path::Path>) -> bool {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return false;
    }
    std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

/// Whether `path` is an existing directory
pub fn is_dir(path: impl AsRef<std::path::Path>) -> bool {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return false;
    }
    std::fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// Whether anything exists at `path`
pub fn exists(path: impl AsRef<std::path::Path>) -> bool {
    std::fs::metadata(path).is_ok()
}
