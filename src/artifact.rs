//! Encoded artifact names and object-directory path derivation.
//!
//! Each C source maps to a stable encoded name: the path is cleaned,
//! a leading `./` is trimmed, and the remaining separators become dots.
//! `src/net/tcp.c` compiled into `build/` therefore produces the sibling
//! triple `build/src.net.tcp.c.o`, `.d`, and `.cmd`.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use crate::error::{BuildError, Result};

/// Longest accepted encoded name. Most filesystems cap a file name at 255
/// bytes, and the artifact suffixes still have to fit.
pub const MAX_ENCODED_LEN: usize = 254;

/// The artifact triple shared by one compiled source.
pub struct ObjPaths {
    /// The object file, primary artifact.
    pub obj: PathBuf,
    /// The depfile written by the compiler via `-MMD -MF`.
    pub dep: PathBuf,
    /// The record of the exact compile command that produced the object.
    pub cmd: PathBuf,
}

/// Encode a source path into a flat object-directory file name.
pub fn encode_source_path(path: &str) -> Result<String> {
    let cleaned: PathBuf = Path::new(path).components().collect();
    let cleaned = cleaned.to_string_lossy();
    let trimmed = cleaned.strip_prefix("./").unwrap_or(&cleaned);
    let encoded = trimmed.replace(MAIN_SEPARATOR, ".");
    if encoded.len() > MAX_ENCODED_LEN {
        return Err(BuildError::NameTooLong {
            path: path.to_string(),
            len: encoded.len(),
        });
    }
    Ok(encoded)
}

/// Derive the `.o`/`.d`/`.cmd` triple for a source inside `objdir`.
pub fn obj_paths(objdir: &Path, cfile: &str) -> Result<ObjPaths> {
    let name = encode_source_path(cfile)?;
    Ok(ObjPaths {
        obj: objdir.join(format!("{name}.o")),
        dep: objdir.join(format!("{name}.d")),
        cmd: objdir.join(format!("{name}.cmd")),
    })
}

/// Map a whitespace-separated source list to its ordered object list.
///
/// Mapping from the sources rather than globbing the object directory keeps
/// stale objects from prior builds out of archive and link lines.
pub fn obj_files(objdir: &Path, cfiles: &str) -> Result<Vec<PathBuf>> {
    let files: Vec<&str> = cfiles.split_whitespace().collect();
    if files.is_empty() {
        return Err(BuildError::NoSources);
    }
    files
        .into_iter()
        .map(|file| Ok(objdir.join(format!("{}.o", encode_source_path(file)?))))
        .collect()
}
