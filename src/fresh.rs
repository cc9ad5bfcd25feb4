//! Freshness oracles: is an artifact up to date given its recorded inputs?
//!
//! All timestamp comparisons are strictly-after at the filesystem's native
//! resolution, so equal mtimes count as fresh. Missing artifacts and
//! changed command records are stale verdicts; anything else that goes
//! wrong while checking is a failure of the check itself.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::artifact::ObjPaths;
use crate::depfile;
use crate::error::{BuildError, Result};
use crate::exec::{self, CancelToken, Flow};
use crate::vprintln;

fn exists_checked(path: &Path) -> Result<bool> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(BuildError::io(path, err)),
    }
}

fn mtime(path: &Path) -> Result<SystemTime> {
    let meta = fs::metadata(path).map_err(|err| BuildError::io(path, err))?;
    meta.modified().map_err(|err| BuildError::io(path, err))
}

/// Decide whether a compiled object is up to date.
///
/// Checks in order, first stale verdict winning: the object, depfile, and
/// cmd record all exist; the source is not newer than the object; the cmd
/// record's bytes equal the current command line; no depfile entry is newer
/// than the object.
pub fn obj_up_to_date(
    token: &CancelToken,
    cfile: &str,
    paths: &ObjPaths,
    cmd_line: &str,
) -> Result<bool> {
    let obj_mtime = match fs::metadata(&paths.obj) {
        Ok(meta) => meta
            .modified()
            .map_err(|err| BuildError::io(&paths.obj, err))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            vprintln!("[build] 🧠 {}: object file does not exist.", paths.obj.display());
            return Ok(false);
        }
        Err(err) => return Err(BuildError::io(&paths.obj, err)),
    };

    if !exists_checked(&paths.dep)? {
        vprintln!(
            "[build] 🧠 {}: dep file {} does not exist.",
            paths.obj.display(),
            paths.dep.display()
        );
        return Ok(false);
    }

    if !exists_checked(&paths.cmd)? {
        vprintln!(
            "[build] 🧠 {}: cmd file {} does not exist.",
            paths.obj.display(),
            paths.cmd.display()
        );
        return Ok(false);
    }

    if mtime(Path::new(cfile))? > obj_mtime {
        vprintln!(
            "[rebuild] 🧠 {}: source file {} is newer than object.",
            paths.obj.display(),
            cfile
        );
        return Ok(false);
    }

    let recorded = fs::read(&paths.cmd).map_err(|err| BuildError::io(&paths.cmd, err))?;
    if recorded != cmd_line.as_bytes() {
        vprintln!("[rebuild] 🧠 {}: compile command changed.", paths.obj.display());
        return Ok(false);
    }

    let deps = depfile::parse(&paths.dep)?;
    deps_up_to_date(token, &paths.obj, &deps, obj_mtime)
}

/// Concurrently stat every depfile entry against the object's mtime.
///
/// The first newer dependency short-circuits the rest of the scan; a
/// dependency that cannot be stat'd is reported, never treated as stale.
fn deps_up_to_date(
    token: &CancelToken,
    obj: &Path,
    deps: &[String],
    obj_mtime: SystemTime,
) -> Result<bool> {
    if deps.is_empty() {
        return Ok(true);
    }

    let tasks: Vec<_> = deps
        .iter()
        .map(|dep| {
            move |_: &CancelToken| -> Result<Flow> {
                let meta = fs::metadata(dep.as_str()).map_err(|err| BuildError::MissingDependency {
                    dep: PathBuf::from(dep),
                    source: err,
                })?;
                let dep_mtime = meta
                    .modified()
                    .map_err(|err| BuildError::io(dep.as_str(), err))?;
                if dep_mtime > obj_mtime {
                    vprintln!("[rebuild] 🧠 {}: dep {} is newer than object.", obj.display(), dep);
                    return Ok(Flow::Break);
                }
                Ok(Flow::Continue)
            }
        })
        .collect();

    let newer = exec::run_group(exec::stat_limit(), token, tasks)?;
    Ok(!newer)
}

/// Decide whether a linked executable is up to date.
///
/// Stale when the executable or its link record is missing, when any listed
/// library is newer than the executable, or when the recorded link command
/// differs from the current one. A listed library that cannot be stat'd is
/// an error, not a silent stale.
pub fn exe_up_to_date(
    token: &CancelToken,
    exe_path: &str,
    lib_paths: &str,
    link_cmd_file: &Path,
    cmd_line: &str,
) -> Result<bool> {
    let exe_mtime = match fs::metadata(exe_path) {
        Ok(meta) => meta.modified().map_err(|err| BuildError::io(exe_path, err))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            vprintln!("[link] 🧠 {}: file does not exist.", exe_path);
            return Ok(false);
        }
        Err(err) => return Err(BuildError::io(exe_path, err)),
    };

    if !exists_checked(link_cmd_file)? {
        vprintln!(
            "[link] 🧠 {}: link cmd file {} does not exist.",
            exe_path,
            link_cmd_file.display()
        );
        return Ok(false);
    }

    let libs: Vec<&str> = lib_paths.split_whitespace().collect();
    if !libs.is_empty() {
        let tasks: Vec<_> = libs
            .iter()
            .copied()
            .map(|lib| {
                move |_: &CancelToken| -> Result<Flow> {
                    let meta = fs::metadata(lib).map_err(|err| BuildError::MissingLibrary {
                        lib: PathBuf::from(lib),
                        source: err,
                    })?;
                    let lib_mtime = meta.modified().map_err(|err| BuildError::io(lib, err))?;
                    if lib_mtime > exe_mtime {
                        vprintln!("[relink] 🧠 {}: lib file {} is newer than exe.", exe_path, lib);
                        return Ok(Flow::Break);
                    }
                    Ok(Flow::Continue)
                }
            })
            .collect();

        if exec::run_group(exec::stat_limit(), token, tasks)? {
            return Ok(false);
        }
    }

    let recorded = match fs::read(link_cmd_file) {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(BuildError::io(link_cmd_file, err)),
    };
    if recorded != cmd_line.as_bytes() {
        vprintln!("[link] 🧠 {}: link command changed.", exe_path);
        return Ok(false);
    }

    Ok(true)
}

/// A static library only needs to exist; upstream object freshness is the
/// caller's signal for rebuilding it.
pub fn lib_up_to_date(lib_path: &Path) -> Result<bool> {
    if !exists_checked(lib_path)? {
        vprintln!("[build-lib] 🧠 {}: file does not exist.", lib_path.display());
        return Ok(false);
    }
    Ok(true)
}
