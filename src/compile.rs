//! Compile jobs: one source, or a whole set in parallel.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::artifact;
use crate::error::{BuildError, Result};
use crate::exec::{self, CancelToken, Flow, RunError};
use crate::fresh;
use crate::vprintln;

/// Compile a single C source into `<objdir>/<enc>.o` with its `.d` and
/// `.cmd` companions.
pub struct CompileOne {
    pub cc: String,
    pub cfile: String,
    pub objdir: String,
    pub cflags: String,
    pub force: bool,
}

impl CompileOne {
    /// Returns whether the object was (re)built.
    pub fn run(&self, token: &CancelToken) -> Result<bool> {
        compile_object(token, &self.cc, &self.cfile, &self.objdir, &self.cflags, self.force)
    }
}

/// Compile a whitespace-separated set of C sources in parallel, bounded by
/// the logical CPU count.
pub struct CompileMany {
    pub cc: String,
    pub cfiles: String,
    pub objdir: String,
    pub cflags: String,
    pub force: bool,
}

impl CompileMany {
    /// Returns whether any object was (re)built. The first compile failure
    /// cancels the rest of the batch.
    pub fn run(&self, token: &CancelToken) -> Result<bool> {
        if self.cc.is_empty() || self.cfiles.is_empty() || self.objdir.is_empty() {
            return Err(BuildError::InvalidConfig("cc, cfiles, and objdir are required"));
        }
        let files: Vec<&str> = self.cfiles.split_whitespace().collect();
        if files.is_empty() {
            return Err(BuildError::NoSources);
        }

        let any_built = AtomicBool::new(false);
        let (cc, objdir, cflags, force) = (&self.cc, &self.objdir, &self.cflags, self.force);

        let tasks: Vec<_> = files
            .into_iter()
            .map(|cfile| {
                let any_built = &any_built;
                move |t: &CancelToken| -> Result<Flow> {
                    if compile_object(t, cc, cfile, objdir, cflags, force)? {
                        any_built.store(true, Ordering::SeqCst);
                    }
                    Ok(Flow::Continue)
                }
            })
            .collect();

        exec::run_group(exec::cpu_count(), token, tasks)?;
        Ok(any_built.load(Ordering::SeqCst))
    }
}

fn compile_object(
    token: &CancelToken,
    cc: &str,
    cfile: &str,
    objdir: &str,
    cflags: &str,
    force: bool,
) -> Result<bool> {
    token.check()?;

    if cc.is_empty() || cfile.is_empty() || objdir.is_empty() {
        return Err(BuildError::InvalidConfig("cc, cfile, and objdir are required"));
    }

    let paths = artifact::obj_paths(Path::new(objdir), cfile)?;

    let mut args: Vec<String> = cflags.split_whitespace().map(String::from).collect();
    args.extend([
        "-MMD".to_string(),
        "-MF".to_string(),
        paths.dep.display().to_string(),
        "-c".to_string(),
        cfile.to_string(),
        "-o".to_string(),
        paths.obj.display().to_string(),
    ]);
    let cmd_line = format!("{} {}", cc, args.join(" "));

    if !force && fresh::obj_up_to_date(token, cfile, &paths, &cmd_line)? {
        vprintln!("✅ {} is up to date.", paths.obj.display());
        return Ok(false);
    }

    fs::create_dir_all(objdir).map_err(|err| BuildError::io(objdir, err))?;

    // The compiler rewrites the depfile and overwrites the object in place;
    // the cmd record is only written back after a successful run, so a
    // crashed compile leaves a triple the next run treats as stale.
    let _ = fs::remove_file(&paths.dep);
    let _ = fs::remove_file(&paths.cmd);

    vprintln!("[compile] 🔨 {}", cmd_line);
    let mut command = Command::new(cc);
    command.args(&args);
    exec::run_checked(&mut command, token).map_err(|err| match err {
        RunError::Cancelled => BuildError::Cancelled,
        RunError::Failed(reason) => BuildError::CompileFailed {
            cfile: cfile.to_string(),
            reason,
        },
    })?;

    fs::write(&paths.cmd, &cmd_line).map_err(|err| BuildError::CmdRecordFailed {
        path: paths.cmd.clone(),
        source: err,
    })?;

    Ok(true)
}
