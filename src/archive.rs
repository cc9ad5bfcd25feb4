//! Static library job: `ar rcs` over a CompileMany run's objects.

use std::fs;
use std::path::Path;
use std::process::Command;

use crate::artifact;
use crate::compile::CompileMany;
use crate::error::{BuildError, Result};
use crate::exec::{self, CancelToken, RunError};
use crate::fresh;
use crate::vprintln;

/// Produce a static library at `lib_path` from the objects of `objs`.
///
/// Rebuilds when any object was rebuilt this run or the library is missing;
/// skips otherwise. Failures remove the (possibly partial) library so the
/// next run starts clean.
pub struct Archive {
    pub objs: CompileMany,
    pub lib_path: String,
}

impl Archive {
    /// Returns whether the library was (re)built.
    pub fn run(&self, token: &CancelToken) -> Result<bool> {
        if self.lib_path.is_empty() {
            return Err(BuildError::InvalidConfig(
                "cc, cfiles, objdir, and lib-path are required",
            ));
        }

        let built = match self.objs.run(token) {
            Ok(built) => built,
            Err(err) => {
                let _ = fs::remove_file(&self.lib_path);
                return Err(err);
            }
        };

        let lib_path = Path::new(&self.lib_path);
        if let Some(parent) = lib_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| BuildError::io(parent, err))?;
            }
        }

        if !self.objs.force && !built {
            match fresh::lib_up_to_date(lib_path) {
                Ok(true) => {
                    vprintln!("✅ 📦 {} is up to date.", self.lib_path);
                    return Ok(false);
                }
                Ok(false) => {}
                Err(err) => {
                    let _ = fs::remove_file(lib_path);
                    return Err(err);
                }
            }
        }

        let _ = fs::remove_file(lib_path);

        let objects = artifact::obj_files(Path::new(&self.objs.objdir), &self.objs.cfiles)?;
        let mut args: Vec<String> = vec!["rcs".to_string(), self.lib_path.clone()];
        args.extend(objects.iter().map(|obj| obj.display().to_string()));
        let cmd_line = format!("ar {}", args.join(" "));

        vprintln!("[archive] 📦 {}", cmd_line);
        let mut command = Command::new("ar");
        command.args(&args);
        if let Err(err) = exec::run_checked(&mut command, token) {
            let _ = fs::remove_file(lib_path);
            return Err(match err {
                RunError::Cancelled => BuildError::Cancelled,
                RunError::Failed(reason) => BuildError::ArchiveFailed {
                    lib: lib_path.to_path_buf(),
                    reason,
                },
            });
        }

        Ok(true)
    }
}
