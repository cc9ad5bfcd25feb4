//! Executable job: link objects, external libraries, and linker flags.

use std::fs;
use std::path::Path;
use std::process::Command;

use crate::artifact;
use crate::compile::CompileMany;
use crate::error::{BuildError, Result};
use crate::exec::{self, CancelToken, RunError};
use crate::fresh;
use crate::vprintln;

/// Produce an executable at `exe_path` from the objects of `objs` plus
/// `lib_paths` and `ldflags`.
///
/// Relinks when any object was rebuilt, the executable is missing, a listed
/// library is newer than it, or the recorded link command differs. The
/// exact link command is recorded next to the objects in
/// `<objdir>/<basename(exe_path)>.link`.
pub struct Link {
    pub objs: CompileMany,
    pub exe_path: String,
    pub lib_paths: String,
    pub ldflags: String,
}

impl Link {
    /// Returns whether the executable was (re)linked.
    pub fn run(&self, token: &CancelToken) -> Result<bool> {
        if self.exe_path.is_empty() {
            return Err(BuildError::InvalidConfig(
                "cc, cfiles, objdir, and exe-path are required",
            ));
        }

        let exe_name = Path::new(&self.exe_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let link_cmd_file = Path::new(&self.objs.objdir).join(format!("{exe_name}.link"));

        let built = match self.objs.run(token) {
            Ok(built) => built,
            Err(err) => {
                let _ = fs::remove_file(&self.exe_path);
                let _ = fs::remove_file(&link_cmd_file);
                return Err(err);
            }
        };

        let objects = artifact::obj_files(Path::new(&self.objs.objdir), &self.objs.cfiles)?;
        let mut args: Vec<String> = objects.iter().map(|obj| obj.display().to_string()).collect();
        args.extend(self.lib_paths.split_whitespace().map(String::from));
        args.extend(self.ldflags.split_whitespace().map(String::from));
        args.push("-o".to_string());
        args.push(self.exe_path.clone());
        let cmd_line = format!("{} {}", self.objs.cc, args.join(" "));

        if !self.objs.force && !built {
            match fresh::exe_up_to_date(token, &self.exe_path, &self.lib_paths, &link_cmd_file, &cmd_line)
            {
                Ok(true) => {
                    vprintln!("✅ 🚀 {} is up to date.", self.exe_path);
                    return Ok(false);
                }
                Ok(false) => {}
                Err(err) => {
                    let _ = fs::remove_file(&self.exe_path);
                    let _ = fs::remove_file(&link_cmd_file);
                    return Err(err);
                }
            }
        }

        // Rewritten below once the link succeeds.
        let _ = fs::remove_file(&link_cmd_file);

        vprintln!("[linking] 🔗 {}", cmd_line);
        let mut command = Command::new(&self.objs.cc);
        command.args(&args);
        if let Err(err) = exec::run_checked(&mut command, token) {
            let _ = fs::remove_file(&self.exe_path);
            let _ = fs::remove_file(&link_cmd_file);
            return Err(match err {
                RunError::Cancelled => BuildError::Cancelled,
                RunError::Failed(reason) => BuildError::LinkFailed {
                    exe: Path::new(&self.exe_path).to_path_buf(),
                    reason,
                },
            });
        }

        fs::write(&link_cmd_file, &cmd_line).map_err(|err| BuildError::LinkRecordFailed {
            path: link_cmd_file.clone(),
            source: err,
        })?;

        Ok(true)
    }
}
