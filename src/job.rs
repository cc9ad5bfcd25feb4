//! The closed set of build jobs.

use crate::archive::Archive;
use crate::compile::{CompileMany, CompileOne};
use crate::error::Result;
use crate::exec::CancelToken;
use crate::link::Link;

/// One unit of driver work. Jobs share no state beyond their configuration.
pub enum Job {
    Obj(CompileOne),
    Objs(CompileMany),
    StaticLib(Archive),
    Exe(Link),
}

impl Job {
    /// Run the job to completion, returning whether it built an artifact.
    pub fn run(&self, token: &CancelToken) -> Result<bool> {
        match self {
            Job::Obj(job) => job.run(token),
            Job::Objs(job) => job.run(token),
            Job::StaticLib(job) => job.run(token),
            Job::Exe(job) => job.run(token),
        }
    }
}
