//! Reader for the make-style dependency files a C compiler emits with
//! `-MMD -MF`.
//!
//! A depfile is one logical rule, `target.o: dep1 dep2 \`, with
//! backslash-newline continuations. The target name is discarded; the
//! dependency list is returned as-is, duplicates included.

use std::fs;
use std::path::Path;

use crate::error::{BuildError, Result};

/// Parse a depfile into its dependency list.
///
/// Each line loses its trailing run of backslash, space, and tab, the lines
/// are joined with single spaces, and everything after the first colon is
/// whitespace-tokenized. No escape handling beyond line continuation; C
/// compilers emit paths as plain space-separated tokens.
pub fn parse(path: &Path) -> Result<Vec<String>> {
    let data = fs::read(path).map_err(|err| BuildError::io(path, err))?;
    let text = String::from_utf8_lossy(&data);

    let mut joined = String::with_capacity(text.len());
    for line in text.split('\n') {
        joined.push_str(line.trim_end_matches(|c| c == '\\' || c == ' ' || c == '\t'));
        joined.push(' ');
    }

    let Some(colon) = joined.find(':') else {
        return Err(BuildError::MalformedDepfile {
            path: path.to_path_buf(),
        });
    };

    Ok(joined[colon + 1..]
        .split_whitespace()
        .map(String::from)
        .collect())
}
