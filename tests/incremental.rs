//! Incremental build behavior tests.
//!
//! These exercise the jobs end to end against the host C toolchain and
//! verify that work is skipped exactly when inputs are unchanged. Tests
//! skip with a note when no `cc` is available.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, SystemTime};

use cbuild::archive::Archive;
use cbuild::artifact;
use cbuild::compile::{CompileMany, CompileOne};
use cbuild::error::BuildError;
use cbuild::exec::CancelToken;
use cbuild::link::Link;

fn have_cc() -> bool {
    Command::new("cc")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Create a clean scratch project directory.
fn create_test_project(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("cbuild_test_projects").join(name);
    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(dir.join("src")).expect("Failed to create src directory");
    dir
}

fn set_mtime(path: &Path, when: SystemTime) {
    let file = fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(when).unwrap();
}

fn compile_one(dir: &Path, cfile: &str, cflags: &str) -> CompileOne {
    CompileOne {
        cc: "cc".into(),
        cfile: cfile.into(),
        objdir: dir.join("build").display().to_string(),
        cflags: cflags.into(),
        force: false,
    }
}

#[test]
fn cold_compile_creates_triple_then_noop() {
    if !have_cc() {
        eprintln!("Skipping test: no cc on this host");
        return;
    }
    let dir = create_test_project("cold_noop");
    let cfile = dir.join("src").join("a.c").display().to_string();
    fs::write(&cfile, "int answer(void) { return 42; }\n").unwrap();

    let token = CancelToken::new();
    let job = compile_one(&dir, &cfile, "");
    assert!(job.run(&token).unwrap(), "cold compile must build");

    let paths = artifact::obj_paths(&dir.join("build"), &cfile).unwrap();
    assert!(paths.obj.exists());
    assert!(paths.dep.exists());
    assert!(paths.cmd.exists());

    let recorded = fs::read_to_string(&paths.cmd).unwrap();
    let expected = format!(
        "cc -MMD -MF {} -c {} -o {}",
        paths.dep.display(),
        cfile,
        paths.obj.display()
    );
    assert_eq!(recorded, expected);

    assert!(!job.run(&token).unwrap(), "unchanged rerun must skip");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn changed_cflags_force_recompile() {
    if !have_cc() {
        eprintln!("Skipping test: no cc on this host");
        return;
    }
    let dir = create_test_project("flag_change");
    let cfile = dir.join("src").join("a.c").display().to_string();
    fs::write(&cfile, "int x;\n").unwrap();

    let token = CancelToken::new();
    assert!(compile_one(&dir, &cfile, "").run(&token).unwrap());
    assert!(!compile_one(&dir, &cfile, "").run(&token).unwrap());

    assert!(
        compile_one(&dir, &cfile, "-O2").run(&token).unwrap(),
        "flag change must recompile"
    );
    let paths = artifact::obj_paths(&dir.join("build"), &cfile).unwrap();
    let recorded = fs::read_to_string(&paths.cmd).unwrap();
    assert!(recorded.starts_with("cc -O2 "));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn touched_header_forces_recompile() {
    if !have_cc() {
        eprintln!("Skipping test: no cc on this host");
        return;
    }
    let dir = create_test_project("header_touch");
    let header = dir.join("src").join("a.h");
    let cfile = dir.join("src").join("a.c").display().to_string();
    fs::write(&header, "#define ANSWER 42\n").unwrap();
    fs::write(&cfile, "#include \"a.h\"\nint answer(void) { return ANSWER; }\n").unwrap();

    let token = CancelToken::new();
    let job = compile_one(&dir, &cfile, "");
    assert!(job.run(&token).unwrap());
    assert!(!job.run(&token).unwrap());

    set_mtime(&header, SystemTime::now() + Duration::from_secs(60));
    assert!(job.run(&token).unwrap(), "newer header must recompile");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn removed_companions_force_recompile() {
    if !have_cc() {
        eprintln!("Skipping test: no cc on this host");
        return;
    }
    let dir = create_test_project("companions");
    let cfile = dir.join("src").join("a.c").display().to_string();
    fs::write(&cfile, "int x;\n").unwrap();

    let token = CancelToken::new();
    let job = compile_one(&dir, &cfile, "");
    assert!(job.run(&token).unwrap());
    let paths = artifact::obj_paths(&dir.join("build"), &cfile).unwrap();

    fs::remove_file(&paths.dep).unwrap();
    assert!(job.run(&token).unwrap(), "missing depfile must recompile");

    fs::remove_file(&paths.cmd).unwrap();
    assert!(job.run(&token).unwrap(), "missing cmd record must recompile");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn static_lib_skips_until_missing() {
    if !have_cc() {
        eprintln!("Skipping test: no cc on this host");
        return;
    }
    let dir = create_test_project("static_lib");
    let one = dir.join("src").join("one.c").display().to_string();
    let two = dir.join("src").join("two.c").display().to_string();
    fs::write(&one, "int one(void) { return 1; }\n").unwrap();
    fs::write(&two, "int two(void) { return 2; }\n").unwrap();

    let lib_path = dir.join("out").join("libnums.a").display().to_string();
    let job = Archive {
        objs: CompileMany {
            cc: "cc".into(),
            cfiles: format!("{one} {two}"),
            objdir: dir.join("build").display().to_string(),
            cflags: String::new(),
            force: false,
        },
        lib_path: lib_path.clone(),
    };

    let token = CancelToken::new();
    assert!(job.run(&token).unwrap());
    assert!(Path::new(&lib_path).exists());

    assert!(!job.run(&token).unwrap(), "unchanged archive must skip");

    fs::remove_file(&lib_path).unwrap();
    assert!(job.run(&token).unwrap(), "missing library must re-archive");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn newer_library_relinks_without_recompiling() {
    if !have_cc() {
        eprintln!("Skipping test: no cc on this host");
        return;
    }
    let dir = create_test_project("relink");
    let foo = dir.join("src").join("foo.c").display().to_string();
    let main_c = dir.join("src").join("main.c").display().to_string();
    fs::write(&foo, "int foo(void) { return 7; }\n").unwrap();
    fs::write(&main_c, "int foo(void);\nint main(void) { return foo(); }\n").unwrap();

    let objdir = dir.join("build").display().to_string();
    let lib_path = dir.join("out").join("libfoo.a").display().to_string();
    let exe_path = dir.join("out").join("app").display().to_string();

    let lib_job = Archive {
        objs: CompileMany {
            cc: "cc".into(),
            cfiles: foo.clone(),
            objdir: dir.join("build-lib").display().to_string(),
            cflags: String::new(),
            force: false,
        },
        lib_path: lib_path.clone(),
    };
    let exe_job = Link {
        objs: CompileMany {
            cc: "cc".into(),
            cfiles: main_c.clone(),
            objdir: objdir.clone(),
            cflags: String::new(),
            force: false,
        },
        exe_path: exe_path.clone(),
        lib_paths: lib_path.clone(),
        ldflags: String::new(),
    };

    let token = CancelToken::new();
    assert!(lib_job.run(&token).unwrap());
    assert!(exe_job.run(&token).unwrap());

    let link_record = dir.join("build").join("app.link");
    assert!(link_record.exists());
    let recorded = fs::read_to_string(&link_record).unwrap();
    assert!(recorded.starts_with("cc "));
    assert!(recorded.ends_with(&format!("-o {exe_path}")));

    assert!(!exe_job.run(&token).unwrap(), "unchanged exe must skip");

    let obj = artifact::obj_paths(&dir.join("build"), &main_c).unwrap().obj;
    let obj_mtime_before = fs::metadata(&obj).unwrap().modified().unwrap();

    set_mtime(Path::new(&lib_path), SystemTime::now() + Duration::from_secs(60));
    assert!(exe_job.run(&token).unwrap(), "newer library must relink");

    let obj_mtime_after = fs::metadata(&obj).unwrap().modified().unwrap();
    assert_eq!(
        obj_mtime_before, obj_mtime_after,
        "relink must not recompile objects"
    );

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn declared_missing_library_fails_the_link_job() {
    if !have_cc() {
        eprintln!("Skipping test: no cc on this host");
        return;
    }
    let dir = create_test_project("missing_lib");
    let main_c = dir.join("src").join("main.c").display().to_string();
    fs::write(&main_c, "int main(void) { return 0; }\n").unwrap();

    let objdir = dir.join("build").display().to_string();
    let exe_path = dir.join("out").join("app").display().to_string();

    let build = |lib_paths: &str| Link {
        objs: CompileMany {
            cc: "cc".into(),
            cfiles: main_c.clone(),
            objdir: objdir.clone(),
            cflags: String::new(),
            force: false,
        },
        exe_path: exe_path.clone(),
        lib_paths: lib_paths.into(),
        ldflags: String::new(),
    };

    let token = CancelToken::new();
    assert!(build("").run(&token).unwrap());

    let ghost = dir.join("out").join("libghost.a").display().to_string();
    match build(&ghost).run(&token) {
        Err(BuildError::MissingLibrary { lib, .. }) => {
            assert_eq!(lib, Path::new(&ghost));
        }
        other => panic!("expected MissingLibrary, got {other:?}"),
    }

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn batch_reports_the_failing_source() {
    if !have_cc() {
        eprintln!("Skipping test: no cc on this host");
        return;
    }
    let dir = create_test_project("batch_error");
    let mut cfiles = Vec::new();
    for i in 0..5 {
        let cfile = dir.join("src").join(format!("s{i}.c"));
        let body = if i == 2 {
            "int broken(\n".to_string()
        } else {
            format!("int s{i}(void) {{ return {i}; }}\n")
        };
        fs::write(&cfile, body).unwrap();
        cfiles.push(cfile.display().to_string());
    }

    let job = CompileMany {
        cc: "cc".into(),
        cfiles: cfiles.join(" "),
        objdir: dir.join("build").display().to_string(),
        cflags: String::new(),
        force: false,
    };

    let token = CancelToken::new();
    match job.run(&token) {
        Err(BuildError::CompileFailed { cfile, .. }) => assert_eq!(cfile, cfiles[2]),
        other => panic!("expected CompileFailed, got {other:?}"),
    }

    // The failing source never got a command record, so the next run
    // re-attempts it.
    let paths = artifact::obj_paths(&dir.join("build"), &cfiles[2]).unwrap();
    assert!(!paths.cmd.exists());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn force_rebuilds_fresh_artifacts() {
    if !have_cc() {
        eprintln!("Skipping test: no cc on this host");
        return;
    }
    let dir = create_test_project("force");
    let cfile = dir.join("src").join("a.c").display().to_string();
    fs::write(&cfile, "int x;\n").unwrap();

    let token = CancelToken::new();
    assert!(compile_one(&dir, &cfile, "").run(&token).unwrap());

    let mut forced = compile_one(&dir, &cfile, "");
    forced.force = true;
    assert!(forced.run(&token).unwrap(), "force must rebuild");

    fs::remove_dir_all(&dir).ok();
}
