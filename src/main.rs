use anyhow::Context;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::*;

use cbuild::archive::Archive;
use cbuild::compile::{CompileMany, CompileOne};
use cbuild::exec::CancelToken;
use cbuild::job::Job;
use cbuild::link::Link;
use cbuild::{verbose, vprintln};

#[derive(Parser)]
#[command(name = "cb")]
#[command(about = "Incremental C build driver", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a single source file to an object file
    Obj {
        /// C compiler
        #[arg(long)]
        cc: String,
        /// C source file
        #[arg(long)]
        cfile: String,
        /// Output object directory
        #[arg(long)]
        objdir: String,
        /// Additional compiler flags
        #[arg(long, default_value = "")]
        cflags: String,
        /// Force a complete build
        #[arg(short = 'f', long)]
        force: bool,
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
    /// Compile multiple source files to object files
    Objs {
        /// C compiler
        #[arg(long)]
        cc: String,
        /// Space-separated list of C source files
        #[arg(long)]
        cfiles: String,
        /// Output object directory
        #[arg(long)]
        objdir: String,
        /// Additional compiler flags
        #[arg(long, default_value = "")]
        cflags: String,
        /// Force a complete build
        #[arg(short = 'f', long)]
        force: bool,
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
    /// Build a static library from multiple C source files
    StaticLib {
        /// C compiler
        #[arg(long)]
        cc: String,
        /// Space-separated list of C source files
        #[arg(long)]
        cfiles: String,
        /// Output object directory
        #[arg(long)]
        objdir: String,
        /// Library path
        #[arg(long)]
        lib_path: String,
        /// Additional compiler flags
        #[arg(long, default_value = "")]
        cflags: String,
        /// Force a complete build
        #[arg(short = 'f', long)]
        force: bool,
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
    /// Build an application binary from source files and libraries
    Exe {
        /// C compiler
        #[arg(long)]
        cc: String,
        /// Space-separated list of C source files
        #[arg(long)]
        cfiles: String,
        /// Output object directory
        #[arg(long)]
        objdir: String,
        /// Executable path
        #[arg(long)]
        exe_path: String,
        /// Space-separated list of library paths
        #[arg(long, default_value = "")]
        lib_paths: String,
        /// Additional compiler flags
        #[arg(long, default_value = "")]
        cflags: String,
        /// Additional linker flags
        #[arg(long, default_value = "")]
        ldflags: String,
        /// Force a complete build
        #[arg(short = 'f', long)]
        force: bool,
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
    /// Generate shell completion scripts
    Completions { shell: Shell },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => {
                let _ = err.print();
                std::process::exit(1);
            }
        },
    };

    if let Err(err) = run(cli) {
        eprintln!("{} {:#}", "❌".red(), err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let token = CancelToken::new();

    let (name, job) = match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
            return Ok(());
        }
        Commands::Obj {
            cc,
            cfile,
            objdir,
            cflags,
            force,
            verbose,
        } => {
            verbose::set_verbose(verbose);
            vprintln!("⚙️  Running cmd obj: {}", cfile);
            (
                "obj",
                Job::Obj(CompileOne {
                    cc,
                    cfile,
                    objdir,
                    cflags,
                    force,
                }),
            )
        }
        Commands::Objs {
            cc,
            cfiles,
            objdir,
            cflags,
            force,
            verbose,
        } => {
            verbose::set_verbose(verbose);
            vprintln!("⚙️  Running cmd objs");
            (
                "objs",
                Job::Objs(CompileMany {
                    cc,
                    cfiles,
                    objdir,
                    cflags,
                    force,
                }),
            )
        }
        Commands::StaticLib {
            cc,
            cfiles,
            objdir,
            lib_path,
            cflags,
            force,
            verbose,
        } => {
            verbose::set_verbose(verbose);
            vprintln!("⚙️  Running cmd static-lib: {}", lib_path);
            (
                "static-lib",
                Job::StaticLib(Archive {
                    objs: CompileMany {
                        cc,
                        cfiles,
                        objdir,
                        cflags,
                        force,
                    },
                    lib_path,
                }),
            )
        }
        Commands::Exe {
            cc,
            cfiles,
            objdir,
            exe_path,
            lib_paths,
            cflags,
            ldflags,
            force,
            verbose,
        } => {
            verbose::set_verbose(verbose);
            vprintln!("⚙️  Running cmd exe: {}", exe_path);
            (
                "exe",
                Job::Exe(Link {
                    objs: CompileMany {
                        cc,
                        cfiles,
                        objdir,
                        cflags,
                        force,
                    },
                    exe_path,
                    lib_paths,
                    ldflags,
                }),
            )
        }
    };

    job.run(&token)
        .with_context(|| format!("cmd `{name}` failed"))?;
    Ok(())
}
