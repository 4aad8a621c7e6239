//! Symphony CLI
//!
//! Batch runner and compiler for `.sym` programs: each file's name is
//! printed in green followed by the program's output, or in red with the
//! error text when compilation or execution fails.

use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{Shell, generate};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process;
use symphonyc::{ColorMode, ToolConfig};

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const RESET: &str = "\x1b[0m";

#[derive(ClapParser)]
#[command(name = "symphonyc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Symphony compiler - compile and play .sym programs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and run .sym files, printing each program's output
    Run {
        /// Input .sym source files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Lines fed to `input` calls, separated by newlines
        #[arg(long)]
        stdin: Option<String>,

        /// Persist the .note quadruple listing next to each source
        #[arg(long)]
        keep_notes: bool,

        /// When to color the filename lines
        #[arg(long, value_enum)]
        color: Option<ColorMode>,
    },

    /// Compile .sym files to .note quadruple listings without running them
    Build {
        /// Input .sym source files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            files,
            stdin,
            keep_notes,
            color,
        } => {
            run_batch(&files, stdin.as_deref(), keep_notes, color);
        }
        Commands::Build { files } => {
            run_build(&files);
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "symphonyc", &mut io::stdout());
        }
    }
}

fn load_config() -> ToolConfig {
    match ToolConfig::load(std::path::Path::new(".")) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn use_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal(),
    }
}

fn paint(text: &str, color: &str, colored: bool) -> String {
    if colored {
        format!("{}{}{}", color, text, RESET)
    } else {
        text.to_string()
    }
}

fn run_batch(
    files: &[PathBuf],
    stdin: Option<&str>,
    keep_notes_flag: bool,
    color_flag: Option<ColorMode>,
) {
    let config = load_config();
    let keep_notes = keep_notes_flag || config.keep_notes;
    let colored = use_color(color_flag.unwrap_or(config.color));

    let mut failed = false;
    for file in files {
        match symphonyc::run_file(file, stdin, keep_notes) {
            Ok((prints, _notes)) => {
                println!("{}", paint(&file.display().to_string(), GREEN, colored));
                print!("{}", prints);
            }
            Err(e) => {
                failed = true;
                println!(
                    "{}",
                    paint(&format!("ERROR in {}: {}", file.display(), e), RED, colored)
                );
            }
        }
    }
    if failed {
        process::exit(1);
    }
}

fn run_build(files: &[PathBuf]) {
    for file in files {
        match symphonyc::compile_file(file, true) {
            Ok(_) => {
                println!(
                    "Compiled {} -> {}",
                    file.display(),
                    symphonyc::note_path(file).display()
                );
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    }
}
