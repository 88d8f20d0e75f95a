use clap::{Arg, ArgAction, Command};
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use tally::error::ErrorKind;
use tally::runner::{self, RunOptions};
use tracing_subscriber::EnvFilter;

// sysexits(3)
const EXIT_IO: u8 = 1;
const EXIT_DATAERR: u8 = 65;
const EXIT_SOFTWARE: u8 = 70;

fn main() -> ExitCode {
    let matches = Command::new("tally")
        .about("Interpreter for tally, a tiny integer arithmetic language")
        .arg(
            Arg::new("file")
                .help("The script file to execute")
                .value_name("FILE")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Log the token stream and the parsed tree")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("perf")
                .short('p')
                .long("perf")
                .help("Log time spent in each stage")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let options = RunOptions {
        debug: matches.get_flag("debug"),
        perf: matches.get_flag("perf"),
    };
    init_logging(&options);

    match matches.get_one::<String>("file") {
        Some(file_path) => run_file(file_path, &options),
        None => ExitCode::from(EXIT_IO),
    }
}

fn init_logging(options: &RunOptions) {
    let default_level = if options.debug {
        "debug"
    } else if options.perf {
        "info"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_file(path: &str, options: &RunOptions) -> ExitCode {
    let path = Path::new(path);

    if !path.exists() {
        eprintln!("Error: File '{}' not found", path.display());
        return ExitCode::from(EXIT_IO);
    }

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            return ExitCode::from(EXIT_IO);
        }
    };

    let filename = path.display().to_string();
    match runner::run(&source, Some(&filename), options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => match error.kind {
            ErrorKind::Lex | ErrorKind::Parse => ExitCode::from(EXIT_DATAERR),
            ErrorKind::Runtime(_) => ExitCode::from(EXIT_SOFTWARE),
        },
    }
}
