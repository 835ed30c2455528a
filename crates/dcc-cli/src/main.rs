use clap::Parser;
use dcc_build::{record, Config, Invocation, RecordOutcome, WorkingDirectory};
use miette::Result;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

mod delegate;

/// Environment variable overriding the configuration file location.
const CONFIG_ENV: &str = "DCC_CONFIG";

/// Environment variable holding the log filter.
const LOG_ENV: &str = "DCC_LOG";

/// Program name, database directory and compiler. Everything after them
/// belongs to the compiler and never reaches clap.
const OWN_ARGS: usize = 3;

#[derive(Parser)]
#[command(name = "dcc")]
#[command(author, version, about = "Record compiler invocations into compile_commands.json")]
#[command(override_usage = "dcc <DATABASE_DIR> <COMPILER> [ARGS]...")]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Directory holding compile_commands.json
    database_dir: PathBuf,

    /// The real compiler to run
    compiler: OsString,
}

/// Split argv into the wrapper's own arguments and the compiler's.
fn split_argv(mut argv: Vec<OsString>) -> (Vec<OsString>, Vec<OsString>) {
    let rest = argv.split_off(argv.len().min(OWN_ARGS));
    (argv, rest)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_ENV, "warn"))
        .format_target(false)
        .init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let (own, compiler_args) = split_argv(std::env::args_os().collect());
    let cli = Cli::parse_from(own);

    // Captured before anything else; every recorded path depends on it.
    let cwd = WorkingDirectory::capture()?;
    let config = load_config(&cli.database_dir);

    match Invocation::from_os(&cli.database_dir, cli.compiler.clone(), compiler_args.clone()) {
        Ok(invocation) => record_invocation(&invocation, &cwd, &config)?,
        Err(err) => report(err),
    }

    let code = match delegate::run(&cli.compiler, &compiler_args) {
        Ok(code) => code,
        Err(err) => {
            let code = err.exit_code();
            report(err);
            code
        }
    };
    std::process::exit(code)
}

fn record_invocation(invocation: &Invocation, cwd: &WorkingDirectory, config: &Config) -> Result<()> {
    match record(invocation, cwd, config) {
        Ok(RecordOutcome::NoSources) => {}
        Ok(RecordOutcome::Recorded { files, summary }) => {
            log::debug!(
                "{} file(s): {} added, {} updated, {} skipped",
                files.len(),
                summary.added,
                summary.updated,
                summary.skipped
            );
        }
        Err(err) if err.is_directory_mismatch() && config.database.on_directory_mismatch.is_fatal() => {
            return Err(err.into());
        }
        // Bookkeeping failures never block compilation.
        Err(err) => report(err),
    }
    Ok(())
}

fn load_config(database_dir: &Path) -> Config {
    let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    match Config::load(explicit.as_deref(), database_dir) {
        Ok(config) => config,
        Err(err) => {
            report(err);
            log::warn!("using default configuration");
            Config::default()
        }
    }
}

fn report<E>(err: E)
where
    E: miette::Diagnostic + Send + Sync + 'static,
{
    eprintln!("{:?}", miette::Report::new(err));
}
