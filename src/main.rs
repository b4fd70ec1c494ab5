use clap::{Parser as ClapParser, Subcommand};
use loxvm::config::Config;
use loxvm::debug::{disassemble_chunk, TraceHook};
use loxvm::error::{InterpretError, InterpretResult, LoxError};
use loxvm::vm::{ExecutionHook, VM};
use loxvm::{compile, Chunk, Value};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

// sysexits(3)
const EX_USAGE: u8 = 64;
const EX_DATAERR: u8 = 65;
const EX_SOFTWARE: u8 = 70;
const EX_IOERR: u8 = 74;

#[derive(ClapParser)]
#[command(author, version, about = "Lox bytecode compiler and virtual machine")]
struct Cli {
    /// Print the disassembly of each compiled chunk
    #[arg(long, global = true)]
    print_code: bool,
    /// Trace the stack and every instruction while running
    #[arg(long, global = true)]
    trace: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and run a source file
    Run {
        /// Path to the source file
        path: PathBuf,
    },
    /// Start an interactive prompt (the default)
    Repl,
    /// Print the compiled bytecode of a source file
    Disassemble {
        path: PathBuf,
        /// Emit the chunk as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write the default configuration file
    Init,
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Only install a subscriber when asked to, so normal output stays clean.
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn read_source(path: &Path) -> Result<String, LoxError> {
    fs::read_to_string(path).map_err(|source| LoxError::FileNotFound {
        path: path.to_path_buf(),
        source,
    })
}

fn exit_status(err: &LoxError) -> u8 {
    match err {
        LoxError::FileNotFound { .. } | LoxError::IO(_) => EX_IOERR,
        LoxError::Interpret(err) => match err.status() {
            InterpretResult::CompileError => EX_DATAERR,
            _ => EX_SOFTWARE,
        },
        LoxError::Serialize(_) => EX_SOFTWARE,
    }
}

/// Help and version requests are not failures.
fn usage_status(err: &clap::Error) -> u8 {
    if err.use_stderr() {
        EX_USAGE
    } else {
        0
    }
}

/// Compiles and runs `source`, honoring the print/trace settings.
fn execute(source: &str, config: &Config) -> Result<Value, InterpretError> {
    let chunk = compile(source)?;
    if config.print_code {
        print!("{}", disassemble_chunk(&chunk, "code"));
    }
    if config.trace_execution {
        println!("== VM TRACE ==");
        run_chunk(VM::with_hook(TraceHook::new(io::stdout())), &chunk)
    } else {
        run_chunk(VM::new(), &chunk)
    }
}

fn run_chunk<H: ExecutionHook>(mut vm: VM<H>, chunk: &Chunk) -> Result<Value, InterpretError> {
    Ok(vm.interpret_chunk(chunk)?)
}

fn run_file(path: &Path, config: &Config) -> Result<(), LoxError> {
    let source = read_source(path)?;
    let value = execute(&source, config)?;
    println!("{}", value);
    Ok(())
}

fn run_prompt(config: &Config) -> Result<(), LoxError> {
    let stdin = io::stdin();
    let mut input = String::new();
    loop {
        print!("{}", config.prompt);
        io::stdout().flush()?;

        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            println!();
            return Ok(());
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        match execute(line, config) {
            Ok(value) => println!("{}", value),
            Err(err) => eprintln!("{}", err),
        }
    }
}

fn disassemble_file(path: &Path, json: bool) -> Result<(), LoxError> {
    let source = read_source(path)?;
    let chunk = compile(&source).map_err(InterpretError::from)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&chunk)?);
    } else {
        print!("{}", disassemble_chunk(&chunk, &path.display().to_string()));
    }
    Ok(())
}

fn manage_config(command: ConfigCommands, config: &Config) -> Result<(), LoxError> {
    match command {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ConfigCommands::Init => {
            let path = Config::get_config_path();
            if path.exists() {
                println!("Config file already exists at: {}", path.display());
            } else {
                Config::default().save()?;
                println!("Initialized new config file at: {}", path.display());
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(usage_status(&err));
        }
    };
    init_tracing();

    let mut config = Config::load();
    config.print_code |= cli.print_code;
    config.trace_execution |= cli.trace;

    let result = match cli.command.unwrap_or(Commands::Repl) {
        Commands::Run { path } => run_file(&path, &config),
        Commands::Repl => run_prompt(&config),
        Commands::Disassemble { path, json } => disassemble_file(&path, json),
        Commands::Config { command } => manage_config(command, &config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::from(exit_status(&err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loxvm::error::{RuntimeError, RuntimeErrorKind};

    #[test]
    fn unreadable_file_is_io_error() {
        let err = read_source(Path::new("/nonexistent/dir/script.lox")).unwrap_err();
        assert!(matches!(err, LoxError::FileNotFound { .. }));
        assert_eq!(exit_status(&err), EX_IOERR);

        let err = LoxError::from(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        assert_eq!(exit_status(&err), EX_IOERR);
    }

    #[test]
    fn compile_error_is_data_error() {
        let err = LoxError::from(InterpretError::from(compile("(1 + 2").unwrap_err()));
        assert_eq!(exit_status(&err), EX_DATAERR);
    }

    #[test]
    fn runtime_error_is_software_error() {
        let err = RuntimeError::new(Some(1), RuntimeErrorKind::StackUnderflow);
        let err = LoxError::from(InterpretError::from(err));
        assert_eq!(exit_status(&err), EX_SOFTWARE);
    }

    #[test]
    fn serialize_error_is_software_error() {
        let err = serde_json::from_str::<Value>("not json").unwrap_err();
        assert_eq!(exit_status(&LoxError::from(err)), EX_SOFTWARE);
    }

    #[test]
    fn bad_invocation_is_usage_error() {
        let err = Cli::try_parse_from(["lox", "--no-such-flag"]).err().unwrap();
        assert_eq!(usage_status(&err), EX_USAGE);
        let err = Cli::try_parse_from(["lox", "run"]).err().unwrap();
        assert_eq!(usage_status(&err), EX_USAGE);
        let err = Cli::try_parse_from(["lox", "--help"]).err().unwrap();
        assert_eq!(usage_status(&err), 0);
    }
}
