//! Thin command-line front end over the `krait` library crate.

use std::{fs, path::PathBuf, process::ExitCode};

use clap::Parser;
use log::debug;

/// Run a script written in the Python-subset language.
#[derive(Parser)]
#[command(name = "krait", version, about)]
struct Cli {
    /// Script file to execute.
    file: Option<PathBuf>,

    /// Program passed in as a string.
    #[arg(short = 'c', long = "command", conflicts_with = "file")]
    command: Option<String>,

    /// Enable top-level `await`.
    #[arg(long = "async")]
    async_mode: bool,

    /// Print the value of the final expression statement.
    #[arg(short, long)]
    print_result: bool,

    /// Verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    if let Err(err) = simple_logger::SimpleLogger::new().with_level(level).init() {
        eprintln!("failed to initialize logging: {err}");
    }

    let source = match (&cli.file, &cli.command) {
        (Some(path), None) => match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("krait: cannot read {}: {err}", path.display());
                return ExitCode::from(2);
            }
        },
        (None, Some(command)) => command.clone(),
        _ => {
            eprintln!("krait: provide a script file or -c '<code>'");
            return ExitCode::from(2);
        }
    };

    debug!("executing {} bytes of source", source.len());
    let mut interpreter = krait::Interpreter::new();
    let result = if cli.async_mode {
        futures_block_on(interpreter.run_async(&source))
    } else {
        interpreter.run(&source)
    };

    match result {
        Ok(value) => {
            if cli.print_result && value != krait::Object::None {
                println!("{value:?}");
            }
            ExitCode::SUCCESS
        }
        Err(exc) => {
            match exc.location() {
                Some(loc) => eprintln!("{exc} ({loc})"),
                None => eprintln!("{exc}"),
            }
            ExitCode::FAILURE
        }
    }
}

/// Minimal executor for the `run_async` future, which never actually
/// suspends: everything inside the sandbox resolves eagerly.
fn futures_block_on<F: Future>(future: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn noop_raw_waker() -> RawWaker {
        fn clone(_: *const ()) -> RawWaker {
            noop_raw_waker()
        }
        fn noop(_: *const ()) {}
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    // SAFETY: the vtable functions are all no-ops over a null pointer.
    let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
    let mut context = Context::from_waker(&waker);
    let mut future = std::pin::pin!(future);
    loop {
        match future.as_mut().poll(&mut context) {
            Poll::Ready(output) => return output,
            Poll::Pending => std::thread::yield_now(),
        }
    }
}
