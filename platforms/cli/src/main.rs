use clap::Parser;
use rtm::{
    analyze, EngineConfig, Halt, Machine, MachineLibrary, MachineLoader, Notifier, RtmEngine,
    RtmError, Step, TracingNotifier, MAX_EXECUTION_STEPS,
};
use std::error::Error;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Number of cells shown per tape, unless the used part is longer.
const DISPLAY_CELLS: usize = 20;

/// A reversible Turing Machine simulator.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  rtm-cli machines/binary-complement.rtm
  rtm-cli --builtin flip --interactive
  cat machines/even-ones.rtm | rtm-cli --input 1100 --json")]
struct Cli {
    /// Path to a machine description file (.rtm).
    /// Can also pipe the description via stdin.
    program: Option<PathBuf>,

    /// Run a built-in machine instead of a file
    #[clap(short, long, conflicts_with = "program")]
    builtin: Option<String>,

    /// List the built-in machines and exit
    #[clap(short, long)]
    list: bool,

    /// The input string, replacing the one in the description
    #[clap(short, long)]
    input: Option<String>,

    /// TOML file with engine settings
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Blank symbol
    #[clap(long)]
    blank: Option<char>,

    /// Number of cells per tape
    #[clap(long)]
    capacity: Option<usize>,

    /// Maximum number of forward steps (0 for no limit)
    #[clap(long)]
    max_steps: Option<usize>,

    /// Print each step of the execution
    #[clap(short = 'd', long)]
    debug: bool,

    /// Drive the machine with next/undo/run commands
    #[clap(long)]
    interactive: bool,

    /// Print the final engine state as JSON
    #[clap(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.list {
        print_builtins();
        return Ok(());
    }

    let machine = match load_machine(&cli) {
        Ok(machine) => machine,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let config = build_config(&cli)?;
    // JSON output owns stdout, so notifications go to the log instead.
    let quiet = cli.json;
    let mut log = TracingNotifier;
    let notifier = move |msg: &str| {
        if quiet {
            log.notify(msg);
        } else {
            println!("{msg}");
        }
    };
    let mut engine = match RtmEngine::from_machine(&machine, config, notifier) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let outcome = if cli.interactive {
        run_interactive(&mut engine)?;
        Ok(None)
    } else if cli.debug {
        run_debug(&mut engine).map(Some)
    } else {
        engine.run_all().map(Some)
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&engine.view())?);
    } else if !cli.interactive {
        println!("\nFinal tapes:");
        print_tapes(&engine);
    }

    match outcome {
        Ok(Some(Halt::Accept)) => {
            if !quiet {
                println!("\nAccepted.");
            }
        }
        Ok(Some(Halt::Err(e))) => {
            if !quiet {
                println!("\nRejected: {e}");
            }
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Loads the machine from `--builtin`, a file, or stdin, and applies `--input`.
fn load_machine(cli: &Cli) -> Result<Machine, String> {
    let mut machine = if let Some(name) = &cli.builtin {
        MachineLibrary::get_by_name(name).map_err(|e| {
            format!(
                "{} (available: {})",
                e,
                MachineLibrary::names().join(", ")
            )
        })?
    } else if let Some(path) = &cli.program {
        MachineLoader::load_machine(path).map_err(|e| e.to_string())?
    } else if atty::isnt(atty::Stream::Stdin) {
        if cli.interactive {
            return Err("Interactive mode reads commands from stdin; pass the machine as a file or --builtin".to_string());
        }
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        MachineLoader::load_machine_from_string(&buffer).map_err(|e| e.to_string())?
    } else {
        return Err(
            "No machine given. Pass a file, use --builtin <name>, or pipe a description."
                .to_string(),
        );
    };

    if let Some(input) = &cli.input {
        machine.input = input.clone();
        analyze(&machine).map_err(|e| e.to_string())?;
    }

    Ok(machine)
}

/// Layers command-line flags over the configuration file, or over the defaults.
fn build_config(cli: &Cli) -> Result<EngineConfig, RtmError> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default().with_max_steps(Some(MAX_EXECUTION_STEPS)),
    };

    if let Some(blank) = cli.blank {
        config = config.with_blank(blank);
    }
    if let Some(capacity) = cli.capacity {
        config = config.with_tape_capacity(capacity);
    }
    if let Some(max_steps) = cli.max_steps {
        config = config.with_max_steps((max_steps > 0).then_some(max_steps));
    }

    config.validate()?;
    Ok(config)
}

/// Steps through Stage 1 printing the tapes after every step, then runs Stages 2 and 3.
fn run_debug<N: Notifier>(engine: &mut RtmEngine<N>) -> Result<Halt, RtmError> {
    print_tapes(engine);

    let halt = loop {
        match engine.step()? {
            Step::Continue => print_tapes(engine),
            Step::Halt(halt) => {
                print_tapes(engine);
                break halt;
            }
        }
    };

    engine.stage2()?;
    print_tapes(engine);
    engine.stage3()?;
    Ok(halt)
}

fn run_interactive<N: Notifier>(engine: &mut RtmEngine<N>) -> io::Result<()> {
    print_help();
    print_tapes(engine);

    let stdin = io::stdin();
    loop {
        print!("\n>> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let result = match line.trim().to_lowercase().as_str() {
            "next" | "n" => engine.step().map(|_| ()),
            "undo" | "u" => engine.undo(),
            "run" | "r" => engine.run_all().map(|_| ()),
            "stage1" => engine.stage1().map(|_| ()),
            "stage2" => engine.stage2(),
            "stage3" => engine.stage3(),
            "reset" => {
                engine.reset();
                Ok(())
            }
            "show" | "" => Ok(()),
            "help" | "h" => {
                print_help();
                continue;
            }
            "exit" | "quit" | "q" => break,
            other => {
                println!("Unknown command: {other}. Type 'help' for the list.");
                continue;
            }
        };

        // The engine has already reported the error through the notifier.
        if let Err(e) = result {
            tracing::debug!(error = %e, "command failed");
        } else if engine.is_halted() {
            println!(
                "Stage 1 is over ({}); 'undo' or 'reset' to step again.",
                engine.stage()
            );
        }

        print_tapes(engine);
    }

    Ok(())
}

fn print_help() {
    println!("\nAvailable commands:");
    println!("  next    - Execute the next step");
    println!("  undo    - Undo the last step");
    println!("  run     - Run stages 1, 2 and 3");
    println!("  stage1  - Run stage 1 to completion");
    println!("  stage2  - Copy the result to the output tape");
    println!("  stage3  - Reverse the recorded history");
    println!("  reset   - Reload the input and start over");
    println!("  show    - Print the tapes");
    println!("  exit    - Quit");
}

fn print_builtins() {
    println!("Built-in machines:");
    for index in 0..MachineLibrary::count() {
        if let Ok(info) = MachineLibrary::info(index) {
            println!(
                "  {:<20} states: {:<3} rules: {:<3} input: {}",
                info.name, info.state_count, info.rule_count, info.input
            );
        }
    }
}

fn print_tapes<N: Notifier>(engine: &RtmEngine<N>) {
    let blank = engine.config().blank;

    println!(
        "State: {} | Stage: {} | Steps: {}",
        engine.state(),
        engine.stage(),
        engine.step_count()
    );

    let input = engine.input_tape();
    print_tape("Input tape", input.cells(), input.head(), input.used().len(), |c| {
        c.to_string()
    });

    let history = engine.history_tape();
    print_tape(
        "History tape",
        history.cells(),
        history.head(),
        history.used().len(),
        |cell| cell.render(blank),
    );

    let output = engine.output_tape();
    print_tape(
        "Output tape",
        output.cells(),
        output.head(),
        output.used().len(),
        |c| c.to_string(),
    );
}

/// Prints the leading cells of a tape with a `^` under the head.
fn print_tape<T>(name: &str, cells: &[T], head: usize, used: usize, render: impl Fn(&T) -> String) {
    let width = DISPLAY_CELLS.max(used).max(head + 1).min(cells.len());

    let mut line = String::new();
    let mut marker = String::new();
    for (i, cell) in cells.iter().take(width).enumerate() {
        let text = render(cell);
        let cell_width = text.chars().count();
        if i > 0 {
            line.push(' ');
            marker.push(' ');
        }
        line.push_str(&text);
        let pointer = if i == head { "^" } else { "" };
        marker.push_str(&format!("{:<cell_width$}", pointer));
    }

    println!("{:<14}: {}", name, line);
    println!("{:<14}  {}", "", marker.trim_end());
}
