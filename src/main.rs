//! # inox CLI Entry Point
//!
//! Parses arguments with clap and routes each subcommand to its handler.
//!
//! ## Command Structure
//!
//! - **Build**: `compile`, `upload`, `monitor`
//! - **Target**: `board`, `port`, `baud`, `status`
//! - **Libraries**: `lib`
//! - **Maintenance**: `cache`, `doctor`, `completion`

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;

use inox::commands;
use inox::commands::baud::BaudOp;
use inox::commands::board::BoardOp;
use inox::commands::cache::CacheOp;
use inox::commands::library::LibOp;
use inox::commands::port::PortOp;
use inox::context::AppContext;
use inox::logging;
use inox::ui;

#[derive(Parser)]
#[command(name = "inox")]
#[command(about = "Compile, upload and monitor Arduino sketches via arduino-cli", version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Project directory containing the sketch and arduino.json
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    /// Path to the arduino-cli executable
    #[arg(long, global = true, env = "INOX_CLI_PATH")]
    cli_path: Option<PathBuf>,

    /// Show tool output in detail and enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the sketch for the selected board
    Compile,
    /// Compile, then upload the sketch to the board
    Upload {
        /// Serial port (e.g., COM3, /dev/ttyUSB0); defaults to the selected port
        #[arg(short, long)]
        port: Option<String>,
    },
    /// Open the serial monitor
    Monitor {
        /// Serial port; defaults to the selected port
        #[arg(short, long)]
        port: Option<String>,
        /// Baud rate; defaults to the selected rate
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        baud: Option<u32>,
    },
    /// Show the current board, port, baud rate and caches
    Status,
    /// Select or list boards
    Board {
        #[command(subcommand)]
        op: Option<BoardOp>,
    },
    /// Select or list serial ports
    Port {
        #[command(subcommand)]
        op: Option<PortOp>,
    },
    /// Select the serial monitor baud rate
    Baud {
        #[command(subcommand)]
        op: Option<BaudOp>,
    },
    /// Browse and manage libraries
    Lib {
        #[command(subcommand)]
        op: Option<LibOp>,
    },
    /// Manage the board/library listing caches
    Cache {
        #[command(subcommand)]
        op: CacheOp,
    },
    /// Diagnose the arduino-cli setup
    Doctor,
    /// Generate shell completion scripts
    Completion { shell: Shell },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "x".red(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        print_splash();
        return Ok(());
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        return Ok(());
    }

    let mut ctx = AppContext::load(&cli.project, cli.cli_path)?;

    match command {
        Commands::Compile => commands::build::compile(&ctx, cli.verbose),
        Commands::Upload { port } => commands::build::upload(&ctx, port.as_deref(), cli.verbose),
        Commands::Monitor { port, baud } => commands::monitor::open(&ctx, port.as_deref(), baud),
        Commands::Status => commands::status::show(&ctx),
        Commands::Board { op } => commands::board::handle(&mut ctx, op),
        Commands::Port { op } => commands::port::handle(&mut ctx, op),
        Commands::Baud { op } => commands::baud::handle(&mut ctx, op),
        Commands::Lib { op } => commands::library::handle(&ctx, op),
        Commands::Cache { op } => commands::cache::handle(&ctx, op),
        Commands::Doctor => commands::doctor::run_doctor(&ctx),
        Commands::Completion { .. } => Ok(()),
    }
}

fn print_splash() {
    println!();
    println!("   {}", "inox".cyan().bold());
    println!(
        "   {}",
        "arduino-cli, without the clicking".dimmed().italic()
    );
    println!("   {}", format!("v{}", env!("CARGO_PKG_VERSION")).green());
    println!();

    let mut table = ui::Table::new(&["Category", "Commands"]);
    table.add_row(vec![
        "Build".bold().yellow().to_string(),
        format!(
            "{}, {}, {}",
            "compile".cyan(),
            "upload".cyan(),
            "monitor".cyan()
        ),
    ]);
    table.add_row(vec![
        "Target".bold().green().to_string(),
        format!(
            "{}, {}, {}, {}",
            "board".cyan(),
            "port".cyan(),
            "baud".cyan(),
            "status".cyan()
        ),
    ]);
    table.add_row(vec!["Libraries".bold().blue().to_string(), "lib".cyan().to_string()]);
    table.add_row(vec![
        "Tools".bold().magenta().to_string(),
        format!(
            "{}, {}, {}",
            "cache".cyan(),
            "doctor".cyan(),
            "completion".cyan()
        ),
    ]);
    table.print();
    println!();
    println!("   Run {} for detailed usage.", "inox --help".white().bold());
    println!();
}
