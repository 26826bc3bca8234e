//! Doctor command handler
//!
//! Handles `inox doctor`: checks the tool, configuration files and caches.

use anyhow::Result;
use colored::*;

use crate::context::AppContext;
use crate::settings::SETTINGS_FILE;
use crate::sketch;

/// Run the `inox doctor` command to diagnose setup issues
pub fn run_doctor(ctx: &AppContext) -> Result<()> {
    println!("{} Running doctor...", "🚑".red());
    println!("-------------------------------");

    print!("Checking OS... ");
    println!(
        "{} ({})",
        std::env::consts::OS.green(),
        std::env::consts::ARCH.cyan()
    );

    print!("Checking arduino-cli... ");
    match ctx.cli.version() {
        Ok(version) => println!("{} {}", "Found".green(), version.dimmed()),
        Err(e) => {
            println!("{}", "Not Found".red());
            println!("  {}", e);
            #[cfg(windows)]
            println!("  Install with: {}", "winget install Arduino.Arduino-CLI".yellow());
            #[cfg(not(windows))]
            println!("  Install with: {}", "brew install arduino-cli".yellow());
        }
    }

    print!("Checking settings... ");
    let settings_path = ctx.home.join(SETTINGS_FILE);
    if settings_path.exists() {
        println!("{} {}", "Found".green(), settings_path.display());
    } else {
        println!("{} ({})", "Defaults".yellow(), settings_path.display());
    }

    print!("Checking project file... ");
    if ctx.config.exists() {
        println!("{} {}", "Found".green(), ctx.config.path().display());
    } else {
        println!("{}", "Not created yet (Optional)".yellow());
    }

    print!("Checking sketch... ");
    match sketch::find_sketch(&ctx.project_dir) {
        Ok(path) => println!("{} {}", "Found".green(), path.display()),
        Err(_) => println!("{}", "No .ino file in project".red()),
    }

    print!("Checking port... ");
    match &ctx.config.port {
        Some(port) => println!("{}", port.green()),
        None => println!("{}", "Not selected (run `inox port`)".yellow()),
    }

    println!("Boards cache: {}", ctx.boards_cache().status());
    println!("Libraries cache: {}", ctx.libraries_cache().status());

    Ok(())
}
