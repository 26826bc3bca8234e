//! `inox monitor`: serial monitor in the current terminal.

use anyhow::{Context, Result, bail};
use colored::*;

use crate::context::AppContext;

/// Build the `monitor` argument list.
pub fn monitor_args(port: &str, baudrate: u32) -> Vec<String> {
    vec![
        "monitor".to_string(),
        "-p".to_string(),
        port.to_string(),
        "--config".to_string(),
        format!("baudrate={}", baudrate),
    ]
}

pub fn open(ctx: &AppContext, port: Option<&str>, baudrate: Option<u32>) -> Result<()> {
    let Some(port) = port
        .map(str::to_string)
        .or_else(|| ctx.config.port.clone())
    else {
        bail!("No port selected. Run `inox port` to pick one or pass --port.");
    };
    let baudrate = baudrate.unwrap_or(ctx.config.baudrate);
    if baudrate == 0 {
        bail!("Baud rate must be a positive integer");
    }

    println!(
        "{} Serial monitor on {} @ {} baud ({} to exit)",
        "📟".cyan(),
        port.cyan(),
        baudrate.to_string().yellow(),
        "Ctrl+C".bold()
    );

    let args = monitor_args(&port, baudrate);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    ctx.cli
        .run_attached(&args)
        .context("Serial monitor exited with an error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_args() {
        assert_eq!(
            monitor_args("/dev/ttyACM0", 115200),
            vec!["monitor", "-p", "/dev/ttyACM0", "--config", "baudrate=115200"]
        );
    }
}
