use clap::Parser;
use ping_processor::cli::{args::Args, commands};
use std::process;
use tracing::Level;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    init_logging(args.verbose);

    // If no subcommand was provided, show help and available commands
    let Some(command) = args.command else {
        show_help_and_commands();
        process::exit(0);
    };

    // Create the async runtime and run the selected command
    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    match runtime.block_on(commands::run(command)) {
        Ok(()) => {
            process::exit(0);
        }
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Initialize tracing with a verbosity-controlled level
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Ping Processor - FxOS Telemetry Dataset Builder");
    println!("===============================================");
    println!();
    println!("Process raw telemetry ping dumps into deduplicated, aggregated CSV");
    println!("datasets for the activation and app-usage dashboards.");
    println!();
    println!("USAGE:");
    println!("    ping-processor <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    ftu         Process FTU (first-time-use) activation pings");
    println!("    appusage    Process AU (app-usage) session pings");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Increase log verbosity");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Process an FTU dump into dump.csv and dashboard.csv:");
    println!("    ping-processor ftu --input /data/ftu --lookup-dir /data/lookup --output ./out");
    println!();
    println!("    # Process AU pings with a custom overlap tolerance:");
    println!("    ping-processor appusage --input /data/au --lookup-dir /data/lookup \\");
    println!("                            --overlap-tolerance-ms 10000");
    println!();
    println!("For detailed help on any command, use:");
    println!("    ping-processor <COMMAND> --help");
}
