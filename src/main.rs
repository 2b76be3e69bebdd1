use clap::Parser;

use testrunner::Settings;
use testrunner::cli::commands;
use testrunner::cli::{Cli, Commands};
use testrunner::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        eprintln!("Using default configuration.");
        Settings::default()
    });

    if cli.debug {
        settings.logging.default = "debug".to_string();
    }
    logging::init_with_config(&settings.logging);

    let result = match cli.command {
        Some(Commands::Config) => commands::config::run(&settings),
        Some(Commands::Watch(args)) => {
            args.apply(&mut settings);
            commands::watch::run(settings).await.map(|reason| {
                eprintln!("{reason}");
            })
        }
        None => {
            cli.watch.apply(&mut settings);
            commands::watch::run(settings).await.map(|reason| {
                eprintln!("{reason}");
            })
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
