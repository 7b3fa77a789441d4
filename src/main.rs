use clap::Parser;
use qasphere_mcp::cli::{commands, Cli, Commands};
use qasphere_mcp::types::config::Config;
use qasphere_mcp::QaSphereResult;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> QaSphereResult<()> {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let config = Config::resolve(&cli.config)?;

    // CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("qasphere_mcp={}", log_level)
            .parse()
            .unwrap_or_else(|_| "qasphere_mcp=info".parse().expect("fallback directive is valid")),
    );

    // Stdout carries the protocol, so logs always go to stderr
    let registry = tracing_subscriber::registry().with(filter);
    if config.general.log_format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::debug!("Configuration loaded from: {}", cli.config.display());

    match cli.command() {
        Commands::Serve => commands::serve(&config).await?,
        Commands::Tools => commands::tools(&config)?,
        Commands::Doctor => commands::doctor(&config).await?,
        Commands::Version => commands::version(),
    }

    Ok(())
}
