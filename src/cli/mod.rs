//! CLI module for keygate
//!
//! - `serve`: run the HTTP server behind the gatekeeper
//! - `check-config`: load configuration and print the effective bypass rules
//! - `generate-secret`: print a fresh secret and its stored form

pub mod check_config;
pub mod generate_secret;
pub mod serve;

use clap::{Parser, Subcommand};

/// keygate - API key gatekeeper with zero-downtime rotation
#[derive(Parser)]
#[command(name = "keygate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the server
    Serve,

    /// Validate configuration and print the effective gatekeeper settings
    CheckConfig,

    /// Generate a secret and print it with its stored digest
    GenerateSecret(generate_secret::GenerateSecretArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from(["keygate", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve));

        let cli = Cli::try_parse_from(["keygate", "check-config"]).unwrap();
        assert!(matches!(cli.command, Command::CheckConfig));

        let cli = Cli::try_parse_from(["keygate", "generate-secret", "--count", "3"]).unwrap();
        match cli.command {
            Command::GenerateSecret(args) => assert_eq!(args.count, 3),
            _ => panic!("expected generate-secret"),
        }
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(Cli::try_parse_from(["keygate", "ui"]).is_err());
    }
}
