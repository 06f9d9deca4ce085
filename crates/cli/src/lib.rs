pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use catalog_core::config::{ConfigOverrides, LoadOptions};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "catalog",
    about = "Product catalog operator CLI",
    long_about = "Apply catalog migrations, load demo products, and inspect effective configuration.",
    after_help = "Examples:\n  catalog migrate\n  catalog --config prod.toml seed\n  catalog config"
)]
pub struct Cli {
    #[arg(long, global = true, value_name = "PATH", help = "Config file that must exist")]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "URL", help = "Override database.url")]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides { database_url: self.database_url.clone() },
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo product set into an empty catalog and verify it")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(&options),
        Command::Seed => commands::seed::run(&options),
        Command::Config => commands::config::run(&options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn parses_each_subcommand() {
        for (arg, expected) in [("migrate", "Migrate"), ("seed", "Seed"), ("config", "Config")] {
            let cli = Cli::try_parse_from(["catalog", arg]).expect("subcommand parses");
            assert_eq!(format!("{:?}", cli.command), expected);
        }
    }

    #[test]
    fn explicit_config_path_is_required_to_exist() {
        let cli = Cli::try_parse_from(["catalog", "migrate", "--config", "prod.toml"])
            .expect("global flag after subcommand");
        let options = cli.load_options();

        assert_eq!(options.config_path.as_deref(), Some(std::path::Path::new("prod.toml")));
        assert!(options.require_file);
        let implicit = Cli::try_parse_from(["catalog", "seed"]).expect("parse");
        assert!(!implicit.load_options().require_file);
    }

    #[test]
    fn database_url_flag_becomes_an_override() {
        let cli = Cli::try_parse_from(["catalog", "--database-url", "sqlite::memory:", "config"])
            .expect("parse");

        assert_eq!(cli.load_options().overrides.database_url.as_deref(), Some("sqlite::memory:"));
    }

    #[test]
    fn rejects_unknown_subcommands() {
        assert!(Cli::try_parse_from(["catalog", "doctor"]).is_err());
        assert!(matches!(
            Cli::try_parse_from(["catalog", "seed"]).map(|cli| cli.command),
            Ok(Command::Seed)
        ));
    }
}
