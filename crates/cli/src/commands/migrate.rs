use catalog_core::config::LoadOptions;
use catalog_db::migrations;

use crate::commands::{load_config, with_database, CommandResult, EXIT_MIGRATION};

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("migrate", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let applied = with_database("migrate", &config, |pool| async move {
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))
    });

    match applied {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err(failure) => failure,
    }
}
