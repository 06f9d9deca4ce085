use catalog_core::config::LoadOptions;
use catalog_db::{migrations, CatalogSeedDataset, SeedResult, VerificationResult};

use crate::commands::{load_config, with_database, CommandResult, StepFailure, EXIT_MIGRATION};

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("seed", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let seeded = with_database("seed", &config, |pool| async move {
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;

        let seed_result = CatalogSeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), EXIT_MIGRATION))?;

        // a populated catalog is left untouched, so there is nothing to verify
        if seed_result.products_seeded.is_empty() {
            return Ok::<_, StepFailure>((seed_result, None));
        }
        let verification = CatalogSeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), EXIT_MIGRATION))?;

        Ok((seed_result, Some(verification)))
    });

    match seeded {
        Ok((seed_result, verification)) => match summarize(&seed_result, verification.as_ref()) {
            Ok(message) => CommandResult::success("seed", message),
            Err(message) => {
                CommandResult::failure("seed", "seed_verification", message, EXIT_MIGRATION)
            }
        },
        Err(failure) => failure,
    }
}

fn summarize(
    seed: &SeedResult,
    verification: Option<&VerificationResult>,
) -> Result<String, String> {
    let Some(verification) = verification else {
        return Ok("catalog already populated; seed skipped".to_string());
    };
    if !verification.all_present {
        let missing = verification
            .checks
            .iter()
            .filter_map(|(name, present)| (!present).then_some(*name))
            .collect::<Vec<_>>();
        return Err(format!("demo products missing after seed: {}", missing.join(", ")));
    }

    Ok(format!(
        "seeded {} demo products: {}",
        seed.products_seeded.len(),
        seed.products_seeded.join(", ")
    ))
}
