use clap::Args;
use tessera_app::database;

#[derive(Debug, Args)]
pub(crate) struct InitArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

/// Create the shared-scope tables if they are missing. Idempotent.
pub(crate) async fn run(args: InitArgs) -> Result<(), String> {
    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    database::ensure_shared_tables(&pool)
        .await
        .map_err(|error| format!("failed to create shared tables: {error}"))?;

    println!("shared tables ready");

    Ok(())
}
