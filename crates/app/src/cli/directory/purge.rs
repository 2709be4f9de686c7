use clap::Args;
use tessera_app::{companies::models::CompanyUuid, context::AppContext};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct PurgeDirectoryArgs {
    /// Company UUID
    #[arg(long)]
    company_id: Uuid,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(args: PurgeDirectoryArgs) -> Result<(), String> {
    let context = AppContext::from_database_url(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let purged = context
        .directory
        .purge_company_entries(CompanyUuid::from_uuid(args.company_id))
        .await
        .map_err(|error| format!("failed to purge directory entries: {error}"))?;

    println!("purged_entries: {purged}");

    Ok(())
}
