use clap::Args;
use tessera_app::{companies::models::CompanyUuid, context::AppContext};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct DropSchemaArgs {
    /// Company UUID
    #[arg(long)]
    company_id: Uuid,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Required acknowledgement; the drop is irreversible
    #[arg(long)]
    confirm: bool,
}

pub(crate) async fn run(args: DropSchemaArgs) -> Result<(), String> {
    let context = AppContext::from_database_url(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    context
        .provisioning
        .drop_schema(CompanyUuid::from_uuid(args.company_id), args.confirm)
        .await
        .map_err(|error| format!("failed to drop schema: {error}"))?;

    println!("dropped schema for company {}", args.company_id);

    Ok(())
}
