use clap::Args;
use tessera_app::{context::AppContext, database::TenantContext};

#[derive(Debug, Args)]
pub(crate) struct InitializePermissionsArgs {
    /// Company slug
    #[arg(long)]
    slug: String,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(args: InitializePermissionsArgs) -> Result<(), String> {
    let context = AppContext::from_database_url(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let company = context
        .companies
        .get_company_by_slug(&args.slug)
        .await
        .map_err(|error| format!("failed to look up company: {error}"))?;

    let tenant = TenantContext::new(company.id, company.schema_name);

    let seeded = context
        .permissions
        .initialize(&tenant)
        .await
        .map_err(|error| format!("failed to initialize permissions: {error}"))?;

    println!("seeded_permissions: {seeded}");

    Ok(())
}
