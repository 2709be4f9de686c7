use clap::Args;
use tessera_app::context::AppContext;

#[derive(Debug, Args)]
pub(crate) struct ListCompaniesArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(args: ListCompaniesArgs) -> Result<(), String> {
    let context = AppContext::from_database_url(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let companies = context
        .companies
        .list_active_companies()
        .await
        .map_err(|error| format!("failed to list companies: {error}"))?;

    for company in companies {
        println!(
            "{}\t{}\t{}\t{}",
            company.id, company.slug, company.schema_name, company.name
        );
    }

    Ok(())
}
