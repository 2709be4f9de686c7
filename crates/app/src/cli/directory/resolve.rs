use clap::Args;
use tessera_app::context::AppContext;

#[derive(Debug, Args)]
pub(crate) struct ResolveIdentityArgs {
    /// Email or username to resolve
    #[arg(long)]
    identity: String,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(args: ResolveIdentityArgs) -> Result<(), String> {
    let context = AppContext::from_database_url(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let entry = context
        .directory
        .resolve(&args.identity)
        .await
        .map_err(|error| format!("failed to resolve identity: {error}"))?;

    println!("email: {}", entry.email);
    println!("username: {}", entry.username);
    println!("company_id: {}", entry.company_id);
    println!("schema_name: {}", entry.schema_name);

    Ok(())
}
