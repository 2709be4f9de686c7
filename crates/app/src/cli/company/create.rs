use clap::Args;
use tessera_app::{
    companies::models::NewCompany,
    context::AppContext,
    provisioning::models::NewAdminUser,
    users::credentials,
};

#[derive(Debug, Args)]
pub(crate) struct CreateCompanyArgs {
    /// Company display name
    #[arg(long)]
    name: String,

    /// Optional slug; derived from the name when omitted
    #[arg(long)]
    slug: Option<String>,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Email of the initial admin user
    #[arg(long)]
    admin_email: String,

    /// Username of the initial admin user
    #[arg(long)]
    admin_username: String,

    /// Password of the initial admin user
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: String,
}

pub(crate) async fn run(args: CreateCompanyArgs) -> Result<(), String> {
    if args.admin_password.trim().is_empty() {
        return Err("admin password cannot be empty".to_string());
    }

    let context = AppContext::from_database_url(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let password_hash = credentials::hash_password(&args.admin_password)
        .map_err(|error| format!("failed to hash admin password: {error}"))?;

    let provisioned = context
        .provisioning
        .provision(
            NewCompany {
                name: args.name,
                slug: args.slug,
                ..NewCompany::default()
            },
            NewAdminUser {
                email: args.admin_email,
                username: args.admin_username,
                password_hash,
            },
        )
        .await
        .map_err(|error| format!("failed to provision company: {error}"))?;

    println!("company_id: {}", provisioned.company.id);
    println!("company_slug: {}", provisioned.company.slug);
    println!("schema_name: {}", provisioned.company.schema_name);
    println!("admin_user_id: {}", provisioned.admin_user.id);
    println!("seeded_permissions: {}", provisioned.seeded_permissions);

    Ok(())
}
