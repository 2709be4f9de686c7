use clap::{Args, Subcommand};

mod create;
mod drop_schema;
mod list;

#[derive(Debug, Args)]
pub(crate) struct CompanyCommand {
    #[command(subcommand)]
    command: CompanySubcommand,
}

#[derive(Debug, Subcommand)]
enum CompanySubcommand {
    Create(create::CreateCompanyArgs),
    List(list::ListCompaniesArgs),
    DropSchema(drop_schema::DropSchemaArgs),
}

pub(crate) async fn run(command: CompanyCommand) -> Result<(), String> {
    match command.command {
        CompanySubcommand::Create(args) => create::run(args).await,
        CompanySubcommand::List(args) => list::run(args).await,
        CompanySubcommand::DropSchema(args) => drop_schema::run(args).await,
    }
}
