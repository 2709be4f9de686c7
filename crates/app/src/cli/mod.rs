use clap::{Parser, Subcommand};

mod company;
mod db;
mod directory;
mod permissions;

#[derive(Debug, Parser)]
#[command(name = "tessera-app", about = "Tessera CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Company(company::CompanyCommand),
    Directory(directory::DirectoryCommand),
    Permissions(permissions::PermissionsCommand),
    Db(db::DbCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Company(command) => company::run(command).await,
            Commands::Directory(command) => directory::run(command).await,
            Commands::Permissions(command) => permissions::run(command).await,
            Commands::Db(command) => db::run(command).await,
        }
    }
}
