use clap::{Args, Subcommand};

mod init;

#[derive(Debug, Args)]
pub(crate) struct DbCommand {
    #[command(subcommand)]
    command: DbSubcommand,
}

#[derive(Debug, Subcommand)]
enum DbSubcommand {
    Init(init::InitArgs),
}

pub(crate) async fn run(command: DbCommand) -> Result<(), String> {
    match command.command {
        DbSubcommand::Init(args) => init::run(args).await,
    }
}
