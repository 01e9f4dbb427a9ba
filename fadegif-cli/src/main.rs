use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod make;
mod server;

#[derive(Parser, Debug)]
#[command(
    name = "fadegif",
    version,
    about = "Cross-fade still images into a looping GIF"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a GIF from image files.
    Make(make::MakeArgs),
    /// Serve GIF generation over HTTP.
    Serve(server::ServeArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    match cli.cmd {
        Command::Make(args) => make::cmd_make(args),
        Command::Serve(args) => server::cmd_serve(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
