use clap::Parser;
use sharq_cli::{run_cli, Cli};
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Exit with the reply's code, or the error's when no reply was produced
    match run_cli(cli).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!(error = %e, "sharq failed");
            eprintln!("sharq: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
