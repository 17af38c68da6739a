use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = credgate::cli::Cli::parse();
    if let Err(e) = credgate::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
