use clap::Parser;

#[tokio::main]
async fn main() {
    if let Err(err) = fund_value_cli::run(fund_value_cli::args::Cli::parse()).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
