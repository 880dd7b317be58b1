use clap::Parser;

use virtual_tryon::cli::{self, Args, Command};
use virtual_tryon::session::SessionExit;

fn load_env() {
    // Load .env file, don't override existing env vars
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load .env file before anything else
    load_env();
    init_logging();

    let args = Args::parse();

    let config = match cli::load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Command::Run(run_args) => {
            let mut config = config;
            run_args.apply(&mut config);
            if let Err(e) = config.validate() {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            match cli::run_session(run_args, config).await {
                Ok(SessionExit::ChannelClosed) => {
                    Err("Detection service closed the connection".into())
                }
                Ok(_) => Ok(()),
                Err(e) => Err(e),
            }
        }
        Command::Featured { api } => cli::list_featured(api, &config).await,
        Command::Item { id, api } => cli::show_item(id, api, &config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
