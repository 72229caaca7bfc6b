// src/main.rs
mod ansible;
mod app;
mod cert;
mod config;
mod kubeconfig;
mod preflight;
mod types;
mod utils;

use clap::Parser;
use types::Args;

fn main() {
    let args = Args::parse();

    if let Err(e) = utils::logging::init(args.debug, args.log_file.as_deref()) {
        eprintln!("Failed to initialise logging: {}", e);
        std::process::exit(1);
    }

    if let Err(err) = app::run(&args) {
        tracing::error!("{:#}", err);
        std::process::exit(1);
    }
}
