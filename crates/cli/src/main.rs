// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use wmonkey_cli::config::Config;

#[tokio::main]
async fn main() {
    let config = <Config as clap::Parser>::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    match wmonkey_cli::run::run(config).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            wmonkey_cli::run::log_fatal(&e);
            std::process::exit(1);
        }
    }
}
