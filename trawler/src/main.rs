use colored::Colorize;
use tracing::Level;
use trawler::{command_argument_builder, handle_run};
use trawler_core::print_banner;

#[tokio::main]
async fn main() {
    let matches = command_argument_builder().get_matches();

    let level = if matches.get_flag("verbose") {
        Level::DEBUG
    } else {
        Level::WARN
    };
    // stdout carries results only
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if !matches.get_flag("plain") && !matches.get_flag("json") {
        print_banner();
    }

    if let Err(e) = handle_run(&matches).await {
        eprintln!("{} {:#}", "[error]".red().bold(), e);
        std::process::exit(1);
    }
}
