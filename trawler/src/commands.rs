use clap::{ArgAction, arg, value_parser};
use std::path::PathBuf;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("trawler")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("trawler")
        .about(
            "Discover URLs, subdomains, scripts and forms of a domain from robots.txt, \
            sitemap.xml, the Wayback Machine and a live crawl.",
        )
        .styles(CLAP_STYLING)
        .arg(
            arg!(-d --"domain" <DOMAIN>)
                .required(false)
                .help("The domain to trawl. Without it, domains are read from --list or stdin")
                .conflicts_with("list"),
        )
        .arg(
            arg!(-l --"list" <PATH>)
                .required(false)
                .help("Path to a newline-delimited file of domains")
                .value_parser(value_parser!(PathBuf))
                .conflicts_with("domain"),
        )
        .arg(
            arg!(--"depth" <DEPTH>)
                .required(false)
                .help("Maximum crawl depth, the start page is depth 1. 0 means unlimited")
                .value_parser(value_parser!(usize))
                .default_value("1"),
        )
        .arg(
            arg!(-s --"scope" <SCOPE>)
                .required(false)
                .help(
                    "strict: exact domain, subs: domain and its subdomains, \
                    fuzzy: hosts containing the domain, yolo: everything",
                )
                .value_parser(["strict", "subs", "fuzzy", "yolo"])
                .default_value("subs"),
        )
        .arg(
            arg!(--"scheme" <SCHEME>)
                .required(false)
                .help("Scheme used to reach each domain")
                .value_parser(["http", "https"])
                .default_value("http"),
        )
        .arg(
            arg!(-c --"cookie" <COOKIE>)
                .required(false)
                .help("Cookie header sent with every request to the target"),
        )
        .arg(
            arg!(-a --"auth" <HEADER>)
                .required(false)
                .help("Authorization header sent with every request to the target"),
        )
        .arg(
            arg!(-o --"outdir" <PATH>)
                .required(false)
                .help("Save a raw HTTP request for every discovery into this directory"),
        )
        .arg(
            arg!(-w --"usewayback")
                .required(false)
                .help("Query the Wayback Machine for archived URLs")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"linkfinder")
                .required(false)
                .help("Scan discovered JavaScript files for endpoints")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(-p --"plain")
                .required(false)
                .help("Bare URLs only: no banner, colours, tags or spinner")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"json")
                .required(false)
                .help("One JSON object per discovery")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(-t --"timeout" <SECONDS>)
                .required(false)
                .help("Request timeout in seconds")
                .value_parser(value_parser!(u64).range(1..))
                .default_value("10"),
        )
        .arg(
            arg!(--"workers" <NUM_WORKERS>)
                .required(false)
                .help("Concurrent page fetches per crawl")
                .value_parser(value_parser!(usize))
                .default_value("10"),
        )
        .arg(
            arg!(-v --"verbose")
                .required(false)
                .help("Debug logging on stderr")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"urls")
                .required(false)
                .help("Show crawled links")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"subs")
                .required(false)
                .help("Show subdomains")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"js")
                .required(false)
                .help("Show JavaScript files, and with --linkfinder their endpoints")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"forms")
                .required(false)
                .help("Show form actions")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"robots")
                .required(false)
                .help("Show robots.txt entries")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"sitemap")
                .required(false)
                .help("Show sitemap.xml entries")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"wayback")
                .required(false)
                .help("Show archived URLs (needs --usewayback)")
                .action(ArgAction::SetTrue),
        )
}
