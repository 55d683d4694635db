use std::io::{Cursor, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;
use trawler::handlers::*;
use trawler::command_argument_builder;
use trawler_core::{Category, JobError};
use trawler_scanner::{Scheme, ScopePolicy};

fn matches(args: &[&str]) -> clap::ArgMatches {
    let mut argv = vec!["trawler"];
    argv.extend_from_slice(args);
    command_argument_builder()
        .try_get_matches_from(argv)
        .expect("arguments should parse")
}

#[test]
fn test_parse_domain_line_trims_and_lowercases() {
    assert_eq!(parse_domain_line("  Example.COM \t"), "example.com");
}

#[test]
fn test_parse_domain_line_reduces_urls() {
    assert_eq!(parse_domain_line("https://Example.com/some/path"), "example.com");
    assert_eq!(parse_domain_line("http://example.com:8080/"), "example.com:8080");
}

#[test]
fn test_parse_domain_line_keeps_port() {
    assert_eq!(parse_domain_line("localhost:3000"), "localhost:3000");
}

#[test]
fn test_load_domains_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "example.com")?;
    writeln!(temp_file, "API.Example.org")?;
    writeln!(temp_file, "https://shop.example.net/")?;

    let path = PathBuf::from(temp_file.path());
    let domains = load_domains_from_file(&path)?;

    assert_eq!(
        domains,
        vec!["example.com", "api.example.org", "shop.example.net"]
    );
    Ok(())
}

#[test]
fn test_blank_line_is_kept_as_empty_domain() {
    let input = Cursor::new("example.com\n\nexample.org\n");
    let domains = load_domains_from_reader(input).unwrap();
    assert_eq!(domains, vec!["example.com", "", "example.org"]);
}

#[test]
fn test_empty_input_is_missing_domain() {
    let result = load_domains_from_reader(Cursor::new(""));
    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<JobError>(),
        Some(JobError::MissingDomain)
    ));
}

#[test]
fn test_missing_list_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.txt");
    let err = load_domains_from_file(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to read domain list"));
}

#[test]
fn test_domain_flag_wins_over_list() {
    let domain = "Example.com".to_string();
    let domains = load_domains_from_source(Some(&domain), None).unwrap();
    assert_eq!(domains, vec!["example.com"]);
}

#[test]
fn test_defaults() {
    let config = build_config(&matches(&["-d", "example.com"])).unwrap();
    assert_eq!(config.depth, 1);
    assert_eq!(config.scope, ScopePolicy::Subs);
    assert_eq!(config.scheme, Scheme::Http);
    assert_eq!(config.timeout_secs, 10);
    assert_eq!(config.workers, 10);
    assert!(!config.use_archive);
    assert!(!config.run_linkfinder);
    assert!(config.cookie.is_none());
    assert!(config.auth.is_none());
    assert!(config.output.outdir.is_none());
    for category in Category::ALL {
        assert!(config.categories.contains(category));
    }
}

#[test]
fn test_flags_map_onto_config() {
    let config = build_config(&matches(&[
        "-d",
        "example.com",
        "--depth",
        "3",
        "--scope",
        "strict",
        "--scheme",
        "https",
        "--cookie",
        "session=1",
        "--auth",
        "Bearer t",
        "--usewayback",
        "--linkfinder",
        "--json",
        "--timeout",
        "4",
        "--workers",
        "2",
    ]))
    .unwrap();

    assert_eq!(config.depth, 3);
    assert_eq!(config.scope, ScopePolicy::Strict);
    assert_eq!(config.scheme, Scheme::Https);
    assert_eq!(config.cookie.as_deref(), Some("session=1"));
    assert_eq!(config.auth.as_deref(), Some("Bearer t"));
    assert!(config.use_archive);
    assert!(config.run_linkfinder);
    assert!(config.output.json);
    assert!(!is_interactive(&config));
    assert_eq!(config.timeout_secs, 4);
    assert_eq!(config.workers, 2);
}

#[test]
fn test_category_flags_narrow_selection() {
    let args = matches(&["-d", "example.com", "--robots", "--js"]);
    assert_eq!(
        selected_categories(&args),
        vec![Category::JsFile, Category::Robots]
    );

    let config = build_config(&args).unwrap();
    assert!(config.categories.contains(Category::Robots));
    assert!(config.categories.contains(Category::JsFile));
    assert!(config.categories.contains(Category::LinkFinder));
    assert!(!config.categories.contains(Category::Url));
    assert!(!config.categories.contains(Category::Archive));
}

#[test]
fn test_outdir_tilde_is_expanded() {
    let config = build_config(&matches(&["-d", "example.com", "--outdir", "~/trawl"])).unwrap();
    let outdir = config.output.outdir.unwrap();
    assert!(!outdir.to_string_lossy().starts_with('~'));
    assert!(outdir.ends_with("trawl"));
}

#[test]
fn test_unknown_scope_is_rejected() {
    let result = command_argument_builder().try_get_matches_from([
        "trawler", "-d", "example.com", "--scope", "everything",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_domain_conflicts_with_list() {
    let result = command_argument_builder().try_get_matches_from([
        "trawler", "-d", "example.com", "--list", "domains.txt",
    ]);
    assert!(result.is_err());
}
