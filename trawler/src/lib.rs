// Include handlers and commands directly so integration tests can reach them
#[path = "commands.rs"]
pub mod commands;
#[path = "handlers.rs"]
pub mod handlers;

pub use commands::{CLAP_STYLING, command_argument_builder};
pub use handlers::{
    build_config, handle_run, load_domains_from_file, load_domains_from_reader,
    load_domains_from_source, parse_domain_line,
};
