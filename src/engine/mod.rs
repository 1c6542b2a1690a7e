//! Engine: probing, traversal, output and the CLI front end

pub mod arg_parser;
pub mod cli;
pub mod probe;
pub mod progress;
pub mod sink;
pub mod tools;
pub mod traverse;

pub use arg_parser::Cli;
pub use cli::handle_run;
pub use probe::MetadataProbe;
pub use sink::RecordSink;
pub use tools::resolve_logical_path;
pub use traverse::{TraversalEngine, check_root};
