use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Port the node listens on. The node advertises itself to the
    /// replication set as 127.0.0.1:<port>.
    #[arg(long, default_value_t = 5000)]
    pub port: u16,

    /// Path to a JSON file listing every node in the replication set,
    /// e.g. {"instances": ["127.0.0.1:5000", "127.0.0.1:5001"]}.
    #[arg(long)]
    pub instances: PathBuf,
}
