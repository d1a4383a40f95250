//! Converts an engine scene file into standard YAML documents.

mod cli;

use cli::Cli;

fn main() -> anyhow::Result<()> {
    Cli::parse_or_exit().run()
}
