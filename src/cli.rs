mod terminal;

use std::{path::PathBuf, process};

use anyhow::Context;
use clap::{Parser, error::ErrorKind};
use sceneconv::{Config, Content, DocumentNode, Scene};
use tracing::{instrument, level_filters::LevelFilter};

use terminal::Colorize;

/// Printed to stdout when the argument count is wrong.
const USAGE: &str = "sceneconv <inputfile>";

/// Exit status for a usage error.
const USAGE_EXIT_CODE: i32 = 2;

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// The scene file to convert
    input: PathBuf,
}

impl Cli {
    /// Parses the process arguments.
    ///
    /// Any argument error prints the usage line and exits with status 2
    /// without touching the filesystem. Help and version requests are
    /// handled by clap.
    pub fn parse_or_exit() -> Self {
        match Self::try_parse() {
            Ok(cli) => cli,
            Err(error)
                if matches!(
                    error.kind(),
                    ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
                ) =>
            {
                error.exit()
            }
            Err(_) => {
                println!("{USAGE}");
                process::exit(USAGE_EXIT_CODE);
            }
        }
    }

    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging();
        self.convert(&Config::default())
    }

    #[instrument(level = "debug", skip(self, config), fields(input = %self.input.display()))]
    fn convert(&self, config: &Config) -> anyhow::Result<()> {
        println!("Importing scene from {}", self.input.display());

        let scene = Scene::open(&self.input, config)
            .with_context(|| format!("failed to import {}", self.input.display()))?;

        for count in 0..scene.stream().separators().len() {
            println!("GameObject {count}");
        }

        let mut composed = 0;
        for document in scene.documents() {
            let document =
                document.with_context(|| format!("failed to parse {}", self.input.display()))?;
            print_document(&document)?;
            composed += 1;
        }

        println!("{}", format!("Composed {composed} document(s)").success());
        Ok(())
    }

    /// `RUST_LOG` when set, otherwise warnings only.
    fn log_filter() -> tracing_subscriber::EnvFilter {
        tracing_subscriber::EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .from_env_lossy()
    }

    fn setup_logging() {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        // stdout carries the converted documents
        let filter = Self::log_filter();

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

fn print_document(document: &DocumentNode) -> anyhow::Result<()> {
    let mut header = format!("--- [{}]", document.index());
    if let Some(class) = document.class() {
        header.push(' ');
        header.push_str(class);
    }
    if let Some(id) = document.instance_id() {
        header.push_str(" &");
        header.push_str(id);
    }
    println!("{}", header.info());

    match document.content() {
        Content::Placeholder => println!("{}", "~ placeholder".dim()),
        Content::Yaml(value) => {
            let dump = serde_yaml::to_string(value)
                .with_context(|| format!("failed to print document {}", document.index()))?;
            print!("{dump}");
        }
    }
    Ok(())
}
