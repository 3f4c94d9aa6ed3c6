//! CLI module - Command-line interface definitions and handlers

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::backends::scan::SequenceOptions;
use crate::config::Config;
use crate::core::render::{OutputFormat, RenderConfig};
use crate::core::util::HashAlgorithm;

/// readahead - walk a page sequence through a direction-aware read-ahead cache.
#[derive(Parser, Debug)]
#[command(name = "readahead")]
#[command(
    author,
    version,
    about,
    long_about = r#"readahead keeps a moving window of pages resident around the reading
position and reports what each navigation step returned.

Each command prints a ResultSet in the selected format (default: jsonl).

Output formats:
- jsonl: one JSON object per line (best for piping into tools)
- json: a single JSON array
- md: human-friendly Markdown
- raw: one line per item (for a terminal)

Examples:
    readahead list --ext png
    readahead read --steps "next,next,to:40,prev"
    readahead --format md read --manifest pages.txt --steps "end,start"
    readahead policy
"#
)]
pub struct Cli {
    /// Root directory holding the pages.
    #[arg(
        long,
        global = true,
        default_value = ".",
        value_name = "ROOT",
        env = "READAHEAD_ROOT",
        long_help = "Root directory holding the pages (defaults to the current directory).\n\n\
Scanned identifiers are relative to this root, and relative manifest entries are\n\
resolved against it."
    )]
    pub root: PathBuf,

    /// Output format (jsonl/json/md/raw).
    #[arg(
        long,
        global = true,
        default_value = "jsonl",
        value_name = "FORMAT",
        env = "READAHEAD_FORMAT"
    )]
    pub format: String,

    /// Config file (defaults to ROOT/.readahead/config.json when present).
    #[arg(long, global = true, value_name = "FILE", env = "READAHEAD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output (when applicable).
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (errors only on stderr).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging on stderr).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the page sequence comes from
#[derive(Args, Debug, Clone, Default)]
pub struct SequenceArgs {
    /// Read identifiers from a manifest file (one per line) instead of scanning ROOT.
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Only include files with this extension (repeatable).
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Include hidden files when scanning.
    #[arg(long)]
    pub hidden: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the ordered page sequence.
    #[command(long_about = "Emit one page item per identifier, in reading order.\n\n\
Scans ROOT (natural order, so 2.png comes before 10.png) unless --manifest is given.\n\n\
Examples:\n\
  readahead list --ext png --ext jpg\n\
  readahead list --manifest volume1.txt\n")]
    List {
        #[command(flatten)]
        sequence: SequenceArgs,
    },

    /// Navigate the sequence through the cache and report each step.
    #[command(long_about = "Build a read-ahead cache over the sequence and run a navigation script.\n\n\
Steps (comma or space separated):\n\
  next | n        one page forward\n\
  prev | p        one page back\n\
  start | end     first / last page\n\
  to:N            jump to index N\n\
  +N | -N         jump N pages from the current one\n\n\
Each step emits the resulting index, identifier, byte size, content hash and the\n\
cache window (loaded / loading positions). Steps that return nothing carry an\n\
`absent` error.\n\n\
Examples:\n\
  readahead read --steps \"next,next,next\"\n\
  readahead read --steps \"to:40 prev prev +10\" --hash sha1\n")]
    Read {
        #[command(flatten)]
        sequence: SequenceArgs,

        /// Navigation script.
        #[arg(long, value_name = "STEPS")]
        steps: String,

        /// Content hash algorithm.
        #[arg(long, value_enum, default_value_t = HashAlgorithm::Xxh3)]
        hash: HashAlgorithm,
    },

    /// Show the effective window policy.
    Policy,
}

impl Cli {
    /// Install the stderr log subscriber. `RUST_LOG` wins over the flags.
    pub fn init_tracing(&self) {
        let default_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Merge CLI sequence flags over the config defaults
fn sequence_options(args: SequenceArgs, config: &Config) -> SequenceOptions {
    SequenceOptions {
        manifest: args.manifest,
        extensions: if args.extensions.is_empty() {
            config.extensions.clone()
        } else {
            args.extensions
        },
        hidden: args.hidden || config.hidden,
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let format: OutputFormat = cli.format.parse().unwrap_or_default();
    let render_config = RenderConfig::with_pretty(format, cli.pretty);

    let root = cli.root.canonicalize().unwrap_or(cli.root);
    let config = Config::load(&root, cli.config.as_deref())?;

    match cli.command {
        Commands::List { sequence } => {
            let options = sequence_options(sequence, &config);
            crate::backends::scan::run_list(&root, &options, render_config)
        }

        Commands::Read {
            sequence,
            steps,
            hash,
        } => {
            let options = sequence_options(sequence, &config);
            crate::backends::read::run_read(
                &root,
                &options,
                &steps,
                config.policy,
                hash,
                render_config,
            )
            .await
        }

        Commands::Policy => crate::config::run_policy(&config, render_config),
    }
}
