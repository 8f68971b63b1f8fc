mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mdag_core::{Algorithm, DagBuilder, DagResolver, FileStore, Hash, StoreConfig, load_path};
use output::{AddOutput, AddedObject, InitOutput, LinkInfo, LsOutput, OutputWriter, StatOutput};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// mdag - A content-addressed Merkle DAG store
#[derive(Parser)]
#[command(name = "mdag")]
#[command(about = "Content-addressed Merkle DAG over files and directories", long_about = None)]
#[command(version)]
struct Cli {
    /// Store root directory (defaults to MDAG_ROOT env var or ./mdag-store)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum AlgoArg {
    Blake3,
    Sha256,
}

impl From<AlgoArg> for Algorithm {
    fn from(arg: AlgoArg) -> Self {
        match arg {
            AlgoArg::Blake3 => Algorithm::Blake3,
            AlgoArg::Sha256 => Algorithm::Sha256,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new store
    Init {
        /// Hash algorithm to use
        #[arg(long, value_enum, default_value = "blake3")]
        algo: AlgoArg,

        /// Largest file stored as a single blob, in bytes
        #[arg(long, default_value_t = mdag_core::DEFAULT_CHUNK_THRESHOLD)]
        chunk_threshold: usize,
    },

    /// Add files or directories to the store
    Add {
        /// Paths to add
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Write the file at a path under a root hash to stdout
    Cat {
        /// Root hash
        hash: String,

        /// Slash-delimited path below the root
        #[arg(default_value = "")]
        path: String,
    },

    /// List the links of the object at a path
    Ls {
        /// Root hash
        hash: String,

        /// Slash-delimited path below the root
        #[arg(default_value = "")]
        path: String,
    },

    /// Show object metadata
    Stat {
        /// Root hash
        hash: String,

        /// Slash-delimited path below the root
        #[arg(default_value = "")]
        path: String,
    },
}

fn main() {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let output = OutputWriter::new(cli.json);

    // Determine store root: CLI arg > MDAG_ROOT env var > ./mdag-store default
    let root = cli
        .root
        .or_else(|| std::env::var("MDAG_ROOT").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./mdag-store"));

    let result = match cli.command {
        Commands::Init {
            algo,
            chunk_threshold,
        } => cmd_init(&root, algo.into(), chunk_threshold, &output),
        Commands::Add { paths } => cmd_add(&root, &paths, &output),
        Commands::Cat { hash, path } => cmd_cat(&root, &hash, &path),
        Commands::Ls { hash, path } => cmd_ls(&root, &hash, &path, &output),
        Commands::Stat { hash, path } => cmd_stat(&root, &hash, &path, &output),
    };

    if let Err(e) = result {
        output.write_error(&e, 1);
        std::process::exit(1);
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the `-v` level.
fn setup_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open_store(root: &Path) -> Result<FileStore> {
    FileStore::open(root).with_context(|| format!("Failed to open store at {}", root.display()))
}

fn parse_hash(hash_str: &str) -> Result<Hash> {
    Hash::from_hex(hash_str).with_context(|| format!("Invalid hash: {}", hash_str))
}

fn cmd_init(
    root: &Path,
    algorithm: Algorithm,
    chunk_threshold: usize,
    output: &OutputWriter,
) -> Result<()> {
    let config = StoreConfig::new(algorithm, chunk_threshold)
        .with_context(|| format!("Invalid chunk threshold: {}", chunk_threshold))?;

    FileStore::init(root, config)
        .with_context(|| format!("Failed to initialize store at {}", root.display()))?;
    info!(root = %root.display(), algo = algorithm.as_str(), "initialized store");

    let data = InitOutput {
        success: true,
        result_code: 0,
        root: root.display().to_string(),
        algorithm: algorithm.as_str().to_string(),
        chunk_threshold,
    };

    output.write(&data, || {
        format!(
            "Initialized mdag store at {}\nAlgorithm: {}\nChunk threshold: {} bytes\n",
            root.display(),
            algorithm.as_str(),
            chunk_threshold
        )
    })
}

fn cmd_add(root: &Path, paths: &[PathBuf], output: &OutputWriter) -> Result<()> {
    let store = open_store(root)?;
    let config = *store.config();
    let builder = DagBuilder::new(&store, &config.algorithm).with_chunker(config.chunker);

    let mut objects = Vec::with_capacity(paths.len());
    for path in paths {
        let node =
            load_path(path).with_context(|| format!("Failed to read path: {}", path.display()))?;
        let hash = builder
            .build(&node)
            .with_context(|| format!("Failed to add path: {}", path.display()))?;

        objects.push(AddedObject {
            hash,
            path: path.display().to_string(),
            size: node.size(),
        });
    }

    let data = AddOutput {
        success: true,
        result_code: 0,
        objects,
    };

    output.write(&data, || {
        data.objects
            .iter()
            .map(|o| format!("{} {}\n", o.hash, o.path))
            .collect()
    })
}

fn cmd_cat(root: &Path, hash_str: &str, path: &str) -> Result<()> {
    let store = open_store(root)?;
    let hash = parse_hash(hash_str)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    DagResolver::new(&store)
        .resolve_to_writer(&hash, path, &mut handle)
        .with_context(|| format!("Failed to resolve {}:{}", hash, path))?;
    handle.flush().context("Failed to write to stdout")?;

    Ok(())
}

fn cmd_ls(root: &Path, hash_str: &str, path: &str, output: &OutputWriter) -> Result<()> {
    let store = open_store(root)?;
    let hash = parse_hash(hash_str)?;

    let resolver = DagResolver::new(&store);
    let (target, object) = resolver
        .lookup(&hash, path)
        .with_context(|| format!("Failed to resolve {}:{}", hash, path))?;

    let mut links = Vec::with_capacity(object.links().len());
    for link in object.links() {
        let child = resolver
            .fetch(&link.hash())
            .with_context(|| format!("Failed to read object {}", link.hash()))?;
        links.push(LinkInfo::new(link, child.object_type()));
    }

    let data = LsOutput {
        success: true,
        result_code: 0,
        hash: target,
        object_type: object.object_type(),
        links,
    };

    output.write(&data, || {
        data.links
            .iter()
            .map(|l| {
                format!(
                    "{} {:>12} {} {}\n",
                    l.object_type.as_str(),
                    l.size,
                    l.hash,
                    l.name
                )
            })
            .collect()
    })
}

fn cmd_stat(root: &Path, hash_str: &str, path: &str, output: &OutputWriter) -> Result<()> {
    let store = open_store(root)?;
    let hash = parse_hash(hash_str)?;

    let (target, object) = DagResolver::new(&store)
        .lookup(&hash, path)
        .with_context(|| format!("Failed to resolve {}:{}", hash, path))?;

    let data = StatOutput {
        success: true,
        result_code: 0,
        hash: target,
        object_type: object.object_type(),
        link_count: object.links().len(),
        size: object
            .logical_size()
            .with_context(|| format!("Corrupt object {}", target))?,
    };

    output.write(&data, || {
        format!(
            "Hash: {}\nType: {}\nLinks: {}\nSize: {} bytes\nPath: {}\n",
            data.hash,
            data.object_type.as_str(),
            data.link_count,
            data.size,
            store.object_path(&data.hash).display()
        )
    })
}
