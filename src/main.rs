//! merkle-audit CLI - build Merkle trees and produce/check audit proofs
//!
//! Trees are saved as snapshots (JSON, or bincode for `.bin` paths). Proofs
//! are written as JSON, the same document `prove` prints, so they can be
//! checked without the tree.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use merkle_audit::{store, AuditProof, Digest, MerkleTree};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "merkle-audit")]
#[command(about = "Build Merkle trees and verify audit proofs")]
#[command(version)]
struct Cli {
    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

/// The leaf a command is about
#[derive(Args)]
#[group(required = true, multiple = false)]
struct Target {
    /// Leaf data, hashed before use
    #[arg(long)]
    data: Option<String>,

    /// Hex-encoded leaf digest
    #[arg(long)]
    digest: Option<String>,
}

impl Target {
    fn resolve(&self) -> anyhow::Result<Digest> {
        match (&self.data, &self.digest) {
            (Some(data), _) => Ok(Digest::leaf(data.as_bytes())),
            (None, Some(hex)) => Ok(hex.parse()?),
            (None, None) => anyhow::bail!("either --data or --digest is required"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build a tree from files
    Build {
        /// Input files, one leaf per file
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Use every line of the inputs as a leaf instead
        #[arg(short, long)]
        lines: bool,
        /// Save the built tree here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the root digest of a saved tree
    Root {
        /// Saved tree
        tree: PathBuf,
    },

    /// Produce an audit proof for a leaf
    Prove {
        /// Saved tree
        tree: PathBuf,
        #[command(flatten)]
        target: Target,
        /// Write the proof here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a proof file against a root, without the tree
    Verify {
        /// Claimed root digest (hex)
        #[arg(short, long)]
        root: String,
        #[command(flatten)]
        target: Target,
        /// Proof file written by `prove`
        #[arg(short, long)]
        proof: PathBuf,
    },

    /// Check that a leaf is included in a saved tree under a root
    Check {
        /// Saved tree
        tree: PathBuf,
        /// Claimed root digest (hex)
        #[arg(short, long)]
        root: String,
        #[command(flatten)]
        target: Target,
    },

    /// Print the leaf digest of some data
    Hash {
        /// The data to hash
        data: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Build {
            files,
            lines,
            output: out,
        } => {
            let mut tree = MerkleTree::new();
            for path in files {
                for leaf in read_leaves(path, *lines)? {
                    tree.append_leaf(merkle_audit::Node::leaf(leaf));
                }
            }
            tree.build()?;
            let root = tree
                .root_digest()
                .context("built tree has no root")?;
            if let Some(path) = out {
                store::save(&tree, path)?;
            }
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "root": root.to_hex(),
                    "leaves": tree.leaf_count(),
                    "height": tree.height(),
                    "saved": out.as_ref().map(|p| p.display().to_string())
                }),
            )?;
        }

        Commands::Root { tree } => {
            let tree = store::load(tree)?;
            match tree.root_digest() {
                Some(root) => output(
                    &cli.format,
                    &serde_json::json!({
                        "root": root.to_hex(),
                        "leaves": tree.leaf_count(),
                        "height": tree.height()
                    }),
                )?,
                None => fail(&cli.format, "Tree has not been built")?,
            }
        }

        Commands::Prove {
            tree,
            target,
            output: out,
        } => {
            let tree = store::load(tree)?;
            let target = target.resolve()?;
            match tree.audit_proof(&target)? {
                Some(proof) => {
                    if let Some(path) = out {
                        fs::write(path, serde_json::to_vec_pretty(&proof)?)
                            .with_context(|| format!("writing {}", path.display()))?;
                    }
                    output(&cli.format, &serde_json::to_value(&proof)?)?;
                }
                None => fail(&cli.format, &format!("Leaf not found: {}", target))?,
            }
        }

        Commands::Verify {
            root,
            target,
            proof,
        } => {
            let root: Digest = root.parse()?;
            let target = target.resolve()?;
            let bytes =
                fs::read(proof).with_context(|| format!("reading {}", proof.display()))?;
            let proof: AuditProof = serde_json::from_slice(&bytes)?;
            let valid = merkle_audit::verify_audit(&root, &target, &proof.trail);
            report_validity(&cli.format, valid, &root, &target)?;
        }

        Commands::Check { tree, root, target } => {
            let tree = store::load(tree)?;
            let root: Digest = root.parse()?;
            let target = target.resolve()?;
            let valid = tree.verify(&root, &target);
            report_validity(&cli.format, valid, &root, &target)?;
        }

        Commands::Hash { data } => {
            output(
                &cli.format,
                &serde_json::json!({
                    "digest": Digest::leaf(data.as_bytes()).to_hex()
                }),
            )?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Leaves from one input file: the whole file, or each of its lines
fn read_leaves(path: &Path, lines: bool) -> anyhow::Result<Vec<Vec<u8>>> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    if lines {
        Ok(split_lines(&bytes))
    } else {
        Ok(vec![bytes])
    }
}

/// Split raw bytes on `\n`, dropping a trailing `\r` from each line and the
/// empty remainder after a final newline
fn split_lines(bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut lines: Vec<Vec<u8>> = bytes
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line).to_vec())
        .collect();
    if bytes.is_empty() || bytes.ends_with(b"\n") {
        lines.pop();
    }
    lines
}

fn report_validity(
    format: &OutputFormat,
    valid: bool,
    root: &Digest,
    target: &Digest,
) -> anyhow::Result<()> {
    output(
        format,
        &serde_json::json!({
            "valid": valid,
            "root": root.to_hex(),
            "target": target.to_hex()
        }),
    )?;
    if !valid {
        std::process::exit(1);
    }
    Ok(())
}

fn fail(format: &OutputFormat, message: &str) -> anyhow::Result<()> {
    output(
        format,
        &serde_json::json!({
            "status": "error",
            "message": message
        }),
    )?;
    std::process::exit(1);
}

fn output(format: &OutputFormat, value: &serde_json::Value) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
        OutputFormat::Text => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}
