use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use bcroot_core::configurables::ConfigurablesFile;
use bcroot_core::hasher::hex;
use bcroot_core::leaf::par_leaf_digests;
use bcroot_core::patch::check_disjoint;
use bcroot_core::verify::check_root;
use bcroot_core::{
    apply_patches, compute_bytecode_root_with, merkle, Blake3Hasher, ConfigurablePatch,
    NodeHasher, RootParams, Sha256Hasher,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HashAlg { Sha256, Blake3 }

#[derive(Parser)]
#[command(name = "bcroot", version, about = "Bytecode Merkle roots with configurable patching")]
struct Cli {
    /// Repeat for more log output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[arg(long, value_enum, default_value_t = HashAlg::Sha256, global = true)]
    hash: HashAlg,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the bytecode root
    Root {
        bytecode: PathBuf,
        #[arg(long)] configurables: Option<PathBuf>,
        /// Reject overlapping configurables
        #[arg(long, default_value_t = false)] strict: bool,
    },
    /// Print every leaf digest
    Leaves {
        bytecode: PathBuf,
        #[arg(long)] configurables: Option<PathBuf>,
    },
    /// Print every tree level, leaves first
    Tree {
        bytecode: PathBuf,
        #[arg(long)] configurables: Option<PathBuf>,
    },
    /// Write a patched copy of the bytecode
    Patch {
        bytecode: PathBuf,
        #[arg(long)] configurables: PathBuf,
        #[arg(long)] output: PathBuf,
    },
    /// Compare the computed root against an expected one
    Verify {
        bytecode: PathBuf,
        #[arg(long)] expected: String,
        #[arg(long)] configurables: Option<PathBuf>,
        #[arg(long)] report: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let hasher: &dyn NodeHasher = match cli.hash {
        HashAlg::Sha256 => &Sha256Hasher,
        HashAlg::Blake3 => &Blake3Hasher,
    };

    let result = match cli.cmd {
        Cmd::Root { bytecode, configurables, strict } => {
            root(hasher, &bytecode, configurables.as_deref(), strict)
        }
        Cmd::Leaves { bytecode, configurables } => leaves(hasher, &bytecode, configurables.as_deref()),
        Cmd::Tree { bytecode, configurables } => tree(hasher, &bytecode, configurables.as_deref()),
        Cmd::Patch { bytecode, configurables, output } => patch(&bytecode, &configurables, &output),
        Cmd::Verify { bytecode, expected, configurables, report } => {
            verify(hasher, &bytecode, &expected, configurables.as_deref(), report.as_deref())
        }
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn load_patches(path: Option<&Path>) -> Result<Vec<ConfigurablePatch>> {
    match path {
        Some(p) => Ok(ConfigurablesFile::load(p)?.patches()),
        None => Ok(Vec::new()),
    }
}

fn read_bytecode(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("read bytecode {}", path.display()))
}

/// Read the bytecode and apply configurables to the in-memory copy.
fn patched_bytecode(bytecode: &Path, configurables: Option<&Path>) -> Result<Vec<u8>> {
    let mut code = read_bytecode(bytecode)?;
    let patches = load_patches(configurables)?;
    apply_patches(&mut code, &patches).context("apply configurables")?;
    if code.is_empty() {
        return Err(bcroot_core::BytecodeError::EmptyBytecode.into());
    }
    Ok(code)
}

fn root(hasher: &dyn NodeHasher, bytecode: &Path, configurables: Option<&Path>, strict: bool) -> Result<u8> {
    let code = read_bytecode(bytecode)?;
    let patches = load_patches(configurables)?;
    if strict {
        check_disjoint(&patches).context("strict configurables")?;
    }
    let r = compute_bytecode_root_with(hasher, &code, &patches, &RootParams::default())
        .with_context(|| format!("compute root of {}", bytecode.display()))?;
    println!("{}", hex(&r));
    Ok(0)
}

fn leaves(hasher: &dyn NodeHasher, bytecode: &Path, configurables: Option<&Path>) -> Result<u8> {
    let code = patched_bytecode(bytecode, configurables)?;
    let params = RootParams::default();
    let digests = par_leaf_digests(hasher, &code, &params)?;
    for (i, (d, chunk)) in digests.iter().zip(code.chunks(params.leaf_size)).enumerate() {
        println!("{:6} {:6} {}", i, chunk.len(), hex(d));
    }
    Ok(0)
}

fn tree(hasher: &dyn NodeHasher, bytecode: &Path, configurables: Option<&Path>) -> Result<u8> {
    let code = patched_bytecode(bytecode, configurables)?;
    let digests = par_leaf_digests(hasher, &code, &RootParams::default())?;
    for (height, level) in merkle::levels(hasher, &digests)?.iter().enumerate() {
        println!("level {} ({} nodes)", height, level.len());
        for d in level {
            println!("  {}", hex(d));
        }
    }
    Ok(0)
}

fn patch(bytecode: &Path, configurables: &Path, output: &Path) -> Result<u8> {
    let code = patched_bytecode(bytecode, Some(configurables))?;
    fs::write(output, &code).with_context(|| format!("write {}", output.display()))?;
    eprintln!("Wrote {} bytes to {}", code.len(), output.display());
    Ok(0)
}

fn verify(
    hasher: &dyn NodeHasher,
    bytecode: &Path,
    expected: &str,
    configurables: Option<&Path>,
    report: Option<&Path>,
) -> Result<u8> {
    let code = read_bytecode(bytecode)?;
    let patches = load_patches(configurables)?;
    let rc = check_root(hasher, &code, &patches, &RootParams::default(), expected)?;
    eprintln!("Leaves={}; computed={}; expected={}", rc.leaves, rc.computed_hex, rc.expected_hex);
    if let Some(path) = report {
        let f = fs::File::create(path).with_context(|| format!("create report {}", path.display()))?;
        serde_json::to_writer_pretty(f, &rc)?;
    }
    if rc.matches {
        println!("OK");
        Ok(0)
    } else {
        println!("MISMATCH");
        Ok(2)
    }
}
