// Command-line front end for hdiffz.
//
// Reads whole files, hands them to the delta boundary, and writes the diff.
// This is the only part of the crate that touches the filesystem.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use log::{LevelFilter, info};
use sha2::{Digest, Sha256};

use crate::codec::{CodecId, compiled_codecs};
use crate::delta::{BuildParameters, DeltaBuilder, DeltaVerifier};
use crate::engine::{DEFAULT_MATCH_BLOCK_SIZE, MIN_SINGLE_MATCH_SCORE_DEFAULT};
use crate::error::DeltaError;

/// Exit code for a diff that does not reproduce the new file.
const EXIT_MISMATCH: i32 = 2;

// ---------------------------------------------------------------------------
// Byte size parsing (supports K, M, G suffixes)
// ---------------------------------------------------------------------------

fn parse_byte_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".into());
    }
    let (num_part, multiplier) = match s.as_bytes().last() {
        Some(b'k' | b'K') => (&s[..s.len() - 1], 1024usize),
        Some(b'm' | b'M') => (&s[..s.len() - 1], 1024 * 1024),
        Some(b'g' | b'G') => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        _ => (s, 1usize),
    };
    let num: usize = num_part
        .trim()
        .parse()
        .map_err(|e| format!("invalid size '{s}': {e}"))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size overflow: '{s}'"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Compressed binary diff construction and verification.
#[derive(Parser, Debug)]
#[command(
    name = "hdiffz",
    version,
    about = "Build and verify compressed binary diffs",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Build a compressed diff from OLD to NEW.
    Diff(DiffArgs),
    /// Verify that a diff turns OLD into NEW.
    Check(CheckArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CodecArg {
    None,
    Zlib,
    Zstd,
    Lzma2,
}

impl From<CodecArg> for CodecId {
    fn from(arg: CodecArg) -> Self {
        match arg {
            CodecArg::None => CodecId::None,
            CodecArg::Zlib => CodecId::Zlib,
            CodecArg::Zstd => CodecId::Zstd,
            CodecArg::Lzma2 => CodecId::Lzma2,
        }
    }
}

#[derive(Args, Debug)]
struct DiffArgs {
    /// Old file.
    #[arg(long, value_hint = ValueHint::FilePath)]
    old: PathBuf,

    /// New file.
    #[arg(long, value_hint = ValueHint::FilePath)]
    new: PathBuf,

    /// Output diff file (stdout if omitted).
    #[arg(short = 'o', long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Section compressor.
    #[arg(long, value_enum, default_value_t = CodecArg::Zlib)]
    codec: CodecArg,

    /// Match block size (supports K/M/G suffix; 0 = default).
    #[arg(long = "block-size", value_parser = parse_byte_size, default_value_t = 0)]
    block_size: usize,

    /// Worker threads for block matching (0 = 1).
    #[arg(long, short = 'j', default_value_t = 0)]
    threads: usize,

    /// Verify the diff after building it.
    #[arg(long)]
    verify: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Old file.
    #[arg(long, value_hint = ValueHint::FilePath)]
    old: PathBuf,

    /// New file.
    #[arg(long, value_hint = ValueHint::FilePath)]
    new: PathBuf,

    /// Diff file.
    #[arg(long, value_hint = ValueHint::FilePath)]
    diff: PathBuf,
}

// ---------------------------------------------------------------------------
// Resolved options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Diff {
        old: PathBuf,
        new: PathBuf,
        output: Option<PathBuf>,
        params: BuildParameters,
        verify: bool,
    },
    Check {
        old: PathBuf,
        new: PathBuf,
        diff: PathBuf,
    },
    Config,
}

#[derive(Debug, Clone)]
struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
}

fn resolve_options(cli: Cli) -> Options {
    let command = match cli.command {
        Cmd::Diff(args) => Command::Diff {
            old: args.old,
            new: args.new,
            output: args.output,
            params: BuildParameters::new(args.codec.into(), args.block_size, args.threads),
            verify: args.verify,
        },
        Cmd::Check(args) => Command::Check {
            old: args.old,
            new: args.new,
            diff: args.diff,
        },
        Cmd::Config => Command::Config,
    };
    Options {
        command,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("hdiffz".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_input(label: &str, path: &Path) -> Result<Vec<u8>, i32> {
    fs::read(path).map_err(|e| {
        eprintln!("hdiffz: {label} file: {}: {e}", path.display());
        1
    })
}

fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => eprintln!("{text}"),
        Err(e) => eprintln!("hdiffz: json: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("hdiffz version {version} (Rust)");

    let codecs: Vec<&str> = compiled_codecs().map(CodecId::name).collect();
    let adler32 = cfg!(feature = "adler32") as u8;
    let parallel = cfg!(feature = "parallel") as u8;
    let ptr_size = std::mem::size_of::<*const ()>();

    eprintln!("CODECS=none{}", codecs.iter().map(|c| format!(",{c}")).collect::<String>());
    for id in CodecId::ALL {
        eprintln!("CODEC_{}={}", id.name().to_uppercase(), id.is_available() as u8);
    }
    eprintln!("ADLER32_SIMD={adler32}");
    eprintln!("PARALLEL={parallel}");
    eprintln!("DEFAULT_MATCH_BLOCK_SIZE={DEFAULT_MATCH_BLOCK_SIZE}");
    eprintln!("MIN_SINGLE_MATCH_SCORE={MIN_SINGLE_MATCH_SCORE_DEFAULT}");
    eprintln!("sizeof(usize)={ptr_size}");

    0
}

// ---------------------------------------------------------------------------
// Diff command
// ---------------------------------------------------------------------------

fn cmd_diff(
    opts: &Options,
    old_path: &Path,
    new_path: &Path,
    output: Option<&Path>,
    params: BuildParameters,
    verify: bool,
) -> i32 {
    if let Some(path) = output
        && path.exists()
        && !opts.force
    {
        eprintln!("hdiffz: output file exists, use -f to overwrite: {}", path.display());
        return 1;
    }

    let old = match read_input("old", old_path) {
        Ok(d) => d,
        Err(code) => return code,
    };
    let new = match read_input("new", new_path) {
        Ok(d) => d,
        Err(code) => return code,
    };

    if !params.codec.is_available() && !opts.quiet {
        eprintln!(
            "hdiffz: warning: codec '{}' not compiled in, writing an uncompressed diff",
            params.codec
        );
    }

    let started = Instant::now();
    let diff = match DeltaBuilder::new().try_build(&old, &new, params) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("hdiffz: diff error: {e}");
            return 1;
        }
    };
    info!("built {} byte diff in {:?}", diff.len(), started.elapsed());

    let verified = if verify {
        match DeltaVerifier::new().try_verify(&old, &new, diff.as_bytes()) {
            Ok(v) => {
                info!(
                    "verified with {} after {} attempt(s)",
                    v.decompressor.map_or("none", CodecId::name),
                    v.attempts
                );
                Some(true)
            }
            Err(e) => {
                eprintln!("hdiffz: verify failed: {e}");
                return EXIT_MISMATCH;
            }
        }
    } else {
        None
    };

    let written = match output {
        Some(path) => fs::write(path, diff.as_bytes()),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(diff.as_bytes())
                .and_then(|()| stdout.flush())
        }
    };
    if let Err(e) = written {
        eprintln!("hdiffz: write error: {e}");
        return 1;
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "hdiffz: diff: old size: {}, new size: {}, diff size: {}, codec: {}",
            old.len(),
            new.len(),
            diff.len(),
            params.codec
        );
    }

    if opts.json_output {
        let normalized = params.normalized();
        print_json(&serde_json::json!({
            "command": "diff",
            "old_size": old.len(),
            "new_size": new.len(),
            "diff_size": diff.len(),
            "codec": params.codec.name(),
            "block_size": normalized.block_size,
            "threads": normalized.threads,
            "verified": verified,
            "old_sha256": sha256_hex(&old),
            "new_sha256": sha256_hex(&new),
            "diff_sha256": sha256_hex(diff.as_bytes()),
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Check command
// ---------------------------------------------------------------------------

fn cmd_check(opts: &Options, old_path: &Path, new_path: &Path, diff_path: &Path) -> i32 {
    let old = match read_input("old", old_path) {
        Ok(d) => d,
        Err(code) => return code,
    };
    let new = match read_input("new", new_path) {
        Ok(d) => d,
        Err(code) => return code,
    };
    let diff = match read_input("diff", diff_path) {
        Ok(d) => d,
        Err(code) => return code,
    };

    let outcome = DeltaVerifier::new().try_verify(&old, &new, &diff);
    let matched = outcome.is_ok();

    match &outcome {
        Ok(v) if !opts.quiet => eprintln!(
            "hdiffz: check: OK ({}, {} attempt(s))",
            v.decompressor.map_or("none", CodecId::name),
            v.attempts
        ),
        Err(e) if !opts.quiet => eprintln!("hdiffz: check: FAILED: {e}"),
        _ => {}
    }

    if opts.json_output {
        let (codec, attempts) = match &outcome {
            Ok(v) => (v.decompressor.map(CodecId::name), v.attempts),
            Err(DeltaError::Exhausted { attempts }) => (None, *attempts),
            Err(_) => (None, 0),
        };
        print_json(&serde_json::json!({
            "command": "check",
            "matched": matched,
            "codec": codec,
            "attempts": attempts,
            "old_size": old.len(),
            "new_size": new.len(),
            "diff_size": diff.len(),
            "old_sha256": sha256_hex(&old),
            "new_sha256": sha256_hex(&new),
            "diff_sha256": sha256_hex(&diff),
        }));
    }

    if matched { 0 } else { EXIT_MISMATCH }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn log_filter(opts: &Options) -> LevelFilter {
    match (opts.quiet, opts.verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, _) => LevelFilter::Debug,
    }
}

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if std::env::var_os("RUST_LOG").is_none() {
        logger.filter_level(log_filter(&opts));
    }
    logger.format_timestamp(None).format_target(false).init();

    let exit_code = match &opts.command {
        Command::Diff {
            old,
            new,
            output,
            params,
            verify,
        } => cmd_diff(&opts, old, new, output.as_deref(), *params, *verify),
        Command::Check { old, new, diff } => cmd_check(&opts, old, new, diff),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
