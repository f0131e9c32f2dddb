//! Command-line surface (§6) and its conversion into an
//! [`EngineConfig`](concolic_core::EngineConfig).

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use concolic_core::{Arch, EngineConfig};

use crate::error::{ConfigurationError, Result};

#[derive(Parser, Debug)]
#[command(name = "concolic-fuzz")]
#[command(about = "Gray-box concolic fuzzing engine", long_about = None)]
pub struct Args {
    /// Directory where queue/ and crashes/ are written.
    #[arg(long)]
    pub outputdir: PathBuf,

    /// Parent directory shared with other fuzzer processes for seed exchange.
    #[arg(long)]
    pub syncdir: Option<PathBuf>,

    /// Target binary.
    #[arg(long)]
    pub program: PathBuf,

    /// Space-separated argument template; `input` tokens are substituted
    /// with the seed file path.
    #[arg(long, default_value = "input")]
    pub arg: String,

    /// File path to write the seed to (implies file-based input delivery).
    #[arg(long)]
    pub filepath: Option<PathBuf>,

    /// Initial seed directory; empty is acceptable.
    #[arg(long)]
    pub inputdir: Option<PathBuf>,

    /// Verbosity: 0 (warnings/errors), 1 (lifecycle + stats), 2 (per-candidate detail).
    #[arg(short = 'v', default_value_t = 0)]
    pub verbosity: u8,

    /// Wall-clock budget in seconds; -1 means unlimited.
    #[arg(long, default_value_t = -1)]
    pub timelimit: i64,

    /// Per-run timeout in milliseconds.
    #[arg(long, default_value_t = 500)]
    pub exectimeout: u64,

    /// Tracer architecture.
    #[arg(long, default_value = "x64")]
    pub architecture: String,

    /// Disable the fork server; spawn a fresh tracer process per call.
    #[arg(long, default_value_t = false)]
    pub noforkserver: bool,

    /// Upper bound on conditions processed per branch tree.
    #[arg(long, default_value_t = 600)]
    pub nsolve: i64,

    /// Samples drawn per cursor byte.
    #[arg(long, default_value_t = 10)]
    pub nspawn: usize,
}

impl Args {
    /// Parse `--arg`, `--architecture`, `--timelimit` into their engine
    /// types. Does not touch the filesystem; see [`crate::validate`] for
    /// the I/O-backed checks.
    pub fn into_engine_config(self) -> Result<EngineConfig> {
        let architecture = match self.architecture.as_str() {
            "x64" => Arch::X64,
            "x86" => Arch::X86,
            other => return Err(ConfigurationError::InvalidArchitecture(other.to_string())),
        };
        let time_limit =
            if self.timelimit < 0 { None } else { Some(Duration::from_secs(self.timelimit as u64)) };
        let arg_template = self.arg.split_whitespace().map(str::to_string).collect();

        Ok(EngineConfig {
            output_dir: self.outputdir,
            sync_dir: self.syncdir,
            program: self.program,
            arg_template,
            filepath: self.filepath,
            input_dir: self.inputdir,
            verbosity: self.verbosity,
            time_limit,
            exec_timeout: Duration::from_millis(self.exectimeout),
            architecture,
            no_forkserver: self.noforkserver,
            n_solve: self.nsolve,
            n_spawn: self.nspawn,
        })
    }
}
