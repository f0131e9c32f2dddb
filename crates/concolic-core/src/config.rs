//! Engine-wide configuration shared by the tracer bridge, the driver, the
//! queue, and the CLI (§6). A single struct rather than scattering the
//! same dozen fields across every crate's function signatures.

use std::path::PathBuf;
use std::time::Duration;

use crate::typedef::Arch;

/// Every tunable surfaced on the command line (§6), already parsed into
/// engine-native types. The CLI crate is the only place that knows about
/// `clap`; everything downstream of it just holds an `EngineConfig`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub output_dir: PathBuf,
    pub sync_dir: Option<PathBuf>,
    pub program: PathBuf,
    /// Space-separated argument template; an `input` token is substituted
    /// with the seed file path at invocation time.
    pub arg_template: Vec<String>,
    /// Present iff the seed is delivered via a file rather than stdin.
    pub filepath: Option<PathBuf>,
    pub input_dir: Option<PathBuf>,
    pub verbosity: u8,
    /// `None` means unlimited (`--timelimit -1`).
    pub time_limit: Option<Duration>,
    pub exec_timeout: Duration,
    pub architecture: Arch,
    pub no_forkserver: bool,
    pub n_solve: i64,
    pub n_spawn: usize,
}

impl EngineConfig {
    /// Defaults matching the CLI's documented flag defaults, for tests and
    /// for callers that only care about overriding a couple of fields.
    pub fn for_testing(program: PathBuf, output_dir: PathBuf) -> EngineConfig {
        EngineConfig {
            output_dir,
            sync_dir: None,
            program,
            arg_template: vec!["input".to_string()],
            filepath: None,
            input_dir: None,
            verbosity: 0,
            time_limit: None,
            exec_timeout: Duration::from_millis(500),
            architecture: Arch::X64,
            no_forkserver: false,
            n_solve: 600,
            n_spawn: 10,
        }
    }
}
