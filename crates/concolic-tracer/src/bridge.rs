//! Subprocess plumbing for launching a tracer child and exchanging one
//! [`TraceFrame`] with it per call (§4.1).
//!
//! Two execution models share this module: a fresh child per call
//! (`ForkServerMode::Disabled`) and a long-lived child that is re-primed
//! with a fresh seed for every call (`ForkServerMode::Enabled`). Both
//! speak the same wire framing; the difference is only in who pays the
//! `exec`/`fork` cost.

use std::io::Write as _;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use concolic_core::{Arch, EngineConfig, InputSource, Seed, TracerKind};
use num_bigint::BigInt;

use crate::error::{ExecutionError, Result};
use crate::wire::{read_frame, TraceFrame};

/// Whether the bridge keeps one child alive across calls or spawns fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkServerMode {
    Enabled,
    Disabled,
}

impl ForkServerMode {
    fn of_config(config: &EngineConfig) -> ForkServerMode {
        if config.no_forkserver {
            ForkServerMode::Disabled
        } else {
            ForkServerMode::Enabled
        }
    }
}

/// The directory the three `qemu-trace-*` sibling binaries live in:
/// alongside the running executable, per §4.10's validation step.
pub fn tracer_binary_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().map_err(ExecutionError::Spawn)?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| ExecutionError::MissingTracerBinary(exe))
}

fn tracer_binary_path(dir: &Path, kind: TracerKind, arch: Arch) -> PathBuf {
    dir.join(format!("{}-{}", kind.binary_stem(), arch.as_str()))
}

/// One tracer variant's subprocess bridge: knows how to launch the right
/// binary for its `TracerKind`/`Arch` pair and how to run one seed
/// through it, in whichever fork-server mode the engine was configured
/// with.
pub struct TracerBridge {
    kind: TracerKind,
    binary: PathBuf,
    program: PathBuf,
    arg_template: Vec<String>,
    filepath: Option<PathBuf>,
    exec_timeout: Duration,
    mode: ForkServerMode,
    forked_child: Option<Child>,
}

impl TracerBridge {
    pub fn new(kind: TracerKind, tracer_dir: &Path, config: &EngineConfig) -> Result<TracerBridge> {
        let binary = tracer_binary_path(tracer_dir, kind, config.architecture);
        if !binary.exists() {
            return Err(ExecutionError::MissingTracerBinary(binary));
        }
        Ok(TracerBridge {
            kind,
            binary,
            program: config.program.clone(),
            arg_template: config.arg_template.clone(),
            filepath: config.filepath.clone(),
            exec_timeout: config.exec_timeout,
            mode: ForkServerMode::of_config(config),
            forked_child: None,
        })
    }

    fn args_for(&self, seed_path: Option<&Path>) -> Vec<String> {
        self.arg_template
            .iter()
            .map(|arg| match seed_path {
                Some(path) if arg == "input" => path.display().to_string(),
                _ => arg.clone(),
            })
            .collect()
    }

    /// Run one seed through this tracer, returning the parsed response
    /// frame. `try_value` and `target` steer the instrumented binary's
    /// branch-record emission (which compare to perturb, and which
    /// specific visit to stop recording detail at); a plain coverage
    /// pass passes `try_value = 0` and `target = None`.
    pub fn run(
        &mut self,
        seed: &Seed,
        try_value: &BigInt,
        target: Option<(u64, usize)>,
    ) -> Result<TraceFrame> {
        tracing::trace!(kind = ?self.kind, mode = ?self.mode, try_value = %try_value, "dispatching tracer call");
        let result = match self.mode {
            ForkServerMode::Disabled => self.run_spawned(seed, try_value, target),
            ForkServerMode::Enabled => self.run_forked(seed, try_value, target),
        };
        if let Err(ref err) = result {
            tracing::warn!(kind = ?self.kind, %err, "tracer call failed");
        }
        result
    }

    fn build_command(&self, seed_path: Option<&Path>) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(&self.program);
        cmd.args(self.args_for(seed_path));
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::null());
        cmd
    }

    /// Run `seed` against the uninstrumented target directly (no
    /// `qemu-trace-*` wrapper), used to confirm whether a timeout was
    /// actually a crash. Only the exit signal is meaningful; there is no
    /// wire frame to parse since the uninstrumented binary doesn't speak
    /// the tracer protocol.
    pub fn run_native(&mut self, seed: &Seed) -> Result<concolic_core::Signal> {
        let concretized = seed.concretize();
        let seed_path = match &seed.source {
            InputSource::FileInput(_) => self.filepath.as_deref(),
            InputSource::StdInput => None,
        };
        if let (InputSource::FileInput(_), Some(path)) = (&seed.source, seed_path) {
            std::fs::write(path, &concretized).map_err(ExecutionError::WriteInput)?;
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(self.args_for(seed_path));
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
        let mut child = cmd.spawn().map_err(ExecutionError::Spawn)?;

        if matches!(seed.source, InputSource::StdInput) {
            let mut stdin = child.stdin.take().expect("piped stdin");
            stdin.write_all(&concretized).map_err(ExecutionError::WriteInput)?;
        }

        let child = std::sync::Arc::new(std::sync::Mutex::new(child));
        let watcher_child = std::sync::Arc::clone(&child);
        let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();
        let timeout = self.exec_timeout;
        let watcher = std::thread::spawn(move || {
            if done_rx.recv_timeout(timeout).is_err() {
                if let Ok(mut c) = watcher_child.lock() {
                    let _ = c.kill();
                }
            }
        });

        let status = child.lock().expect("poisoned").wait().map_err(ExecutionError::Spawn)?;
        let _ = done_tx.send(());
        let _ = watcher.join();

        Ok(concolic_core::Signal::from_raw(status.signal().unwrap_or(0)))
    }

    fn run_spawned(
        &mut self,
        seed: &Seed,
        try_value: &BigInt,
        target: Option<(u64, usize)>,
    ) -> Result<TraceFrame> {
        let concretized = seed.concretize();
        let seed_path = match &seed.source {
            InputSource::FileInput(_) => self.filepath.as_deref(),
            InputSource::StdInput => None,
        };
        if let (InputSource::FileInput(_), Some(path)) = (&seed.source, seed_path) {
            std::fs::write(path, &concretized).map_err(ExecutionError::WriteInput)?;
        }

        let mut cmd = self.build_command(seed_path);
        apply_try_value_and_target(&mut cmd, try_value, target);
        let mut child = cmd.spawn().map_err(ExecutionError::Spawn)?;

        if matches!(seed.source, InputSource::StdInput) {
            let mut stdin = child.stdin.take().expect("piped stdin");
            stdin.write_all(&concretized).map_err(ExecutionError::WriteInput)?;
        }

        run_with_timeout(child, self.exec_timeout)
    }

    fn run_forked(
        &mut self,
        seed: &Seed,
        try_value: &BigInt,
        target: Option<(u64, usize)>,
    ) -> Result<TraceFrame> {
        // A live fork server still answers one request at a time over its
        // stdin/stdout pipe; a dead or never-started child is (re)spawned
        // transparently so callers never see the mode switch.
        if self.forked_child.is_none() {
            let seed_path = match &seed.source {
                InputSource::FileInput(_) => self.filepath.as_deref(),
                InputSource::StdInput => None,
            };
            let mut cmd = self.build_command(seed_path);
            cmd.arg("--forkserver");
            let child = cmd.spawn().map_err(ExecutionError::Spawn)?;
            self.forked_child = Some(child);
        }

        let concretized = seed.concretize();
        if let InputSource::FileInput(_) = &seed.source {
            if let Some(path) = &self.filepath {
                std::fs::write(path, &concretized).map_err(ExecutionError::WriteInput)?;
            }
        }

        let child = self.forked_child.as_mut().expect("primed above");
        {
            let stdin = child.stdin.as_mut().ok_or_else(|| {
                ExecutionError::ForkServerHandshake("fork server stdin closed".to_string())
            })?;
            write_request(stdin, &concretized, try_value, target)?;
        }

        let stdout = child.stdout.as_mut().ok_or_else(|| {
            ExecutionError::ForkServerHandshake("fork server stdout closed".to_string())
        })?;
        match read_frame(stdout) {
            Ok(frame) => Ok(frame),
            Err(err) => {
                // The fork server died mid-exchange; drop it so the next
                // call respawns a fresh one instead of replaying the
                // broken pipe.
                self.forked_child = None;
                Err(err)
            }
        }
    }
}

fn write_request(
    stdin: &mut impl std::io::Write,
    seed_bytes: &[u8],
    try_value: &BigInt,
    target: Option<(u64, usize)>,
) -> Result<()> {
    let try_value: i128 = try_value.clone().try_into().unwrap_or(0);
    let (target_addr, target_visit) = target.unwrap_or((0, 0));
    let has_target: u8 = if target.is_some() { 1 } else { 0 };

    let mut req = Vec::with_capacity(4 + 16 + 8 + 8 + 1);
    req.extend_from_slice(&(seed_bytes.len() as u32).to_le_bytes());
    req.extend_from_slice(seed_bytes);
    req.extend_from_slice(&try_value.to_le_bytes());
    req.extend_from_slice(&target_addr.to_le_bytes());
    req.extend_from_slice(&(target_visit as u64).to_le_bytes());
    req.push(has_target);
    stdin.write_all(&req).map_err(ExecutionError::WriteInput)
}

fn apply_try_value_and_target(cmd: &mut Command, try_value: &BigInt, target: Option<(u64, usize)>) {
    cmd.env("CONCOLIC_TRY_VALUE", try_value.to_string());
    if let Some((addr, visit)) = target {
        cmd.env("CONCOLIC_TARGET_ADDR", addr.to_string());
        cmd.env("CONCOLIC_TARGET_VISIT", visit.to_string());
    }
}

/// Read one frame from `child`'s stdout, killing the child if it's still
/// alive once `timeout` elapses. A watcher thread owns the kill decision
/// so a hung child's blocking read never stalls the caller past its
/// configured budget.
fn run_with_timeout(mut child: Child, timeout: Duration) -> Result<TraceFrame> {
    let mut stdout = child.stdout.take().expect("piped stdout");
    let child = std::sync::Arc::new(std::sync::Mutex::new(child));
    let watcher_child = std::sync::Arc::clone(&child);
    let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();

    let watcher = std::thread::spawn(move || {
        if done_rx.recv_timeout(timeout).is_err() {
            if let Ok(mut c) = watcher_child.lock() {
                let _ = c.kill();
            }
        }
    });

    let frame = read_frame(&mut stdout);
    let _ = done_tx.send(());
    let _ = watcher.join();
    if let Ok(mut c) = child.lock() {
        let _ = c.wait();
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge_for_test() -> TracerBridge {
        TracerBridge {
            kind: TracerKind::Coverage,
            binary: PathBuf::from("/bin/true"),
            program: PathBuf::from("/bin/target"),
            arg_template: vec!["--fixed".to_string(), "input".to_string()],
            filepath: Some(PathBuf::from("/tmp/concolic-seed")),
            exec_timeout: Duration::from_millis(100),
            mode: ForkServerMode::Disabled,
            forked_child: None,
        }
    }

    #[test]
    fn substitutes_the_input_token_with_the_seed_path() {
        let bridge = bridge_for_test();
        let args = bridge.args_for(Some(Path::new("/tmp/seed-7")));
        assert_eq!(args, vec!["--fixed".to_string(), "/tmp/seed-7".to_string()]);
    }

    #[test]
    fn leaves_the_input_token_untouched_without_a_seed_path() {
        let bridge = bridge_for_test();
        let args = bridge.args_for(None);
        assert_eq!(args, vec!["--fixed".to_string(), "input".to_string()]);
    }

    #[test]
    fn tracer_binary_path_names_kind_and_arch() {
        let dir = Path::new("/opt/concolic");
        let path = tracer_binary_path(dir, TracerKind::Branch, Arch::X64);
        assert_eq!(path, PathBuf::from("/opt/concolic/qemu-trace-branch-x64"));
    }

    #[test]
    fn fork_server_mode_follows_the_no_forkserver_flag() {
        let mut config = EngineConfig::for_testing(PathBuf::from("/bin/target"), PathBuf::from("/tmp/out"));
        assert_eq!(ForkServerMode::of_config(&config), ForkServerMode::Enabled);
        config.no_forkserver = true;
        assert_eq!(ForkServerMode::of_config(&config), ForkServerMode::Disabled);
    }
}
