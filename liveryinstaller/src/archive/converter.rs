//! External PTP converter adapter.
//!
//! PTP packages can only be unpacked by a vendor-supplied executable. The
//! tool is awkward to drive:
//!
//! - it writes its output relative to its own working directory, so it is
//!   always run with the executable's directory as CWD
//! - it chokes on long input paths, so the archive is first copied to a short
//!   temporary path
//! - it sometimes exits with status 0 after failing, so stdout and stderr are
//!   scanned for known failure signatures
//!
//! The signature matching lives in [`assess_tool_output`] and can be tested
//! without running the tool.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::traits::ArchiveConverter;
use crate::error::{LiveryError, LiveryResult, ToolFailure};
use crate::fs_ops::{self, dir_has_entries, move_path, remove_dir_quietly, stem_of};

/// Default upper bound on a single conversion.
pub const DEFAULT_CONVERTER_TIMEOUT: Duration = Duration::from_secs(300);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

const CAB_EXTRACTION_ERROR: &str = "error: system.applicationexception: cab extraction error";
const INVALID_PARAMETERS: &str = "invalid parameters passed to extraction function";
const DONE_MARKER: &str = "done!";

/// Captured result of one converter run.
#[derive(Debug)]
struct ToolOutput {
    status: Option<ExitStatus>,
    stdout: String,
    stderr: String,
    timed_out: bool,
}

/// Decide whether a finished converter run failed.
///
/// `exit_code` is `None` when the process was killed by a signal. Checks run
/// in order: exit status, known stdout signatures, an `error:` line without
/// the completion marker, then failure words on stderr.
pub fn assess_tool_output(
    exit_code: Option<i32>,
    stdout: &str,
    stderr: &str,
) -> Result<(), ToolFailure> {
    match exit_code {
        Some(0) => {}
        Some(code) => return Err(ToolFailure::ExitCode(code)),
        None => return Err(ToolFailure::Terminated),
    }

    let out = stdout.to_lowercase();
    if out.contains(CAB_EXTRACTION_ERROR) {
        return Err(ToolFailure::OutputPattern("CAB extraction error"));
    }
    if out.contains(INVALID_PARAMETERS) {
        return Err(ToolFailure::OutputPattern("invalid parameters"));
    }
    if out.contains("error:") && !out.contains(DONE_MARKER) {
        return Err(ToolFailure::OutputPattern("error without completion"));
    }

    let err = stderr.to_lowercase();
    if err.contains("error") || err.contains("failed") {
        return Err(ToolFailure::OutputPattern("error on stderr"));
    }

    Ok(())
}

/// Runs the PTP converter executable.
#[derive(Debug, Clone)]
pub struct PtpConverter {
    executable: PathBuf,
    timeout: Duration,
}

impl PtpConverter {
    /// Create a converter for the executable at `executable`.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            timeout: DEFAULT_CONVERTER_TIMEOUT,
        }
    }

    /// Set the maximum time a single conversion may take.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Path to the converter executable.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Absolute path of the executable, resolved against the current directory.
    fn resolve_executable(&self) -> LiveryResult<PathBuf> {
        if !self.executable.is_file() {
            return Err(LiveryError::ExternalToolMissing(self.executable.clone()));
        }
        fs::canonicalize(&self.executable)
            .map_err(|_| LiveryError::ExternalToolMissing(self.executable.clone()))
    }

    /// Run the tool on `input`, capturing output and enforcing the timeout.
    fn run(&self, executable: &Path, input: &Path) -> LiveryResult<ToolOutput> {
        let mut child = Command::new(executable)
            .arg(input)
            .current_dir(executable_dir(executable))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| LiveryError::ExternalToolFailed {
                archive: input.to_path_buf(),
                failure: ToolFailure::LaunchFailed,
                diagnostics: format!("{}: {}", executable.display(), e),
            })?;

        // Drain pipes on their own threads so a chatty tool cannot block on a full pipe.
        let stdout_reader = child.stdout.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                buf
            })
        });
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                buf
            })
        });

        let deadline = Instant::now() + self.timeout;
        let mut timed_out = false;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Some(status),
                Ok(None) if Instant::now() >= deadline => {
                    warn!(
                        executable = %executable.display(),
                        timeout_secs = self.timeout.as_secs(),
                        "Converter timed out, killing process"
                    );
                    let _ = child.kill();
                    let _ = child.wait();
                    timed_out = true;
                    break None;
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    let _ = child.kill();
                    return Err(LiveryError::ExternalToolFailed {
                        archive: input.to_path_buf(),
                        failure: ToolFailure::Terminated,
                        diagnostics: format!("failed to wait for converter: {}", e),
                    });
                }
            }
        };

        // A killed tool may leave children holding the pipes; don't wait on them.
        let collect = |reader: Option<thread::JoinHandle<Vec<u8>>>| {
            reader
                .filter(|_| !timed_out)
                .and_then(|handle| handle.join().ok())
                .map(|buf| String::from_utf8_lossy(&buf).into_owned())
                .unwrap_or_default()
        };

        Ok(ToolOutput {
            status,
            stdout: collect(stdout_reader),
            stderr: collect(stderr_reader),
            timed_out,
        })
    }

    /// Move every item of the tool's native output into `staged`.
    fn move_output(&self, native: &Path, staged: &Path) -> LiveryResult<usize> {
        let entries = fs::read_dir(native).map_err(|e| LiveryError::ReadFailed {
            path: native.to_path_buf(),
            source: e,
        })?;

        let mut moved = 0;
        for entry in entries {
            let entry = entry.map_err(|e| LiveryError::ReadFailed {
                path: native.to_path_buf(),
                source: e,
            })?;
            let from = entry.path();
            let to = staged.join(entry.file_name());
            move_path(&from, &to).map_err(|e| LiveryError::MoveFailed {
                from: from.clone(),
                to,
                source: e,
            })?;
            moved += 1;
        }

        if let Err(e) = fs::remove_dir(native) {
            warn!(path = %native.display(), error = %e, "Could not remove converter output directory");
        }
        Ok(moved)
    }
}

fn executable_dir(executable: &Path) -> PathBuf {
    executable
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Render captured output for an error message.
fn diagnostics(output: &ToolOutput) -> String {
    let mut parts = Vec::new();
    let stdout = output.stdout.trim();
    let stderr = output.stderr.trim();
    if !stdout.is_empty() {
        parts.push(format!("stdout: {}", stdout));
    }
    if !stderr.is_empty() {
        parts.push(format!("stderr: {}", stderr));
    }
    parts.join(" | ")
}

impl ArchiveConverter for PtpConverter {
    fn convert(&self, archive: &Path, staging_base: &Path) -> LiveryResult<PathBuf> {
        let executable = self.resolve_executable()?;

        let stem = stem_of(archive, "livery");
        let staged = staging_base.join(fs_ops::scratch_name("ptp", &stem));
        fs::create_dir_all(&staged).map_err(|e| LiveryError::CreateDirFailed {
            path: staged.clone(),
            source: e,
        })?;

        // Short input path; dropped (and deleted) on every exit path.
        let short_dir = tempfile::Builder::new()
            .prefix("lvi_ptp_")
            .tempdir()
            .map_err(|e| LiveryError::CreateDirFailed {
                path: std::env::temp_dir(),
                source: e,
            })?;
        let micros = chrono::Utc::now().timestamp_micros();
        let input_stem = format!("input_{}", micros);
        let input = short_dir.path().join(format!("{}.ptp", input_stem));
        fs::copy(archive, &input).map_err(|e| LiveryError::CopyFailed {
            from: archive.to_path_buf(),
            to: input.clone(),
            source: e,
        })?;

        // Depending on version the tool writes next to the input or next to itself.
        let candidates = [
            short_dir.path().join(&input_stem),
            executable_dir(&executable).join(&input_stem),
        ];
        for candidate in &candidates {
            remove_dir_quietly(candidate);
        }

        info!(archive = %archive.display(), "Running PTP converter");
        let output = self.run(&executable, &input)?;
        debug!(stdout = %output.stdout.trim(), stderr = %output.stderr.trim(), "Converter finished");

        if output.timed_out {
            for candidate in &candidates {
                remove_dir_quietly(candidate);
            }
            return Err(LiveryError::ExternalToolFailed {
                archive: archive.to_path_buf(),
                failure: ToolFailure::TimedOut(self.timeout),
                diagnostics: diagnostics(&output),
            });
        }

        let exit_code = output.status.and_then(|s| s.code());
        if let Err(failure) = assess_tool_output(exit_code, &output.stdout, &output.stderr) {
            for candidate in &candidates {
                remove_dir_quietly(candidate);
            }
            return Err(LiveryError::ExternalToolFailed {
                archive: archive.to_path_buf(),
                failure,
                diagnostics: diagnostics(&output),
            });
        }

        let native = candidates
            .iter()
            .find(|c| c.is_dir())
            .cloned()
            .ok_or_else(|| LiveryError::ConverterOutputMissing {
                archive: archive.to_path_buf(),
                expected: candidates[0].clone(),
            })?;
        if !dir_has_entries(&native) {
            remove_dir_quietly(&native);
            return Err(LiveryError::ConverterOutputMissing {
                archive: archive.to_path_buf(),
                expected: native,
            });
        }

        let moved = self.move_output(&native, &staged)?;
        info!(archive = %archive.display(), items = moved, staged = %staged.display(), "PTP converted");
        Ok(staged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_assess_exit_code() {
        assert_eq!(
            assess_tool_output(Some(2), "", ""),
            Err(ToolFailure::ExitCode(2))
        );
        assert_eq!(
            assess_tool_output(None, "", ""),
            Err(ToolFailure::Terminated)
        );
    }

    #[test]
    fn test_assess_cab_error_despite_zero_exit() {
        let stdout = "Extracting...\nError: System.ApplicationException: CAB extraction error\n";
        assert_eq!(
            assess_tool_output(Some(0), stdout, ""),
            Err(ToolFailure::OutputPattern("CAB extraction error"))
        );
    }

    #[test]
    fn test_assess_invalid_parameters() {
        let stdout = "Invalid parameters passed to extraction function";
        assert_eq!(
            assess_tool_output(Some(0), stdout, ""),
            Err(ToolFailure::OutputPattern("invalid parameters"))
        );
    }

    #[test]
    fn test_assess_error_marker_needs_done() {
        assert!(assess_tool_output(Some(0), "warning error: minor\nDone!", "").is_ok());
        assert_eq!(
            assess_tool_output(Some(0), "error: something", ""),
            Err(ToolFailure::OutputPattern("error without completion"))
        );
    }

    #[test]
    fn test_assess_stderr() {
        assert_eq!(
            assess_tool_output(Some(0), "Done!", "Unpack FAILED"),
            Err(ToolFailure::OutputPattern("error on stderr"))
        );
        assert!(assess_tool_output(Some(0), "Done!", "").is_ok());
    }

    #[test]
    fn test_convert_missing_tool() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("a.ptp");
        fs::write(&archive, "x").unwrap();

        let converter = PtpConverter::new(temp.path().join("missing.exe"));
        let result = converter.convert(&archive, temp.path());
        assert!(matches!(result, Err(LiveryError::ExternalToolMissing(_))));
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn write_tool(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("ptp_converter.sh");
            fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn test_convert_moves_native_output() {
            let tools = TempDir::new().unwrap();
            let work = TempDir::new().unwrap();
            let tool = write_tool(
                tools.path(),
                r#"out="$(dirname "$1")/$(basename "$1" .ptp)"
mkdir -p "$out/texture.X"
echo "[fltsim.0]" > "$out/Config.cfg"
echo "dds" > "$out/texture.X/a.dds"
echo "Done!""#,
            );
            let archive = work.path().join("Livery.ptp");
            fs::write(&archive, "ptp").unwrap();

            let staged = PtpConverter::new(&tool)
                .convert(&archive, work.path())
                .unwrap();

            assert!(staged.starts_with(work.path()));
            assert!(staged
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("__temp_ptp_Livery_"));
            assert!(staged.join("Config.cfg").is_file());
            assert!(staged.join("texture.X/a.dds").is_file());
        }

        #[test]
        fn test_convert_output_next_to_executable() {
            let tools = TempDir::new().unwrap();
            let work = TempDir::new().unwrap();
            let tool = write_tool(
                tools.path(),
                r#"out="$(pwd)/$(basename "$1" .ptp)"
mkdir -p "$out"
echo "x" > "$out/aircraft.cfg"
echo "Done!""#,
            );
            let archive = work.path().join("B.ptp");
            fs::write(&archive, "ptp").unwrap();

            let staged = PtpConverter::new(&tool)
                .convert(&archive, work.path())
                .unwrap();
            assert!(staged.join("aircraft.cfg").is_file());
            // The native directory next to the tool is gone.
            let leftovers: Vec<_> = fs::read_dir(tools.path())
                .unwrap()
                .flatten()
                .filter(|e| e.path().is_dir())
                .collect();
            assert!(leftovers.is_empty());
        }

        #[test]
        fn test_convert_with_relative_executable_path() {
            let tools = tempfile::Builder::new()
                .prefix(".lvi_tools_")
                .tempdir_in(".")
                .unwrap();
            let work = TempDir::new().unwrap();
            write_tool(
                tools.path(),
                r#"out="$(dirname "$1")/$(basename "$1" .ptp)"
mkdir -p "$out"
echo "[fltsim.0]" > "$out/Config.cfg"
echo "Done!""#,
            );
            let relative = PathBuf::from(tools.path().file_name().unwrap()).join("ptp_converter.sh");
            assert!(relative.is_relative());
            let archive = work.path().join("Rel.ptp");
            fs::write(&archive, "ptp").unwrap();

            let staged = PtpConverter::new(&relative)
                .convert(&archive, work.path())
                .unwrap();
            assert!(staged.join("Config.cfg").is_file());
        }

        #[test]
        fn test_convert_reports_exit_code() {
            let tools = TempDir::new().unwrap();
            let work = TempDir::new().unwrap();
            let tool = write_tool(tools.path(), "echo 'bad input' >&2\nexit 3");
            let archive = work.path().join("C.ptp");
            fs::write(&archive, "ptp").unwrap();

            let err = PtpConverter::new(&tool)
                .convert(&archive, work.path())
                .unwrap_err();
            match err {
                LiveryError::ExternalToolFailed {
                    failure,
                    diagnostics,
                    ..
                } => {
                    assert_eq!(failure, ToolFailure::ExitCode(3));
                    assert!(diagnostics.contains("bad input"));
                }
                other => panic!("unexpected error: {}", other),
            }
        }

        #[test]
        fn test_convert_empty_output_is_an_error() {
            let tools = TempDir::new().unwrap();
            let work = TempDir::new().unwrap();
            let tool = write_tool(
                tools.path(),
                r#"mkdir -p "$(dirname "$1")/$(basename "$1" .ptp)"
echo "Done!""#,
            );
            let archive = work.path().join("D.ptp");
            fs::write(&archive, "ptp").unwrap();

            let result = PtpConverter::new(&tool).convert(&archive, work.path());
            assert!(matches!(
                result,
                Err(LiveryError::ConverterOutputMissing { .. })
            ));
        }

        #[test]
        fn test_convert_times_out() {
            let tools = TempDir::new().unwrap();
            let work = TempDir::new().unwrap();
            let tool = write_tool(tools.path(), "exec sleep 5");
            let archive = work.path().join("E.ptp");
            fs::write(&archive, "ptp").unwrap();

            let started = Instant::now();
            let err = PtpConverter::new(&tool)
                .with_timeout(Duration::from_millis(200))
                .convert(&archive, work.path())
                .unwrap_err();

            assert!(started.elapsed() < Duration::from_secs(4));
            assert!(matches!(
                err,
                LiveryError::ExternalToolFailed {
                    failure: ToolFailure::TimedOut(_),
                    ..
                }
            ));
        }
    }
}
