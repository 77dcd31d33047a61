use crate::config::GeneratorConfig;
use crate::error::GenerationError;
use crate::models::{GeneratedFile, GeneratorArgs};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// Runs the solacon executable. The program is spawned directly with an
/// argument vector, never through a shell.
#[derive(Debug, Clone)]
pub struct GeneratorRunner {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl GeneratorRunner {
    pub fn new(program: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.solacon_path.clone(), config.command_timeout())
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Whether the executable is on disk right now.
    pub async fn is_available(&self) -> bool {
        tokio::fs::metadata(&self.program)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Check the executable, run it and parse what it printed.
    pub async fn generate(&self, args: &GeneratorArgs) -> Result<GeneratedFile, GenerationError> {
        if !self.is_available().await {
            return Err(GenerationError::GeneratorMissing(self.program.clone()));
        }

        let stdout = self.run(args).await?;

        Ok(GeneratedFile::parse(&stdout)?)
    }

    /// Spawn the generator and capture its stdout.
    ///
    /// The exit status is logged but does not decide the outcome; only the
    /// shape of the output does.
    pub async fn run(&self, args: &GeneratorArgs) -> Result<String, GenerationError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args.as_slice())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            program = ?self.program,
            args = ?args.as_slice(),
            timeout_secs = ?self.timeout.map(|t| t.as_secs()),
            "Executing generator"
        );

        let output = self.wait(&mut cmd).await?;

        if !output.status.success() {
            tracing::warn!(
                program = ?self.program,
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr),
                "Generator exited unsuccessfully"
            );
        }

        if output.stdout.is_empty() {
            return Err(GenerationError::EmptyOutput);
        }

        tracing::debug!(
            program = ?self.program,
            output_size = output.stdout.len(),
            "Generator finished"
        );

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn wait(&self, cmd: &mut Command) -> Result<Output, GenerationError> {
        match self.timeout {
            // Dropping the `output()` future on timeout kills the child.
            Some(timeout) => tokio::time::timeout(timeout, cmd.output())
                .await
                .map_err(|_| GenerationError::TimedOut(timeout.as_secs()))?
                .map_err(GenerationError::Spawn),
            None => cmd.output().await.map_err(GenerationError::Spawn),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::OutputError;
    use crate::models::IconParams;
    use std::os::unix::fs::PermissionsExt;

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("solacon.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn default_args() -> GeneratorArgs {
        IconParams::default().validate().to_args()
    }

    #[tokio::test]
    async fn missing_executable_is_reported_without_spawning() {
        let runner = GeneratorRunner::new("/nonexistent/solacon.sh", None);

        assert!(!runner.is_available().await);
        let err = runner.generate(&default_args()).await.unwrap_err();
        assert!(matches!(err, GenerationError::GeneratorMissing(_)));
    }

    #[tokio::test]
    async fn directory_is_not_an_executable() {
        let dir = tempfile::tempdir().unwrap();
        let runner = GeneratorRunner::new(dir.path(), None);

        assert!(!runner.is_available().await);
    }

    #[tokio::test]
    async fn passes_arguments_without_shell_interpretation() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), r#"for arg in "$@"; do printf '%s\n' "$arg"; done"#);
        let runner = GeneratorRunner::new(script, None);
        let args = IconParams::from_query(Some("string=%24%28id%29%3B+echo+pwned&size=32"))
            .validate()
            .to_args();

        let stdout = runner.run(&args).await.unwrap();

        let lines: Vec<&str> = stdout.lines().collect();
        assert_eq!(lines, ["-r", "name+b64", "-s", "32", "-t", "$(id); echo pwned"]);
    }

    #[tokio::test]
    async fn parses_successful_output() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "printf 'icon.png\\naGVsbG8=\\n'");
        let runner = GeneratorRunner::new(script, None);

        let file = runner.generate(&default_args()).await.unwrap();

        assert_eq!(file.name, "icon.png");
        assert_eq!(file.content, b"hello");
    }

    #[tokio::test]
    async fn output_shape_wins_over_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "printf 'icon.png\\naGVsbG8=\\n'; exit 3");
        let runner = GeneratorRunner::new(script, None);

        assert!(runner.generate(&default_args()).await.is_ok());
    }

    #[tokio::test]
    async fn silent_generator_is_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "echo 'boom' >&2; exit 1");
        let runner = GeneratorRunner::new(script, None);

        let err = runner.generate(&default_args()).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyOutput));
    }

    #[tokio::test]
    async fn single_line_output_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "echo 'usage: solacon [options]'");
        let runner = GeneratorRunner::new(script, None);

        let err = runner.generate(&default_args()).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::MalformedOutput(OutputError::MissingContent)
        ));
    }

    #[tokio::test]
    async fn slow_generator_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "sleep 5; printf 'icon.png\\naGk=\\n'");
        let runner = GeneratorRunner::new(script, Some(Duration::from_millis(200)));

        let err = runner.generate(&default_args()).await.unwrap_err();
        assert!(matches!(err, GenerationError::TimedOut(_)));
    }
}
