#![allow(dead_code)]

use service_core::config::Config as CoreConfig;
use solacon_service::config::{FailureMode, GeneratorConfig, SolaconConfig};
use solacon_service::startup::Application;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Base64 of `ICON_BYTES`.
pub const ICON_B64: &str = "UE5HLUJZVEVTAAECAw==";
pub const ICON_BYTES: &[u8] = b"PNG-BYTES\x00\x01\x02\x03";

/// Generator that logs its arguments next to itself and prints a valid icon.
pub fn recording_generator() -> String {
    format!(
        r#"for arg in "$@"; do printf '%s\n' "$arg"; done > "$(dirname "$0")/args.log"
printf 'solacon.png\n%s\n' '{ICON_B64}'"#
    )
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub dir: TempDir,
    pub generator_path: PathBuf,
}

impl TestApp {
    /// Spawn with a generator script whose body is `script`.
    pub async fn spawn(script: &str) -> Self {
        Self::spawn_with(Some(script), FailureMode::Fallthrough).await
    }

    /// Spawn with `script` as the generator, or with a path that does not
    /// exist when `script` is `None`.
    pub async fn spawn_with(script: Option<&str>, failure_mode: FailureMode) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let generator_path = dir.path().join("solacon.sh");

        if let Some(body) = script {
            write_script(&generator_path, body);
        }

        let config = SolaconConfig {
            common: CoreConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port for testing
                ..CoreConfig::default()
            },
            generator: GeneratorConfig {
                solacon_path: generator_path.clone(),
                failure_mode,
                command_timeout_secs: Some(10),
            },
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            dir,
            generator_path,
        }
    }

    pub async fn get_icon(&self, query: &str) -> reqwest::Response {
        reqwest::Client::new()
            .get(format!("{}/?{}", self.address, query))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Arguments the recording generator saw on its last run.
    pub fn recorded_args(&self) -> Option<Vec<String>> {
        std::fs::read_to_string(self.dir.path().join("args.log"))
            .ok()
            .map(|s| s.lines().map(str::to_string).collect())
    }
}

pub fn write_script(path: &Path, body: &str) {
    std::fs::write(path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to make script executable");
}
