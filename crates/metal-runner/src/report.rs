//! Surfaces the outcome of a run to the GitHub Actions runner.

use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use metal_provision::ProvisioningResult;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write outputs to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes step outputs and failure annotations.
#[derive(Debug, Clone)]
pub struct Reporter {
    output_file: Option<PathBuf>,
}

impl Reporter {
    /// Outputs go to the file named by `GITHUB_OUTPUT`, or stdout when unset.
    pub fn from_env() -> Self {
        Self {
            output_file: env::var_os("GITHUB_OUTPUT")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    #[cfg(test)]
    pub fn with_output_file(path: impl Into<PathBuf>) -> Self {
        Self {
            output_file: Some(path.into()),
        }
    }

    pub fn success(&self, result: &ProvisioningResult) -> Result<(), ReportError> {
        let lines = output_lines(result);

        let Some(path) = &self.output_file else {
            print!("{lines}");
            return Ok(());
        };

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(lines.as_bytes()))
            .map_err(|source| ReportError::Write {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(path = %path.display(), "outputs written");
        Ok(())
    }

    pub fn failure(&self, err: &dyn std::error::Error) {
        println!("{}", error_command(err));
    }
}

fn output_lines(result: &ProvisioningResult) -> String {
    format!(
        "server_id={}\nip_address={}\n",
        result.server_id, result.ip_address
    )
}

/// `::error::` workflow command for a failed run.
fn error_command(err: &dyn std::error::Error) -> String {
    format!(
        "::error::{}",
        escape_data(&format!("Failed to create server: {err}"))
    )
}

fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
