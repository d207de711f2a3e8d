use async_trait::async_trait;
use tokio::process::Command;

/// Joins per-chunk audio segments into one playable payload.
/// Abstracts the external concatenation utility so tests can substitute an
/// in-memory implementation.
#[async_trait]
pub trait AudioJoiner: Send + Sync {
    /// Join the given segments, in order, into a single audio payload.
    ///
    /// Every segment is expected to be a complete audio clip in the same
    /// codec; failed chunks arrive here already substituted with silence.
    async fn join(&self, parts: &[Vec<u8>]) -> Result<Vec<u8>, AudioJoinError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AudioJoinError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("concat utility failed: {0}")]
    Utility(String),
}

const MANIFEST_NAME: &str = "files.txt";
const JOINED_NAME: &str = "joined.mp3";

/// Joins segments losslessly with ffmpeg's concat demuxer (`-c copy`, no
/// re-encoding). Segment files and the list manifest live in a scoped temp
/// directory that is removed when the join finishes, on every path.
pub struct FfmpegJoiner {
    binary: String,
}

impl FfmpegJoiner {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl AudioJoiner for FfmpegJoiner {
    async fn join(&self, parts: &[Vec<u8>]) -> Result<Vec<u8>, AudioJoinError> {
        if parts.is_empty() {
            return Err(AudioJoinError::Utility("no segments to join".to_string()));
        }

        let workdir = tempfile::tempdir()?;

        for (index, part) in parts.iter().enumerate() {
            tokio::fs::write(workdir.path().join(part_name(index)), part).await?;
        }
        tokio::fs::write(workdir.path().join(MANIFEST_NAME), render_manifest(parts.len())).await?;

        tracing::debug!(
            segment_count = parts.len(),
            workdir = %workdir.path().display(),
            "Running concat utility"
        );

        let output = Command::new(&self.binary)
            .current_dir(workdir.path())
            .args([
                "-y", "-f", "concat", "-safe", "0", "-i", MANIFEST_NAME, "-c", "copy", JOINED_NAME,
            ])
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(
                status = ?output.status.code(),
                stderr = %stderr,
                "Concat utility exited with failure"
            );
            return Err(AudioJoinError::Utility(format!(
                "{} exited with {:?}",
                self.binary,
                output.status.code()
            )));
        }

        let joined = tokio::fs::read(workdir.path().join(JOINED_NAME)).await?;
        if joined.is_empty() {
            return Err(AudioJoinError::Utility(
                "concat utility produced an empty file".to_string(),
            ));
        }

        tracing::debug!(joined_size = joined.len(), "Segments joined");

        Ok(joined)
    }
}

fn part_name(index: usize) -> String {
    format!("part_{:04}.mp3", index)
}

fn render_manifest(count: usize) -> String {
    let mut manifest = String::new();
    for index in 0..count {
        manifest.push_str(&format!("file '{}'\n", part_name(index)));
    }
    manifest
}
