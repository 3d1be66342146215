use crate::error::Error;

use std::path::Path;
use std::process::{Command, Stdio};

/// Attaches the original audio track to the cleaned silent stream and
/// encodes the final file (libx264 video, aac audio). The visual stream is
/// trimmed to the source duration so the audio never outlasts the video.
pub struct Remux;

impl Remux {
    pub fn execute(
        intermediate: &Path,
        source: &Path,
        duration: f64,
        output: &Path,
        has_audio: bool,
    ) -> Result<(), Error> {
        let mut command = Command::new("ffmpeg");
        command
            .args(["-hide_banner", "-y"])
            .arg("-i")
            .arg(intermediate)
            .arg("-i")
            .arg(source)
            .args(["-t", &format!("{duration:.6}")])
            .args(["-map", "0:v:0"]);
        if has_audio {
            command.args(["-map", "1:a:0", "-c:a", "aac"]);
        }
        command
            .args(["-c:v", "libx264"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let result = command
            .output()
            .map_err(|_| Error::FfmpegFailed("attaching the audio track"))?;
        if result.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&result.stderr);
        let reason = stderr
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("ffmpeg exited with an error")
            .to_string();
        Err(Error::MuxFailed(reason))
    }
}
