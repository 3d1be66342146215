use crate::error::Error;
use crate::frame::Frame;

use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};

/// Encode half of the transcoder: feeds cleaned frames to ffmpeg as a PNG
/// sequence on stdin and writes the intermediate silent file with the fixed
/// XVID codec tag at the source frame rate.
pub struct Encode {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl Encode {
    pub fn start(target: &Path, frame_rate: f64) -> Result<Self, Error> {
        let mut child = Command::new("ffmpeg")
            .args(["-hide_banner", "-y"])
            .args(["-f", "image2pipe", "-vcodec", "png"])
            .args(["-r", &frame_rate.to_string()])
            .args(["-i", "-"])
            .args(["-c:v", "mpeg4", "-vtag", "XVID", "-q:v", "3", "-an"])
            .args(["-r", &frame_rate.to_string()])
            .arg(target)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|_| Error::FfmpegFailed("encoding the intermediate video"))?;
        let stdin = child.stdin.take();
        Ok(Self { child, stdin })
    }

    pub fn write_frame(&mut self, frame: &Frame) -> Result<(), Error> {
        let bytes = frame.to_png_bytes()?;
        let stdin = self
            .stdin
            .as_mut()
            .ok_or(Error::FfmpegFailed("encoding the intermediate video"))?;
        stdin.write_all(&bytes)?;
        Ok(())
    }

    /// Closes the frame stream and waits for the encoder to flush the file.
    pub fn finish(mut self) -> Result<(), Error> {
        if let Some(mut stdin) = self.stdin.take() {
            let _ = stdin.flush();
            drop(stdin);
        }
        let status = self.child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::FfmpegFailed("encoding the intermediate video"))
        }
    }
}

impl Drop for Encode {
    fn drop(&mut self) {
        if self.stdin.is_some() {
            // abandoned before finish(): stop the encoder instead of leaking it
            self.stdin = None;
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
