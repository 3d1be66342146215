use crate::error::Error;

use std::path::Path;
use std::process::Command;

/// Source video metadata read with ffprobe before a job starts.
#[derive(Debug, Clone)]
pub struct VideoMeta {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub frame_count: usize,
    pub has_audio: bool,
}

impl VideoMeta {
    pub fn probe(path: &Path) -> Result<Self, Error> {
        let output = Command::new("ffprobe")
            .args([
                "-hide_banner",
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-count_frames",
                "-show_entries",
                "stream=nb_read_frames,r_frame_rate,width,height",
                "-of",
                "default=noprint_wrappers=1",
            ])
            .arg(path)
            .output()
            .map_err(|_| Error::FfmpegNotAvailable)?;

        let data = String::from_utf8_lossy(&output.stdout);
        let mut meta = Self {
            width: 0,
            height: 0,
            frame_rate: 0.0,
            frame_count: 0,
            has_audio: false,
        };
        for line in data.lines() {
            if let Some((key, value)) = line.split_once('=') {
                match key {
                    "nb_read_frames" => {
                        meta.frame_count = value.parse().map_err(|_| {
                            Error::ProbeFailed(format!("invalid frame count: {value}"))
                        })?
                    }
                    "r_frame_rate" => meta.frame_rate = Self::parse_frame_rate(value)?,
                    "width" => {
                        meta.width = value
                            .parse()
                            .map_err(|_| Error::ProbeFailed(format!("invalid width: {value}")))?
                    }
                    "height" => {
                        meta.height = value
                            .parse()
                            .map_err(|_| Error::ProbeFailed(format!("invalid height: {value}")))?
                    }
                    _ => {}
                }
            }
        }
        if meta.width == 0 || meta.height == 0 || meta.frame_rate <= 0.0 || meta.frame_count == 0 {
            let reason = String::from_utf8_lossy(&output.stderr);
            let reason = reason.lines().last().unwrap_or("no decodable video stream");
            return Err(Error::ProbeFailed(format!(
                "{}: {}",
                path.display(),
                reason
            )));
        }
        meta.has_audio = Self::probe_audio(path)?;
        Ok(meta)
    }

    /// Duration of the visual stream; exact because the transcode preserves
    /// the frame count and rate (constant frame rate assumed).
    pub fn duration(&self) -> f64 {
        self.frame_count as f64 / self.frame_rate
    }

    fn probe_audio(path: &Path) -> Result<bool, Error> {
        let output = Command::new("ffprobe")
            .args([
                "-hide_banner",
                "-v",
                "error",
                "-select_streams",
                "a",
                "-show_entries",
                "stream=codec_type",
                "-of",
                "csv=p=0",
            ])
            .arg(path)
            .output()
            .map_err(|_| Error::FfmpegNotAvailable)?;
        Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
    }

    fn parse_frame_rate(value: &str) -> Result<f64, Error> {
        let parts: Vec<&str> = value.split('/').collect();
        if parts.len() != 2 {
            return Err(Error::ProbeFailed(format!("invalid frame rate: {value}")));
        }
        let numerator = parts[0]
            .parse::<f64>()
            .map_err(|_| Error::ProbeFailed(format!("invalid frame rate numerator: {}", parts[0])))?;
        let denominator = parts[1]
            .parse::<f64>()
            .map_err(|_| Error::ProbeFailed(format!("invalid frame rate denominator: {}", parts[1])))?;
        if denominator == 0.0 {
            return Err(Error::ProbeFailed(format!("invalid frame rate: {value}")));
        }
        Ok(numerator / denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fractional_frame_rate() {
        let rate = VideoMeta::parse_frame_rate("30000/1001").unwrap();
        assert!((rate - 29.97).abs() < 0.01);
    }

    #[test]
    fn rejects_malformed_frame_rate() {
        assert!(VideoMeta::parse_frame_rate("30").is_err());
        assert!(VideoMeta::parse_frame_rate("x/y").is_err());
        assert!(VideoMeta::parse_frame_rate("30/0").is_err());
    }

    #[test]
    fn duration_is_frames_over_rate() {
        let meta = VideoMeta {
            width: 640,
            height: 480,
            frame_rate: 25.0,
            frame_count: 250,
            has_audio: true,
        };
        assert_eq!(meta.duration(), 10.0);
    }
}
