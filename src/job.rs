use crate::error::Error;
use crate::inpaint::inpaint;
use crate::mask::build_mask;
use crate::region::Region;
use crate::stages::{Decode, Encode, Remux};
use crate::video::VideoMeta;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;

pub type JobId = usize;

/// Raw events a worker sends to the scheduler's aggregator.
#[derive(Debug)]
pub enum JobEvent {
    Frame {
        id: JobId,
        done: usize,
        total: usize,
    },
    Done {
        id: JobId,
        elapsed: Duration,
        result: Result<PathBuf, Error>,
    },
}

/// Processes exactly one source video end to end: probe, frame-by-frame
/// inpainting into the intermediate file, audio remux, cleanup. Owns its own
/// ffmpeg handles and intermediate file; shares nothing with sibling jobs.
pub struct ProcessingJob {
    pub id: JobId,
    pub source: PathBuf,
    pub regions: Vec<Region>,
}

impl ProcessingJob {
    pub fn run(self, events: Sender<JobEvent>) {
        let started = Instant::now();
        let result = self.process(&events);
        let _ = events.send(JobEvent::Done {
            id: self.id,
            elapsed: started.elapsed(),
            result,
        });
    }

    fn process(&self, events: &Sender<JobEvent>) -> Result<PathBuf, Error> {
        let meta = VideoMeta::probe(&self.source)?;
        let intermediate = intermediate_path(&self.source);
        let _cleanup = IntermediateGuard::new(intermediate.clone());

        let frames = Decode::execute(&self.source)?;
        let mut sink = Encode::start(&intermediate, meta.frame_rate)?;
        let mut done = 0usize;
        for received in frames.iter() {
            let mut frame = received?;
            let (width, height) = frame.image.dimensions();
            let mask = build_mask(width, height, &self.regions);
            inpaint(&mut frame.image, &mask);
            sink.write_frame(&frame)?;
            done = frame.index + 1;
            events
                .send(JobEvent::Frame {
                    id: self.id,
                    done,
                    total: meta.frame_count,
                })
                .map_err(|_| Error::SendError)?;
        }
        sink.finish()?;
        if done != meta.frame_count {
            return Err(Error::FfmpegFailed("decoding frames"));
        }

        let output = output_path(&self.source);
        Remux::execute(
            &intermediate,
            &self.source,
            meta.duration(),
            &output,
            meta.has_audio,
        )?;
        Ok(output)
    }
}

/// Removes the job-private intermediate file on every exit path.
struct IntermediateGuard {
    path: PathBuf,
}

impl IntermediateGuard {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Drop for IntermediateGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Job-private silent file, written next to the source. XVID lives in an
/// .avi container regardless of the source extension.
pub fn intermediate_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{stem}_nowatermark_tmp.avi"))
}

/// Final output, written next to the source in the source's own container.
pub fn output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = source
        .extension()
        .map(|extension| extension.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("mp4"));
    source.with_file_name(format!("{stem}_nowatermark.{extension}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intermediate_path_is_source_derived_avi() {
        let path = intermediate_path(Path::new("/videos/holiday.mp4"));
        assert_eq!(path, Path::new("/videos/holiday_nowatermark_tmp.avi"));
    }

    #[test]
    fn output_path_keeps_the_source_container() {
        let path = output_path(Path::new("/videos/holiday.mov"));
        assert_eq!(path, Path::new("/videos/holiday_nowatermark.mov"));
    }

    #[test]
    fn output_path_does_not_collide_with_source_or_intermediate() {
        let source = Path::new("clip.avi");
        let output = output_path(source);
        let intermediate = intermediate_path(source);
        assert_ne!(output, source);
        assert_ne!(output, intermediate);
        assert_ne!(intermediate, source);
    }
}
