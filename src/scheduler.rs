use crate::error::Error;
use crate::job::{JobEvent, JobId, ProcessingJob};
use crate::region::Region;

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};

pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp4", "avi", "mov"];

/// One submitted video with its frozen region list.
#[derive(Debug)]
pub struct BatchEntry {
    pub source: PathBuf,
    pub regions: Vec<Region>,
}

/// Identity of a started job, for the collaborator's display.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub id: JobId,
    pub source: PathBuf,
}

/// Aggregated events the scheduler reports to the collaborator.
#[derive(Debug)]
pub enum Event {
    FrameProgress {
        id: JobId,
        done: usize,
        total: usize,
    },
    JobComplete {
        id: JobId,
        result: Result<PathBuf, Error>,
    },
    EtaUpdate {
        seconds_remaining: f64,
    },
    BatchComplete,
}

/// Fans one worker thread out per eligible video, eagerly and without a cap,
/// and aggregates their events into a single outward stream.
pub struct Scheduler;

impl Scheduler {
    /// Validates the batch and starts every eligible job at once. Input
    /// errors are returned synchronously before any job runs; after this
    /// returns, the only way to observe the batch is the event stream.
    pub fn submit_batch(entries: Vec<BatchEntry>) -> Result<(Vec<JobSpec>, Receiver<Event>), Error> {
        let eligible = eligible_entries(entries)?;
        let specs: Vec<JobSpec> = eligible
            .iter()
            .enumerate()
            .map(|(id, entry)| JobSpec {
                id,
                source: entry.source.clone(),
            })
            .collect();

        let (job_sender, job_receiver) = unbounded();
        for (id, entry) in eligible.into_iter().enumerate() {
            let job = ProcessingJob {
                id,
                source: entry.source,
                regions: entry.regions,
            };
            let sender = job_sender.clone();
            thread::spawn(move || job.run(sender));
        }
        drop(job_sender);

        let (event_sender, event_receiver) = unbounded();
        let total = specs.len();
        thread::spawn(move || aggregate(total, job_receiver, event_sender));
        Ok((specs, event_receiver))
    }
}

/// Checks extensions, drops videos without regions, and rejects a batch
/// where nothing is left to do.
fn eligible_entries(entries: Vec<BatchEntry>) -> Result<Vec<BatchEntry>, Error> {
    for entry in &entries {
        let supported = entry
            .source
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| SUPPORTED_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if !supported {
            return Err(Error::UnsupportedFormat(entry.source.clone()));
        }
    }
    let eligible: Vec<BatchEntry> = entries
        .into_iter()
        .filter(|entry| !entry.regions.is_empty())
        .collect();
    if eligible.is_empty() {
        return Err(Error::NoRegionsDefined);
    }
    Ok(eligible)
}

/// Remaining seconds for the batch, derived from the most recently finished
/// job's duration (not an average), kept for compatibility with the prior
/// behavior.
fn estimate_remaining(last_job_elapsed: Duration, total: usize, completed: usize) -> f64 {
    last_job_elapsed.as_secs_f64() * (total - completed) as f64
}

/// Single owner of the aggregate counters; every worker event funnels
/// through this thread, so completion counting and the ETA never race.
fn aggregate(total: usize, jobs: Receiver<JobEvent>, events: Sender<Event>) {
    let mut completed = 0usize;
    for event in jobs.iter() {
        match event {
            JobEvent::Frame { id, done, total: frames } => {
                if events
                    .send(Event::FrameProgress {
                        id,
                        done,
                        total: frames,
                    })
                    .is_err()
                {
                    return;
                }
            }
            JobEvent::Done { id, elapsed, result } => {
                // failed jobs count toward completion so the batch always finishes
                completed += 1;
                let _ = events.send(Event::JobComplete { id, result });
                let _ = events.send(Event::EtaUpdate {
                    seconds_remaining: estimate_remaining(elapsed, total, completed),
                });
                if completed == total {
                    let _ = events.send(Event::BatchComplete);
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(source: &str, regions: usize) -> BatchEntry {
        BatchEntry {
            source: PathBuf::from(source),
            regions: (0..regions)
                .map(|i| Region::new(i as i32, 0, i as i32 + 10, 10))
                .collect(),
        }
    }

    #[test]
    fn videos_without_regions_are_skipped() {
        let eligible =
            eligible_entries(vec![entry("a.mp4", 2), entry("b.mp4", 0), entry("c.mov", 1)])
                .unwrap();
        assert_eq!(eligible.len(), 2);
        assert_eq!(eligible[0].source, PathBuf::from("a.mp4"));
        assert_eq!(eligible[1].source, PathBuf::from("c.mov"));
    }

    #[test]
    fn batch_with_no_regions_anywhere_is_an_input_error() {
        let result = eligible_entries(vec![entry("a.mp4", 0), entry("b.mp4", 0)]);
        assert!(matches!(result, Err(Error::NoRegionsDefined)));
    }

    #[test]
    fn unsupported_extension_is_rejected_before_anything_starts() {
        let result = eligible_entries(vec![entry("a.mp4", 1), entry("b.mkv", 1)]);
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(eligible_entries(vec![entry("a.MP4", 1)]).is_ok());
    }

    #[test]
    fn eta_uses_the_last_job_duration_times_jobs_left() {
        assert_eq!(estimate_remaining(Duration::from_secs(4), 5, 2), 12.0);
        assert_eq!(estimate_remaining(Duration::from_secs(4), 5, 5), 0.0);
    }

    #[test]
    fn batch_complete_fires_once_after_every_job_reports() {
        let (job_sender, job_receiver) = unbounded();
        let (event_sender, event_receiver) = unbounded();
        let aggregator = thread::spawn(move || aggregate(3, job_receiver, event_sender));

        job_sender
            .send(JobEvent::Frame { id: 0, done: 1, total: 10 })
            .unwrap();
        job_sender
            .send(JobEvent::Done {
                id: 0,
                elapsed: Duration::from_secs(2),
                result: Ok(PathBuf::from("a_nowatermark.mp4")),
            })
            .unwrap();
        job_sender
            .send(JobEvent::Done {
                id: 1,
                elapsed: Duration::from_secs(1),
                result: Err(Error::FfmpegFailed("decoding frames")),
            })
            .unwrap();
        job_sender
            .send(JobEvent::Done {
                id: 2,
                elapsed: Duration::from_secs(3),
                result: Ok(PathBuf::from("c_nowatermark.mp4")),
            })
            .unwrap();
        drop(job_sender);
        aggregator.join().unwrap();

        let events: Vec<Event> = event_receiver.iter().collect();
        let completions: Vec<bool> = events
            .iter()
            .filter_map(|event| match event {
                Event::JobComplete { result, .. } => Some(result.is_ok()),
                _ => None,
            })
            .collect();
        assert_eq!(completions, vec![true, false, true]);

        let batch_completes = events
            .iter()
            .filter(|event| matches!(event, Event::BatchComplete))
            .count();
        assert_eq!(batch_completes, 1);
        assert!(matches!(events.last(), Some(Event::BatchComplete)));
    }

    #[test]
    fn eta_follows_each_completion() {
        let (job_sender, job_receiver) = unbounded();
        let (event_sender, event_receiver) = unbounded();
        let aggregator = thread::spawn(move || aggregate(2, job_receiver, event_sender));

        job_sender
            .send(JobEvent::Done {
                id: 0,
                elapsed: Duration::from_secs(6),
                result: Ok(PathBuf::from("a_nowatermark.mp4")),
            })
            .unwrap();
        job_sender
            .send(JobEvent::Done {
                id: 1,
                elapsed: Duration::from_secs(4),
                result: Ok(PathBuf::from("b_nowatermark.mp4")),
            })
            .unwrap();
        drop(job_sender);
        aggregator.join().unwrap();

        let etas: Vec<f64> = event_receiver
            .iter()
            .filter_map(|event| match event {
                Event::EtaUpdate { seconds_remaining } => Some(seconds_remaining),
                _ => None,
            })
            .collect();
        assert_eq!(etas, vec![6.0, 0.0]);
    }
}
