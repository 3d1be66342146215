mod args;
mod error;
mod frame;
mod inpaint;
mod job;
mod mask;
mod region;
mod scheduler;
mod stages;
mod video;

use args::Args;
use error::Error;
use scheduler::{Event, Scheduler};

use std::path::PathBuf;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

fn job_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{wide_bar:.white/green}] {pos}/{len} {msg}")
        .unwrap()
        .progress_chars("█▓▒░-")
}

fn overall_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{bar:30.white/green} {pos}/{len} videos | {msg}")
        .unwrap()
        .progress_chars("█▓▒░-")
}

fn run_batch() -> Result<(), Error> {
    let args = Args::parse()?;
    args.print_options();

    let (jobs, events) = Scheduler::submit_batch(args.into_batch())?;

    let multi = MultiProgress::new();
    let overall = multi.add(
        ProgressBar::new(jobs.len() as u64)
            .with_style(overall_style())
            .with_message("estimated time remaining: --"),
    );
    let bars: Vec<ProgressBar> = jobs
        .iter()
        .map(|job| {
            let name = job
                .source
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            multi.add(ProgressBar::new(0).with_style(job_style()).with_message(name))
        })
        .collect();

    let mut failures: Vec<(PathBuf, Error)> = Vec::new();
    for event in events.iter() {
        match event {
            Event::FrameProgress { id, done, total } => {
                let bar = &bars[id];
                if bar.length() != Some(total as u64) {
                    bar.set_length(total as u64);
                }
                bar.set_position(done as u64);
            }
            Event::JobComplete { id, result } => {
                overall.inc(1);
                match result {
                    Ok(path) => bars[id].finish_with_message(format!("-> {}", path.display())),
                    Err(error) => {
                        bars[id].abandon_with_message(format!("failed: {error}"));
                        if let Some(spec) = jobs.iter().find(|spec| spec.id == id) {
                            failures.push((spec.source.clone(), error));
                        }
                    }
                }
            }
            Event::EtaUpdate { seconds_remaining } => {
                overall.set_message(format!("estimated time remaining: {seconds_remaining:.2}s"));
            }
            Event::BatchComplete => break,
        }
    }
    overall.finish_with_message("all videos processed");

    if failures.is_empty() {
        return Ok(());
    }
    for (path, error) in &failures {
        eprintln!("{}: {}", path.display(), error);
    }
    Err(Error::JobsFailed {
        failed: failures.len(),
        total: jobs.len(),
    })
}

fn main() {
    if let Err(error) = run_batch() {
        eprintln!("Error: {}", error);
        std::process::exit(1);
    } else {
        println!("Completed!");
    }
}
