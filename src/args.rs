use crate::error::Error;
use crate::region::{Region, RegionSet};
use crate::scheduler::BatchEntry;

use std::env;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Parsed command line: an ordered batch of videos, each with the region set
/// built from the `-r`/`--undo` flags that followed its `-i`.
pub struct Args {
    entries: Vec<(PathBuf, RegionSet)>,
}

impl Args {
    pub fn parse() -> Result<Self, Error> {
        let arguments: Vec<String> = env::args().skip(1).collect();

        if arguments.is_empty()
            || arguments.iter().any(|argument| argument == "-h" || argument == "--help")
        {
            Self::print_help();
            std::process::exit(0);
        }

        let args = Self::from_arguments(&arguments)?;
        Self::validate_ffmpeg_binary()?;
        args.validate_paths()?;
        Ok(args)
    }

    fn print_help() {
        println!("Usage: watermark_cleaner [OPTIONS]");
        println!("Options:");
        println!("  -i, --input FILE             Add a video (.mp4/.avi/.mov); repeatable");
        println!("  -r, --region X0,Y0,X1,Y1     Add a watermark rectangle to the last video");
        println!("      --undo                   Drop the last video's most recent rectangle");
        println!("  -h, --help                   Show this help message");
        println!();
        println!("Each -r applies to the -i that precedes it. Output is written next to");
        println!("the source with a _nowatermark suffix.");
    }

    pub fn print_options(&self) {
        println!("Videos: {}", self.entries.len());
        for (path, set) in &self.entries {
            if set.is_empty() {
                println!("  {} (no regions, will be skipped)", path.display());
            } else {
                println!("  {} ({} regions)", path.display(), set.len());
            }
        }
    }

    pub fn into_batch(self) -> Vec<BatchEntry> {
        self.entries
            .into_iter()
            .map(|(source, set)| BatchEntry {
                source,
                regions: set.freeze(),
            })
            .collect()
    }

    fn from_arguments(arguments: &[String]) -> Result<Self, Error> {
        let mut entries: Vec<(PathBuf, RegionSet)> = Vec::new();

        let mut i = 0;
        while i < arguments.len() {
            match arguments[i].as_str() {
                "-i" | "--input" => {
                    i += 1;
                    let value = arguments
                        .get(i)
                        .ok_or_else(|| Error::EmptyArgument("input".to_string()))?;
                    let path = PathBuf::from(value);
                    if entries.iter().any(|(existing, _)| existing == &path) {
                        return Err(Error::InvalidArgument(format!("duplicate input: {value}")));
                    }
                    entries.push((path, RegionSet::new()));
                }
                "-r" | "--region" => {
                    i += 1;
                    let value = arguments
                        .get(i)
                        .ok_or_else(|| Error::EmptyArgument("region".to_string()))?;
                    let region = Self::parse_region(value)?;
                    let (_, set) = entries.last_mut().ok_or_else(|| {
                        Error::InvalidArgument("--region given before any --input".to_string())
                    })?;
                    set.add(region);
                }
                "--undo" => {
                    let (_, set) = entries.last_mut().ok_or_else(|| {
                        Error::InvalidArgument("--undo given before any --input".to_string())
                    })?;
                    set.undo_last();
                }
                other => return Err(Error::UnknownArgument(other.to_string())),
            }
            i += 1;
        }

        if entries.is_empty() {
            return Err(Error::MissingArgument("input".to_string()));
        }
        Ok(Self { entries })
    }

    fn parse_region(value: &str) -> Result<Region, Error> {
        let parts: Vec<&str> = value.split(',').collect();
        if parts.len() != 4 {
            return Err(Error::InvalidArgument(format!("region: {value}")));
        }
        let mut coordinates = [0i32; 4];
        for (slot, part) in coordinates.iter_mut().zip(&parts) {
            *slot = part
                .trim()
                .parse()
                .map_err(|_| Error::InvalidArgument(format!("region: {value}")))?;
        }
        Ok(Region::new(
            coordinates[0],
            coordinates[1],
            coordinates[2],
            coordinates[3],
        ))
    }

    fn validate_ffmpeg_binary() -> Result<(), Error> {
        Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|_| ())
            .map_err(|_| Error::FfmpegNotAvailable)
    }

    fn validate_paths(&self) -> Result<(), Error> {
        for (path, _) in &self.entries {
            if !path.is_file() {
                return Err(Error::InputFileNotFound(path.clone()));
            }
        }
        Ok(())
    }
}
