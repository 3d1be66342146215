use crate::error::Error;
use crate::frame::Frame;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};

/// Decode half of the transcoder: streams the source through ffmpeg as a
/// PNG sequence on stdout and emits indexed frames, in source order, on a
/// bounded channel.
pub struct Decode {
    source: PathBuf,
    sender: Sender<Result<Frame, Error>>,
}

impl Decode {
    // Length + "IEND" + CRC; constant for every PNG, so it frames the stream.
    const PNG_FOOTER: &'static [u8] = &[
        0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];
    const CHUNK_SIZE: usize = 1024 * 100; // 100KB
    const MAX_FRAME_BYTES: usize = 1024 * 1024 * 32; // 32MB

    fn spawn_ffmpeg(&self) -> Result<Child, Error> {
        Command::new("ffmpeg")
            .arg("-hide_banner")
            .arg("-i")
            .arg(&self.source)
            .args(["-vsync", "0", "-f", "image2pipe", "-vcodec", "png", "pipe:1"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .spawn()
            .map_err(|_| Error::FfmpegFailed("decoding frames"))
    }

    fn find_frame_end(buffer: &[u8]) -> Option<usize> {
        buffer
            .windows(Self::PNG_FOOTER.len())
            .position(|window| window == Self::PNG_FOOTER)
            .map(|position| position + Self::PNG_FOOTER.len())
    }

    fn pump(&self, mut stdout: ChildStdout) {
        let mut pending = Vec::new();
        let mut chunk = vec![0u8; Self::CHUNK_SIZE];
        let mut index = 0usize;
        loop {
            let read = match stdout.read(&mut chunk) {
                Ok(read) => read,
                Err(error) => {
                    let _ = self.sender.send(Err(Error::Io(error)));
                    return;
                }
            };
            if read == 0 {
                if !pending.is_empty() {
                    // truncated trailing frame: ffmpeg died mid-stream
                    let _ = self.sender.send(Err(Error::FfmpegFailed("decoding frames")));
                }
                return;
            }
            pending.extend_from_slice(&chunk[..read]);
            while let Some(end) = Self::find_frame_end(&pending) {
                let bytes: Vec<u8> = pending.drain(..end).collect();
                match Frame::from_png_bytes(index, &bytes) {
                    Ok(frame) => {
                        index += 1;
                        if self.sender.send(Ok(frame)).is_err() {
                            return;
                        }
                    }
                    Err(error) => {
                        let _ = self.sender.send(Err(error));
                        return;
                    }
                }
            }
            if pending.len() > Self::MAX_FRAME_BYTES {
                let _ = self.sender.send(Err(Error::FrameBufferOverflow));
                return;
            }
        }
    }

    fn start(self) -> Result<(), Error> {
        let mut child = self.spawn_ffmpeg()?;
        let stdout = child.stdout.take().unwrap();

        thread::spawn(move || {
            self.pump(stdout);
            let _ = child.kill();
            let _ = child.wait();
        });

        Ok(())
    }

    pub fn execute(source: &Path) -> Result<Receiver<Result<Frame, Error>>, Error> {
        let (sender, receiver) = bounded(1);
        let this = Self {
            source: source.to_path_buf(),
            sender,
        };
        this.start()?;
        Ok(receiver)
    }
}
