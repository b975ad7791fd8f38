use super::{Error, Result};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Interface to animation file writers
pub trait AnimationEncoder {
    /// Assembles the `frames` image files, in order, into the animation `out_path`
    ///
    /// The animation is written inside `work_dir` and moved to `out_path` once
    /// complete; the frame files and `work_dir` are then removed.
    fn encode(&self, frames: &[PathBuf], out_path: &Path, work_dir: &Path) -> Result<()>;
}

/// GIF animation writer
#[derive(Debug, Clone, Copy)]
pub struct GifAnimator {
    /// Display time of each frame
    pub frame_duration: Duration,
    pub loop_forever: bool,
}

impl GifAnimator {
    pub const TEMP_FILE_NAME: &'static str = "temp.gif";

    pub fn new(frame_duration: Duration) -> Self {
        Self {
            frame_duration,
            loop_forever: true,
        }
    }
    fn write_gif(&self, frames: &[PathBuf], path: &Path) -> Result<()> {
        let mut encoder = GifEncoder::new(BufWriter::new(File::create(path)?));
        if self.loop_forever {
            encoder.set_repeat(Repeat::Infinite)?;
        }
        let delay = Delay::from_saturating_duration(self.frame_duration);
        for frame in frames {
            if !frame.exists() {
                return Err(Error::FileNotFound(frame.clone()));
            }
            let rgba = image::open(frame)?.to_rgba8();
            encoder.encode_frame(Frame::from_parts(rgba, 0, 0, delay))?;
        }
        Ok(())
    }
}

impl AnimationEncoder for GifAnimator {
    fn encode(&self, frames: &[PathBuf], out_path: &Path, work_dir: &Path) -> Result<()> {
        fs::create_dir_all(work_dir)?;
        let temp = work_dir.join(Self::TEMP_FILE_NAME);
        self.write_gif(frames, &temp)?;
        fs::rename(&temp, out_path).map_err(|source| Error::Persist {
            from: temp.clone(),
            to: out_path.to_path_buf(),
            source,
        })?;
        for frame in frames {
            fs::remove_file(frame)?;
        }
        fs::remove_dir(work_dir)?;
        Ok(())
    }
}
