//! Image-sequence frame source.
//!
//! Reads a directory of numbered JPEG/PNG frames in lexicographic order,
//! which is how exported video frame dumps are laid out. The path is
//! validated eagerly so a missing directory fails before the pipeline
//! transitions out of `Idle`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use super::FrameSource;
use crate::frame::Frame;

const FRAME_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

pub struct FileSource {
    dir: PathBuf,
    /// Sorted frame paths, filled by `open`.
    entries: Vec<PathBuf>,
    cursor: usize,
    frame_size: Option<(u32, u32)>,
    opened: bool,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(anyhow!("frame directory not found: {}", dir.display()));
        }
        Ok(Self {
            dir,
            entries: Vec::new(),
            cursor: 0,
            frame_size: None,
            opened: false,
        })
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            FRAME_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

impl FrameSource for FileSource {
    fn open(&mut self) -> Result<()> {
        let mut entries: Vec<PathBuf> = fs::read_dir(&self.dir)
            .with_context(|| format!("failed to read frame directory {}", self.dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_frame_file(path))
            .collect();
        entries.sort();

        if entries.is_empty() {
            return Err(anyhow!(
                "no frame images (jpg/png/bmp) in {}",
                self.dir.display()
            ));
        }

        log::info!(
            "file source opened: {} ({} frames)",
            self.dir.display(),
            entries.len()
        );
        self.entries = entries;
        self.cursor = 0;
        self.opened = true;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if !self.opened || self.cursor >= self.entries.len() {
            return Ok(None);
        }
        let path = &self.entries[self.cursor];
        self.cursor += 1;

        let image = image::open(path)
            .with_context(|| format!("failed to decode frame {}", path.display()))?
            .into_rgb8();
        let frame = Frame::from_image(image);
        // Size reported from the first decoded frame.
        if self.frame_size.is_none() {
            self.frame_size = Some((frame.width(), frame.height()));
        }
        Ok(Some(frame))
    }

    fn close(&mut self) {
        if self.opened {
            log::info!("file source closed: {}", self.dir.display());
        }
        self.opened = false;
        self.entries.clear();
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        self.frame_size
    }

    fn total_frames(&self) -> Option<u64> {
        if self.opened {
            Some(self.entries.len() as u64)
        } else {
            None
        }
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}
