//! V4L2 camera source (feature: ingest-v4l2).
//!
//! Captures RGB frames from a local device node such as /dev/video0. The
//! capture stream borrows the device, so both live together in a
//! self-referencing state struct that is dropped as a unit on `close`.

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use super::FrameSource;
use crate::frame::Frame;

const PREFERRED_WIDTH: u32 = 640;
const PREFERRED_HEIGHT: u32 = 480;

pub struct V4l2Source {
    index: u32,
    state: Option<CaptureState>,
    active_width: u32,
    active_height: u32,
    frame_rate: Option<f64>,
}

#[self_referencing]
struct CaptureState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this>,
}

impl V4l2Source {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            state: None,
            active_width: PREFERRED_WIDTH,
            active_height: PREFERRED_HEIGHT,
            frame_rate: None,
        }
    }
}

impl FrameSource for V4l2Source {
    fn open(&mut self) -> Result<()> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let device = v4l::Device::new(self.index as usize)
            .with_context(|| format!("open v4l2 device {}", self.index))?;

        let mut format = device.format().context("read v4l2 format")?;
        format.width = PREFERRED_WIDTH;
        format.height = PREFERRED_HEIGHT;
        format.fourcc = v4l::FourCC::new(b"RGB3");
        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!("v4l2 device {} refused format: {}", self.index, err);
                device.format().context("read v4l2 format after refusal")?
            }
        };
        if &format.fourcc.repr != b"RGB3" {
            return Err(anyhow!(
                "v4l2 device {} does not provide RGB3 frames",
                self.index
            ));
        }

        if let Ok(params) = device.params() {
            let interval = &params.interval;
            if interval.numerator > 0 {
                self.frame_rate =
                    Some(f64::from(interval.denominator) / f64::from(interval.numerator));
            }
        }

        self.active_width = format.width;
        self.active_height = format.height;

        let state = CaptureStateTryBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;
        self.state = Some(state);

        log::info!(
            "v4l2 source opened: device {} at {}x{}",
            self.index,
            self.active_width,
            self.active_height
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        use v4l::io::traits::CaptureStream;

        let Some(state) = self.state.as_mut() else {
            return Ok(None);
        };
        let data = state
            .with_stream_mut(|stream| stream.next().map(|(buf, _meta)| buf.to_vec()))
            .context("capture v4l2 frame")?;
        let frame = Frame::from_rgb8(data, self.active_width, self.active_height)?;
        Ok(Some(frame))
    }

    fn close(&mut self) {
        if self.state.take().is_some() {
            log::info!("v4l2 source closed: device {}", self.index);
        }
    }

    fn frame_rate(&self) -> Option<f64> {
        self.frame_rate
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        Some((self.active_width, self.active_height))
    }

    fn describe(&self) -> String {
        format!("v4l2://{}", self.index)
    }
}
