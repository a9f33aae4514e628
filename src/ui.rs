use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

#[derive(Clone, Copy, Debug)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

/// Terminal progress reporting for interactive runs.
///
/// Pretty mode renders an indicatif bar (or spinner when the frame count is
/// unknown); plain mode prints one line per stage so piped output stays
/// readable.
#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, is_tty: bool) -> Self {
        Self { mode, is_tty }
    }

    pub fn from_flag(flag: Option<&str>, is_tty: bool) -> Self {
        let mode = match flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            _ => UiMode::Auto,
        };
        Self::new(mode, is_tty)
    }

    fn use_pretty(&self) -> bool {
        match self.mode {
            UiMode::Pretty => true,
            UiMode::Plain => false,
            UiMode::Auto => self.is_tty,
        }
    }

    /// Start a progress display for a run of `total` frames (None when the
    /// source length is unknown, e.g. a live camera).
    pub fn progress(&self, total: Option<u64>) -> RunProgress {
        if !self.use_pretty() {
            eprintln!("==> processing frames");
            return RunProgress { bar: None };
        }

        let bar = match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                let style = ProgressStyle::with_template(
                    "{bar:40} {pos}/{len} frames ({per_sec}) {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar());
                bar.set_style(style);
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.enable_steady_tick(Duration::from_millis(120));
                let style = ProgressStyle::with_template("{spinner} {pos} frames {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner());
                bar.set_style(style);
                bar
            }
        };
        bar.set_draw_target(ProgressDrawTarget::stderr());
        RunProgress { bar: Some(bar) }
    }
}

pub struct RunProgress {
    bar: Option<ProgressBar>,
}

impl RunProgress {
    pub fn tick(&self, detections: usize, rate: Option<f64>) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
            if let Some(fps) = rate {
                bar.set_message(format!("{} det, {:.1} fps", detections, fps));
            }
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
