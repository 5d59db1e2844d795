//! Real-time progress display for sync passes
//!
//! Renders the coordinator's progress snapshots with an indicatif bar when
//! stderr is a terminal, and as plain status lines otherwise.
//!
//! # Examples
//!
//! ```rust,no_run
//! use wallpaper_fetcher::app::coordinator::{SyncCoordinator, SyncPolicy};
//! use wallpaper_fetcher::cli::{ProgressConfig, ProgressDisplay};
//!
//! # async fn example(coordinator: SyncCoordinator) -> Result<(), Box<dyn std::error::Error>> {
//! let display = ProgressDisplay::new(ProgressConfig::default());
//! let handle = display.start(coordinator.state().pass_id, coordinator.progress_stream());
//!
//! let report = coordinator.run_sync(SyncPolicy::Incremental).await?;
//! handle.finish().await;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use futures::{Stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::app::coordinator::{SyncProgress, SyncState};

/// Configuration for progress display
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Enable visual progress bars
    pub enable_progress_bars: bool,
    /// Print anything at all
    pub enabled: bool,
    /// Spinner tick interval
    pub tick_interval: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enable_progress_bars: true,
            enabled: true,
            tick_interval: Duration::from_millis(120),
        }
    }
}

/// Progress renderer for one sync pass
pub struct ProgressDisplay {
    config: ProgressConfig,
    is_terminal: bool,
}

/// Running display; call [`finish`](ProgressHandle::finish) once the pass returned
pub struct ProgressHandle {
    task: JoinHandle<()>,
    stop: CancellationToken,
}

impl ProgressHandle {
    /// Drain pending snapshots and tear the display down
    pub async fn finish(self) {
        self.stop.cancel();
        if let Err(e) = self.task.await {
            debug!("Progress display task ended abnormally: {}", e);
        }
    }
}

impl ProgressDisplay {
    pub fn new(config: ProgressConfig) -> Self {
        Self {
            config,
            is_terminal: atty::is(atty::Stream::Stderr),
        }
    }

    /// Render snapshots of the first pass after `previous_pass_id`
    pub fn start<S>(self, previous_pass_id: u64, stream: S) -> ProgressHandle
    where
        S: Stream<Item = SyncProgress> + Send + 'static,
    {
        let stop = CancellationToken::new();
        let token = stop.clone();

        let task = tokio::spawn(async move {
            if !self.config.enabled {
                return;
            }
            let mut renderer = if self.config.enable_progress_bars && self.is_terminal {
                Renderer::bar(self.config.tick_interval)
            } else {
                Renderer::Text { last: None }
            };

            let mut stream = Box::pin(stream);
            loop {
                let snapshot = tokio::select! {
                    biased;
                    next = stream.next() => match next {
                        Some(snapshot) => snapshot,
                        None => break,
                    },
                    _ = token.cancelled() => break,
                };
                if snapshot.pass_id <= previous_pass_id {
                    continue;
                }
                renderer.render(&snapshot);
                if snapshot.state.is_done() {
                    break;
                }
            }
            renderer.close();
        });

        ProgressHandle { task, stop }
    }
}

enum Renderer {
    Bar(ProgressBar),
    Text { last: Option<String> },
}

impl Renderer {
    fn bar(tick: Duration) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            bar.set_style(style.tick_strings(&["◐", "◓", "◑", "◒", "●"]));
        }
        bar.enable_steady_tick(tick);
        Renderer::Bar(bar)
    }

    fn render(&mut self, snapshot: &SyncProgress) {
        match self {
            Renderer::Bar(bar) => {
                if snapshot.state == SyncState::Downloading && bar.length().is_none() {
                    bar.set_length(snapshot.total_to_fetch as u64);
                    if let Ok(style) = ProgressStyle::default_bar()
                        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                    {
                        bar.set_style(style.progress_chars("##-"));
                    }
                }
                bar.set_position(snapshot.processed() as u64);
                bar.set_message(snapshot.last_status_text.clone());
            }
            Renderer::Text { last } => {
                if let Some(line) = text_line(snapshot, last.as_deref()) {
                    eprintln!("{}", line);
                    *last = Some(snapshot.last_status_text.clone());
                }
            }
        }
    }

    fn close(self) {
        if let Renderer::Bar(bar) = self {
            bar.finish_and_clear();
        }
    }
}

/// Status line for text mode, `None` when nothing new happened
fn text_line(snapshot: &SyncProgress, last: Option<&str>) -> Option<String> {
    if snapshot.last_status_text.is_empty() || last == Some(snapshot.last_status_text.as_str()) {
        return None;
    }
    if snapshot.total_to_fetch > 0 && !snapshot.state.is_done() {
        Some(format!(
            "[{:>5.1}%] {}",
            snapshot.completion_percentage(),
            snapshot.last_status_text
        ))
    } else {
        Some(snapshot.last_status_text.clone())
    }
}
