//! Periodic scheduling of scrape cycles and seeder sweeps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use seedcrawl_core::{ScrapeError, Scraper};

/// How long `stop` waits for a loop to finish its current cycle.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Runs the scraper on a fixed interval until stopped.
///
/// The scrape loop fires every `interval_secs` (immediately on start when
/// `run_on_start` is set). When `seeders_sweep_limit` is non-zero a second
/// loop refreshes that many stale entries every `seeders_interval_secs`.
pub struct ScrapeScheduler {
    scraper: Arc<Scraper>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ScrapeScheduler {
    pub fn new(scraper: Arc<Scraper>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            scraper,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Start the scheduler (spawns background tasks).
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Scheduler already running");
            return;
        }

        let mut handles = self.handles.lock().await;
        handles.push(self.spawn_scrape_loop());
        if self.scraper.config().seeders_sweep_limit > 0 {
            handles.push(self.spawn_sweep_loop());
        }

        info!(provider = self.scraper.provider_name(), "Scheduler started");
    }

    /// Stop the scheduler, waiting briefly for in-progress work.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Scheduler not running");
            return;
        }

        info!("Stopping scheduler");
        let _ = self.shutdown_tx.send(());

        let handles: Vec<_> = self.handles.lock().await.drain(..).collect();
        for mut handle in handles {
            if tokio::time::timeout(STOP_GRACE, &mut handle).await.is_err() {
                warn!("Scheduler task did not stop in time, aborting");
                handle.abort();
            }
        }

        info!("Scheduler stopped");
    }

    fn spawn_scrape_loop(&self) -> JoinHandle<()> {
        let running = Arc::clone(&self.running);
        let scraper = Arc::clone(&self.scraper);
        let interval = Duration::from_secs(scraper.config().interval_secs);
        let mut delay = if scraper.config().run_on_start {
            Duration::ZERO
        } else {
            interval
        };
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Scrape loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Scrape loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        match scraper.scrape().await {
                            Ok(_) => {}
                            Err(ScrapeError::AlreadyRunning) => {
                                info!("Skipping scheduled scrape, a cycle is already running");
                            }
                            Err(e) => warn!("Scheduled scrape failed: {}", e),
                        }
                        delay = interval;
                    }
                }
            }
            info!("Scrape loop stopped");
        })
    }

    fn spawn_sweep_loop(&self) -> JoinHandle<()> {
        let running = Arc::clone(&self.running);
        let scraper = Arc::clone(&self.scraper);
        let interval = Duration::from_secs(scraper.config().seeders_interval_secs);
        let limit = scraper.config().seeders_sweep_limit;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Seeder sweep loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Seeder sweep loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        if let Err(e) = scraper.refresh_seeders(limit).await {
                            warn!("Seeder sweep failed: {}", e);
                        }
                    }
                }
            }
            info!("Seeder sweep loop stopped");
        })
    }
}
