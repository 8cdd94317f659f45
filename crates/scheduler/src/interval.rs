use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use popconfig::IntervalSettings;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};

use crate::content::ContentSource;
use crate::event::PopupEvent;
use crate::queue::QueueWriter;
use crate::stop::StopSignal;

/// Whole seconds drawn uniformly from `[min, max]`, both inclusive.
pub fn sample_interval<R: Rng + ?Sized>(rng: &mut R, min: Duration, max: Duration) -> Duration {
    let low = min.as_secs();
    let high = max.as_secs().max(low);
    Duration::from_secs(rng.gen_range(low..=high))
}

/// Produces one popup event per cycle into its queue, then sleeps a random
/// interval.
pub struct IntervalScheduler<S> {
    source: S,
    queue: QueueWriter<PopupEvent>,
    settings: IntervalSettings,
    rng: StdRng,
}

impl<S: ContentSource> IntervalScheduler<S> {
    pub fn new(
        source: S,
        queue: QueueWriter<PopupEvent>,
        settings: IntervalSettings,
        seed: u64,
    ) -> Self {
        Self {
            source,
            queue,
            settings,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn sample_delay(&mut self) -> Duration {
        sample_interval(
            &mut self.rng,
            self.settings.min_interval,
            self.settings.max_interval,
        )
    }

    /// Produces at most one event. Returns `true` if one was enqueued.
    pub fn run_cycle(&mut self) -> bool {
        let kind = self.source.kind();
        let Some(payload) = self.source.produce(&mut self.rng) else {
            trace!(%kind, "no content this cycle");
            return false;
        };

        let event = PopupEvent::new(payload, self.settings.display);
        debug!(%kind, payload = ?event.payload(), "queueing popup");
        self.queue.push(event)
    }

    /// Loops until `stop` fires.
    pub fn run(mut self, stop: StopSignal) {
        let kind = self.source.kind();
        info!(
            %kind,
            min_secs = self.settings.min_interval.as_secs(),
            max_secs = self.settings.max_interval.as_secs(),
            display_ms = self.settings.display.as_millis() as u64,
            "popup scheduler started"
        );
        loop {
            self.run_cycle();
            let delay = self.sample_delay();
            trace!(%kind, delay_secs = delay.as_secs(), "scheduler sleeping");
            if !stop.wait(delay) {
                break;
            }
        }
        info!(%kind, "popup scheduler stopped");
    }
}

impl<S: ContentSource + Send + 'static> IntervalScheduler<S> {
    pub fn spawn(self, stop: StopSignal) -> io::Result<JoinHandle<()>> {
        let name = format!("popcycle-{}-scheduler", self.source.kind());
        thread::Builder::new()
            .name(name)
            .spawn(move || self.run(stop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ImageFolder, TextPool};
    use crate::event::PopupPayload;
    use crate::queue::event_queue;
    use crate::stop::stop_pair;
    use std::fs;
    use std::time::Instant;
    use tempfile::TempDir;

    fn settings(min: u64, max: u64, display_ms: u64) -> IntervalSettings {
        IntervalSettings {
            min_interval: Duration::from_secs(min),
            max_interval: Duration::from_secs(max),
            display: Duration::from_millis(display_ms),
        }
    }

    #[test]
    fn sampled_interval_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(99);
        let bounds = [(0, 0), (0, 1), (5, 15), (10, 30), (15, 45), (7, 7)];
        for (min, max) in bounds {
            let mut seen_min = false;
            let mut seen_max = false;
            for _ in 0..2_000 {
                let value = sample_interval(
                    &mut rng,
                    Duration::from_secs(min),
                    Duration::from_secs(max),
                );
                assert!(value >= Duration::from_secs(min), "{value:?} < {min}");
                assert!(value <= Duration::from_secs(max), "{value:?} > {max}");
                seen_min |= value.as_secs() == min;
                seen_max |= value.as_secs() == max;
            }
            assert!(seen_min && seen_max, "bounds {min}..={max} not both hit");
        }
    }

    #[test]
    fn image_cycle_enqueues_configured_duration() {
        let root = TempDir::new().unwrap();
        let image = root.path().join("a.png");
        fs::write(&image, b"png").unwrap();

        let (writer, reader) = event_queue();
        let mut scheduler = IntervalScheduler::new(
            ImageFolder::popup_images(root.path()),
            writer,
            settings(0, 0, 1000),
            1,
        );
        assert!(scheduler.run_cycle());

        let event = reader.try_pop().expect("one event");
        assert_eq!(event.payload(), &PopupPayload::Image(image));
        assert_eq!(event.display(), Duration::from_millis(1000));
        assert_eq!(reader.try_pop(), None);
    }

    #[test]
    fn missing_folder_cycles_enqueue_nothing() {
        let root = TempDir::new().unwrap();
        let (writer, reader) = event_queue();
        let mut scheduler = IntervalScheduler::new(
            ImageFolder::popup_images(root.path().join("absent")),
            writer,
            settings(0, 0, 1000),
            2,
        );
        for _ in 0..25 {
            assert!(!scheduler.run_cycle());
        }
        assert!(reader.is_empty());
    }

    #[test]
    fn text_cycle_always_enqueues() {
        let (writer, reader) = event_queue();
        let mut scheduler = IntervalScheduler::new(
            TextPool::new(["hi"]).unwrap(),
            writer,
            settings(1, 2, 4000),
            3,
        );
        assert!(scheduler.run_cycle());
        assert!(scheduler.run_cycle());
        assert_eq!(reader.len(), 2);
        let event = reader.try_pop().unwrap();
        assert_eq!(event.payload(), &PopupPayload::Text("hi".into()));
        assert_eq!(event.display(), Duration::from_millis(4000));
    }

    #[test]
    fn spawned_scheduler_runs_until_stopped() {
        let (writer, reader) = event_queue();
        let scheduler = IntervalScheduler::new(
            TextPool::new(["tick"]).unwrap(),
            writer,
            settings(0, 0, 10),
            4,
        );
        let (handle, signal) = stop_pair();
        let thread = scheduler.spawn(signal).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while reader.len() < 3 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        handle.stop();
        thread.join().unwrap();
        assert!(reader.len() >= 3);
    }

    #[test]
    fn stop_interrupts_long_sleep() {
        let (writer, _reader) = event_queue();
        let scheduler = IntervalScheduler::new(
            TextPool::new(["later"]).unwrap(),
            writer,
            settings(3_600, 3_600, 10),
            5,
        );
        let (handle, signal) = stop_pair();
        let started = Instant::now();
        let thread = scheduler.spawn(signal).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        handle.stop();
        thread.join().unwrap();
        assert!(started.elapsed() < Duration::from_secs(60));
    }
}
