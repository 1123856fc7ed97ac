use std::{
    collections::VecDeque,
    sync::Arc,
    time::{Duration, Instant},
};

use colored::{Color, Colorize};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;

use super::dispatcher::FrameTiming;

static STA_ON: Lazy<Arc<str>> = Lazy::new(|| format!("{}", "FACE".color(Color::Green)).into());
static STA_OFF: Lazy<Arc<str>> = Lazy::new(|| format!("{}", "FACE".color(Color::Red)).into());

pub struct StatusBar {
    messages: Vec<Arc<str>>,
    spinner: ProgressBar,
    sample_counter: VecDeque<Instant>,
    send_counter: VecDeque<(u64, Instant)>,
    last_sample: Option<Instant>,
    last_timing: FrameTiming,
    start: Instant,
}

impl StatusBar {
    pub fn new(multi: &MultiProgress) -> Self {
        let spinner = multi.add(ProgressBar::new_spinner());
        spinner.set_style(
            ProgressStyle::default_spinner().tick_chars("⠁⠂⠄⡀⡈⡐⡠⣀⣁⣂⣄⣌⣔⣤⣥⣦⣮⣶⣷⣿⡿⠿⢟⠟⡛⠛⠫⢋⠋⠍⡉⠉⠑⠡⢁"),
        );

        Self {
            messages: Vec::new(),
            spinner,
            sample_counter: VecDeque::new(),
            send_counter: VecDeque::new(),
            last_sample: None,
            last_timing: FrameTiming::default(),
            start: Instant::now(),
        }
    }

    pub fn trip_sample_counter(&mut self, timing: FrameTiming) {
        let now = Instant::now();
        self.last_sample = Some(now);
        self.last_timing = timing;
        self.sample_counter.push_back(now);
    }

    /// `sent` is the endpoint's cumulative send count.
    pub fn set_sent_count(&mut self, sent: u64) {
        self.send_counter.push_back((sent, Instant::now()));
    }

    pub fn add_item(&mut self, str: Arc<str>) {
        self.messages.push(str);
    }

    fn summarize(&mut self, dropped: u64, destination: &str) {
        prune(&mut self.sample_counter, |t| *t);
        prune(&mut self.send_counter, |(_, t)| *t);

        let tracking = self
            .last_sample
            .is_some_and(|t| t.elapsed() < Duration::from_secs(1));
        self.add_item(if tracking { STA_ON.clone() } else { STA_OFF.clone() });

        self.add_item(format!("FPS:{}", self.sample_counter.len()).into());

        if let Some(delta) = self.last_timing.delta_ms {
            self.add_item(format!("Δ:{}ms", delta).into());
        }

        let send_rate = match (self.send_counter.front(), self.send_counter.back()) {
            (Some((first, t0)), Some((last, t1))) if t1 > t0 => {
                (last - first) as f32 / (*t1 - *t0).as_secs_f32()
            }
            _ => 0.,
        };
        self.add_item(format!("SEND:{:.0}/s", send_rate).into());

        if dropped > 0 {
            self.add_item(format!("{}", format!("DROP:{}", dropped).color(Color::Yellow)).into());
        }

        self.add_item(format!("→ {}", destination).into());
    }

    pub fn display(&mut self, dropped: u64, destination: &str) {
        let uptime = self.start.elapsed().as_secs();
        if uptime >= 1 {
            self.summarize(dropped, destination);
            let str = self.messages.join("  ");
            self.spinner.set_message(str);
        } else {
            self.spinner.set_message("Initializing...");
        }
        self.spinner.tick();
        self.messages.clear();
    }
}

/// Forgets entries older than one second.
fn prune<T>(counter: &mut VecDeque<T>, time: impl Fn(&T) -> Instant) {
    while let Some(front) = counter.front() {
        if time(front).elapsed() > Duration::from_secs(1) {
            counter.pop_front();
        } else {
            break;
        }
    }
}
