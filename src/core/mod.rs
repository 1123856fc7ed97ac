use std::{
    io::BufRead,
    path::PathBuf,
    sync::{
        mpsc::{sync_channel, Receiver, RecvTimeoutError},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::Context;
use indicatif::MultiProgress;
use log::{info, warn};

use self::{
    address::{parse_destination, AddressConfig},
    dispatcher::FrameDispatcher,
    endpoint::{Destination, NetworkEndpoint},
    sample::TrackingSample,
    settings::Settings,
    status::StatusBar,
};

pub mod address;
pub mod blendshape;
pub mod dispatcher;
pub mod endpoint;
mod folders;
pub mod message;
pub mod rotation;
pub mod sample;
mod settings;
mod source;
mod status;

const ADDRESS_ENV: &str = "VISAGE_ADDRESS";
const SAMPLE_QUEUE: usize = 8;
const STATUS_INTERVAL: Duration = Duration::from_millis(100);

pub struct VisageOsc {
    endpoint: Arc<NetworkEndpoint>,
    address: AddressConfig,
    settings_path: Option<PathBuf>,
    multi: MultiProgress,
}

impl VisageOsc {
    /// Picks the startup destination: `VISAGE_ADDRESS` if it parses, else the
    /// persisted address, else the default.
    pub fn new(multi: MultiProgress) -> anyhow::Result<VisageOsc> {
        let settings_path = Settings::default_path();
        let settings = settings_path
            .as_deref()
            .map(Settings::load)
            .unwrap_or_default();

        let mut address = AddressConfig::new(
            parse_destination(&settings.address).unwrap_or_else(|e| {
                warn!("Stored address {:?} is invalid: {}", settings.address, e);
                Destination::default()
            }),
        );

        if let Ok(text) = std::env::var(ADDRESS_ENV) {
            if let Err(e) = address.parse(&text) {
                warn!("Ignoring {}: {}", ADDRESS_ENV, e);
            }
        }

        let endpoint = Arc::new(
            NetworkEndpoint::new(address.current()).context("creating network endpoint")?,
        );
        info!("Sending /visage frames to {}", address.current());

        Ok(VisageOsc {
            endpoint,
            address,
            settings_path,
            multi,
        })
    }

    /// Spawns the input reader and dispatches samples until input ends.
    pub fn run<R>(self, input: R) -> anyhow::Result<()>
    where
        R: BufRead + Send + 'static,
    {
        let (sender, receiver) = sync_channel(SAMPLE_QUEUE);

        let endpoint = self.endpoint.clone();
        let mut address = self.address;
        let settings_path = self.settings_path;

        let reader = thread::spawn(move || {
            source::read_events(input, sender, |text| {
                apply_address(&endpoint, &mut address, settings_path.as_deref(), text)
            })
        });

        dispatch_loop(self.endpoint, &receiver, &self.multi);

        reader
            .join()
            .map_err(|_| anyhow::anyhow!("input reader panicked"))?
    }
}

/// Runs on the input thread whenever the user submits a new address.
fn apply_address(
    endpoint: &NetworkEndpoint,
    address: &mut AddressConfig,
    settings_path: Option<&std::path::Path>,
    text: &str,
) {
    if let Err(e) = address.parse(text) {
        warn!("Keeping {}: {}", address.current(), e);
        return;
    }

    let destination = address.current();
    if let Err(e) = endpoint.reconfigure(destination) {
        warn!("{}", e);
    }

    let settings = Settings {
        address: destination.to_string(),
    };
    if let Some(path) = settings_path {
        if let Err(e) = settings.save(path) {
            warn!("Could not persist address: {:#}", e);
        }
    }
}

fn dispatch_loop(
    endpoint: Arc<NetworkEndpoint>,
    receiver: &Receiver<Box<TrackingSample>>,
    multi: &MultiProgress,
) {
    let mut status = StatusBar::new(multi);
    let mut dispatcher = FrameDispatcher::new(endpoint);
    let mut next_status = Instant::now();

    loop {
        match receiver.recv_timeout(STATUS_INTERVAL) {
            Ok(sample) => {
                let report = dispatcher.on_sample(&sample, Instant::now());
                log::trace!("{:?}", report);
                status.trip_sample_counter(report.timing);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if Instant::now() >= next_status {
            next_status = Instant::now() + STATUS_INTERVAL;
            let endpoint = dispatcher.sink();
            status.set_sent_count(endpoint.sent());
            status.display(
                endpoint.dropped() + dispatcher.rejected(),
                &endpoint.destination().to_string(),
            );
        }
    }

    let endpoint = dispatcher.sink();
    info!(
        "Input finished: {} frames sent, {} dropped, {} rejected",
        endpoint.sent(),
        endpoint.dropped(),
        dispatcher.rejected()
    );

    let missing: Vec<&str> = dispatcher.extractor().missing().map(|s| s.name()).collect();
    if !missing.is_empty() {
        warn!("Never reported by the sensor: {}", missing.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_address_keeps_endpoint_and_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let endpoint = NetworkEndpoint::new(&Destination::new("127.0.0.1", 9000)).unwrap();
        let mut address = AddressConfig::new(Destination::new("127.0.0.1", 9000));

        apply_address(&endpoint, &mut address, Some(path.as_path()), "badstring");
        assert_eq!(endpoint.destination(), Destination::new("127.0.0.1", 9000));
        assert!(!path.exists());

        apply_address(&endpoint, &mut address, Some(path.as_path()), "127.0.0.1:9100");
        assert_eq!(endpoint.destination(), Destination::new("127.0.0.1", 9100));
        assert_eq!(Settings::load(&path).address, "127.0.0.1:9100");
    }
}
