use std::time::Instant;

use super::{
    endpoint::{Delivery, FrameSink},
    rotation::RotationError,
    sample::{SampleExtractor, TrackingSample},
};

/// Time since the previous sample, `None` for the first one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameTiming {
    pub delta_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    Sent(usize),
    Dropped,
    Rejected(RotationError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub timing: FrameTiming,
    pub outcome: FrameOutcome,
}

pub struct FrameDispatcher<S: FrameSink> {
    sink: S,
    extractor: SampleExtractor,
    epoch: Instant,
    last_arrival: Option<Instant>,
    rejected: u64,
}

impl<S: FrameSink> FrameDispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self::with_epoch(sink, Instant::now())
    }

    /// `epoch` is the zero point of the timestamp carried in each frame.
    pub fn with_epoch(sink: S, epoch: Instant) -> Self {
        Self {
            sink,
            extractor: SampleExtractor::new(),
            epoch,
            last_arrival: None,
            rejected: 0,
        }
    }

    pub fn on_sample(&mut self, sample: &TrackingSample, arrival: Instant) -> FrameReport {
        let timing = FrameTiming {
            delta_ms: self
                .last_arrival
                .map(|last| arrival.saturating_duration_since(last).as_millis() as u64),
        };
        self.last_arrival = Some(arrival);

        // whole milliseconds, as seconds
        let timestamp =
            arrival.saturating_duration_since(self.epoch).as_millis() as f32 / 1000.;

        let outcome = match self.extractor.extract(sample, timestamp) {
            Ok(record) => {
                log::trace!("Frame at {:.3}s", record.timestamp());
                match self.sink.send(&record) {
                    Delivery::Sent { bytes, .. } => FrameOutcome::Sent(bytes),
                    Delivery::Dropped => FrameOutcome::Dropped,
                }
            }
            Err(e) => {
                if self.rejected == 0 {
                    log::warn!("Dropping frame: {}", e);
                } else {
                    log::debug!("Dropping frame: {}", e);
                }
                self.rejected += 1;
                FrameOutcome::Rejected(e)
            }
        };

        FrameReport { timing, outcome }
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn extractor(&self) -> &SampleExtractor {
        &self.extractor
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::RefCell,
        net::{Ipv4Addr, SocketAddr, UdpSocket},
        sync::Arc,
        time::Duration,
    };

    use glam::Mat4;
    use rosc::{OscPacket, OscType};

    use super::*;
    use crate::core::{
        endpoint::{Destination, NetworkEndpoint},
        sample::FrameRecord,
    };

    #[derive(Default)]
    struct Recorder {
        frames: RefCell<Vec<FrameRecord>>,
    }

    impl FrameSink for Recorder {
        fn send(&self, record: &FrameRecord) -> Delivery {
            self.frames.borrow_mut().push(record.clone());
            Delivery::Sent {
                bytes: 0,
                to: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            }
        }
    }

    fn jaw_open() -> TrackingSample {
        let mut sample = TrackingSample::default();
        sample.blendshapes.insert("jawOpen".into(), 1.);
        sample
    }

    #[test]
    fn timing_and_timestamp() {
        let epoch = Instant::now();
        let mut dispatcher = FrameDispatcher::with_epoch(Recorder::default(), epoch);

        let first = dispatcher.on_sample(&jaw_open(), epoch + Duration::from_millis(1500));
        assert_eq!(first.timing.delta_ms, None);

        let second = dispatcher.on_sample(&jaw_open(), epoch + Duration::from_millis(1517));
        assert_eq!(second.timing.delta_ms, Some(17));
        assert!(matches!(second.outcome, FrameOutcome::Sent(_)));

        let frames = dispatcher.sink().frames.borrow();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].timestamp(), 1.5);
        assert!((frames[1].timestamp() - 1.517).abs() < 1e-6);
    }

    #[test]
    fn degenerate_pose_drops_only_that_frame() {
        let epoch = Instant::now();
        let mut dispatcher = FrameDispatcher::with_epoch(Recorder::default(), epoch);

        let bad = TrackingSample {
            head: Mat4::from_rotation_y(std::f32::consts::PI),
            ..jaw_open()
        };
        let report = dispatcher.on_sample(&bad, epoch);
        assert!(matches!(
            report.outcome,
            FrameOutcome::Rejected(RotationError::Degenerate { .. })
        ));

        let report = dispatcher.on_sample(&jaw_open(), epoch + Duration::from_millis(16));
        assert!(matches!(report.outcome, FrameOutcome::Sent(_)));
        // timing still advances across a rejected frame
        assert_eq!(report.timing.delta_ms, Some(16));

        assert_eq!(dispatcher.rejected(), 1);
        assert_eq!(dispatcher.sink().frames.borrow().len(), 1);
    }

    #[test]
    fn end_to_end_over_udp() {
        let listener = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        listener
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let port = listener.local_addr().unwrap().port();

        let endpoint = Arc::new(NetworkEndpoint::new(&Destination::new("127.0.0.1", port)).unwrap());
        let mut dispatcher = FrameDispatcher::new(endpoint.clone());

        let report = dispatcher.on_sample(&jaw_open(), Instant::now());
        assert!(matches!(report.outcome, FrameOutcome::Sent(_)));
        assert_eq!(endpoint.sent(), 1);

        let mut buf = [0u8; rosc::decoder::MTU];
        let size = listener.recv(&mut buf).unwrap();
        let (_, packet) = rosc::decoder::decode_udp(&buf[..size]).unwrap();
        let OscPacket::Message(msg) = packet else {
            panic!("expected a message");
        };

        assert_eq!(msg.addr, "/visage");
        assert_eq!(msg.args.len(), 63);
        assert_eq!(msg.args[24], OscType::Float(1.));
        for arg in &msg.args[52..62] {
            assert_eq!(*arg, OscType::Float(0.));
        }
    }
}
