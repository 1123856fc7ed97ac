use std::{
    io::BufRead,
    sync::mpsc::{SyncSender, TrySendError},
};

use anyhow::Context;
use glam::Mat4;
use serde::Deserialize;

use super::sample::{BlendShapes, TrackingSample};

const IDENTITY: [f32; 16] = [
    1., 0., 0., 0., //
    0., 1., 0., 0., //
    0., 0., 1., 0., //
    0., 0., 0., 1., //
];

fn identity() -> [f32; 16] {
    IDENTITY
}

/// One line of host input.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    Sample(RawSample),
    Address { address: String },
}

/// Matrices are column-major.
#[derive(Debug, Deserialize)]
pub struct RawSample {
    #[serde(default)]
    pub blendshapes: BlendShapes,
    #[serde(default = "identity")]
    pub head: [f32; 16],
    #[serde(default = "identity")]
    pub left_eye: [f32; 16],
    #[serde(default = "identity")]
    pub right_eye: [f32; 16],
}

impl From<RawSample> for TrackingSample {
    fn from(raw: RawSample) -> Self {
        TrackingSample {
            blendshapes: raw.blendshapes,
            head: Mat4::from_cols_array(&raw.head),
            left_eye: Mat4::from_cols_array(&raw.left_eye),
            right_eye: Mat4::from_cols_array(&raw.right_eye),
        }
    }
}

pub fn parse_event(line: &str) -> anyhow::Result<HostEvent> {
    serde_json::from_str(line).context("malformed host event")
}

/// Reads host events until end of input. Samples are forwarded without
/// blocking; when the dispatcher is behind the sample is dropped. Address
/// edits are handed to `on_address` on this thread.
pub fn read_events<R, F>(
    reader: R,
    samples: SyncSender<Box<TrackingSample>>,
    mut on_address: F,
) -> anyhow::Result<()>
where
    R: BufRead,
    F: FnMut(&str),
{
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.context("reading host input")?;
        if line.trim().is_empty() {
            continue;
        }

        match parse_event(&line) {
            Ok(HostEvent::Sample(raw)) => {
                match samples.try_send(Box::new(raw.into())) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => log::trace!("Dispatcher busy, sample dropped"),
                    Err(TrySendError::Disconnected(_)) => return Ok(()),
                }
            }
            Ok(HostEvent::Address { address }) => on_address(&address),
            Err(e) => log::warn!("line {}: {:#}", lineno + 1, e),
        }
    }
    Ok(())
}
