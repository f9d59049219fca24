use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::model::{EventError, StreamEvent, parse_event};
use crate::sse::SseDecoder;

/// Errors that can occur when replaying a recorded event stream
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("frame {frame}: {source}")]
    Event { frame: usize, source: EventError },
}

/// Read the events of a recorded `text/event-stream` dump.
///
/// Frames are numbered from 1. Frames with an unknown event type are skipped;
/// a trailing frame without its blank line is incomplete and dropped.
pub fn read_events(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<StreamEvent, ReplayError>>, ReplayError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| ReplayError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let frames = SseDecoder::new().feed(&bytes);

    Ok(frames
        .into_iter()
        .enumerate()
        .filter_map(|(idx, frame)| {
            let frame_no = idx + 1;
            match parse_event(&frame.data) {
                Ok(Some(event)) => Some(Ok(event)),
                Ok(None) => {
                    debug!(frame = frame_no, "unknown event type skipped");
                    None
                }
                Err(source) => Some(Err(ReplayError::Event {
                    frame: frame_no,
                    source,
                })),
            }
        }))
}
