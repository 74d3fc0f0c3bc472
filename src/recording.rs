//! Recorded detector output in JSON Lines form.
//!
//! Each non-empty line is one JSON object:
//!
//! ```text
//! {"resolution": {"width": 1280, "height": 720}}
//! {"landmarks": [[0.51, 0.42, -0.03], ...], "transform": [1.0, 0.0, ...]}
//! {"landmarks": null}
//! ```
//!
//! A line holding only a resolution is a negotiation event. Every other line
//! is one tick; missing, `null` or empty landmarks mean no face was detected.
//! An explicit `"landmarks": null` next to a resolution makes that line a
//! tick as well.

use crate::{
    camera::Resolution,
    landmarks::{Landmark, LandmarkFrame},
    Error, Result,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    fs::File,
    io::{BufRead, BufReader, Lines, Write},
    path::Path,
};

/// On-disk form of one recording line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedLine {
    /// Capture resolution negotiated at this point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    /// Normalized landmarks as `[x, y, z]` triples
    ///
    /// The outer `None` is an absent field; `Some(None)` is an explicit `null`.
    #[serde(
        default,
        deserialize_with = "present_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub landmarks: Option<Option<Vec<[f32; 3]>>>,
    /// Row-major 4×4 head-pose transform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Vec<f32>>,
}

/// Keep a present field apart from an absent one, even when it is `null`
fn present_field<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl RecordedLine {
    /// Line describing one tick of detector output
    #[must_use]
    pub fn tick(frame: Option<&LandmarkFrame>) -> Self {
        Self {
            resolution: None,
            landmarks: Some(frame.map(|f| f.landmarks().iter().map(|l| [l.x, l.y, l.z]).collect())),
            transform: frame.and_then(LandmarkFrame::transform).map(|t| t.to_vec()),
        }
    }

    /// Line announcing a capture resolution
    #[must_use]
    pub const fn resolution(resolution: Resolution) -> Self {
        Self {
            resolution: Some(resolution),
            landmarks: None,
            transform: None,
        }
    }

    /// True unless the line only carries a resolution
    #[must_use]
    pub const fn is_tick(&self) -> bool {
        !(self.resolution.is_some() && self.landmarks.is_none() && self.transform.is_none())
    }
}

/// One parsed line of a recording
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    /// 1-based line number in the source
    pub line: usize,
    /// Resolution to apply before the tick, if announced on this line
    pub resolution: Option<Resolution>,
    /// Whether this line is a tick
    pub is_tick: bool,
    /// Detected face; `None` on ticks without a face
    pub frame: Option<LandmarkFrame>,
}

impl RecordedEvent {
    fn parse(line: usize, text: &str) -> Result<Self> {
        let recorded: RecordedLine = serde_json::from_str(text).map_err(|e| Error::Recording {
            line,
            message: e.to_string(),
        })?;
        let is_tick = recorded.is_tick();

        let frame = match recorded.landmarks {
            Some(Some(points)) if !points.is_empty() => {
                let landmarks = points.into_iter().map(Landmark::from).collect();
                let frame = LandmarkFrame::from_parts(landmarks, recorded.transform.as_deref())
                    .map_err(|e| Error::Recording {
                        line,
                        message: e.to_string(),
                    })?;
                Some(frame)
            }
            _ => None,
        };

        Ok(Self {
            line,
            resolution: recorded.resolution,
            is_tick,
            frame,
        })
    }
}

/// Iterator over the events of a JSON Lines recording
pub struct RecordingReader<R: BufRead> {
    lines: Lines<R>,
    line: usize,
}

impl RecordingReader<BufReader<File>> {
    /// Open a recording file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> RecordingReader<R> {
    /// Read a recording from any buffered source
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl<R: BufRead> Iterator for RecordingReader<R> {
    type Item = Result<RecordedEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;
            if text.trim().is_empty() {
                continue;
            }
            return Some(RecordedEvent::parse(self.line, &text));
        }
    }
}

/// Write recording lines as JSON Lines
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_recording<W: Write>(mut writer: W, lines: &[RecordedLine]) -> Result<()> {
    for line in lines {
        serde_json::to_writer(&mut writer, line)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
