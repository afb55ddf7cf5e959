//! Reassembly of image frames from the raw TAXI byte stream.
//!
//! The capture engine shifts the bus in continuously, so the host sees one
//! long stream of little-endian `u16` pixels with no framing of its own.
//! Every frame is preceded by a run of `0x7fff` padding words, and a valid
//! frame carries `0x7fff` again in its trailer pixel.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Padding that precedes every frame: four `0x7fff` words.
pub const SYNC_MARKER: [u8; 8] = [0xff, 0x7f, 0xff, 0x7f, 0xff, 0x7f, 0xff, 0x7f];

/// Value of the trailer pixel in an intact frame.
pub const TRAILER: u16 = 0x7fff;

/// Locate the start of the first frame in `buf`.
///
/// Returns the offset two bytes before the first byte that is neither `0xff`
/// nor `0x7f` after the first [`SYNC_MARKER`], so the frame starts with the
/// last padding word. Returns `None` when no marker is followed by data.
pub fn find_image_start(buf: &[u8]) -> Option<usize> {
    let mut found = false;
    for i in 0..buf.len().saturating_sub(SYNC_MARKER.len() - 1) {
        if buf[i..].starts_with(&SYNC_MARKER) {
            found = true;
        }
        if found && buf[i] != 0xff && buf[i] != 0x7f {
            return Some(i - 2);
        }
    }
    None
}

/// Dimensions of a frame in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub height: usize,
    pub width: usize,
    /// Row and column of the trailer pixel.
    pub trailer: (usize, usize),
}

impl FrameGeometry {
    pub const fn pixels(&self) -> usize {
        self.height * self.width
    }

    /// Size of one frame on the wire.
    pub const fn byte_len(&self) -> usize {
        self.pixels() * 2
    }
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self { height: 245, width: 327, trailer: (240, 326) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    geometry: FrameGeometry,
    pixels: Vec<u16>,
}

impl Frame {
    /// Decode one frame from exactly `geometry.byte_len()` bytes.
    pub fn from_le_bytes(geometry: FrameGeometry, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != geometry.byte_len() {
            return None;
        }
        let pixels = bytes
            .chunks_exact(2)
            .map(|w| u16::from_le_bytes([w[0], w[1]]))
            .collect();
        Some(Self { geometry, pixels })
    }

    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    pub fn pixel(&self, row: usize, col: usize) -> Option<u16> {
        if row >= self.geometry.height || col >= self.geometry.width {
            return None;
        }
        self.pixels.get(row * self.geometry.width + col).copied()
    }

    pub fn row(&self, row: usize) -> Option<&[u16]> {
        let width = self.geometry.width;
        self.pixels.get(row * width..(row + 1) * width)
    }

    /// A frame is intact when its trailer pixel holds [`TRAILER`].
    pub fn is_valid(&self) -> bool {
        let (row, col) = self.geometry.trailer;
        self.pixel(row, col) == Some(TRAILER)
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_le_bytes()).collect()
    }
}

/// Counters kept by a [`FrameAssembler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    /// Frames handed out.
    pub frames: usize,
    /// Frames dropped for a bad trailer.
    pub rejected: usize,
    /// Times the stream was realigned on a marker.
    pub resyncs: usize,
    /// Bytes thrown away while hunting for a marker.
    pub discarded: usize,
}

/// Cuts validated frames out of a byte stream fed in arbitrary pieces.
///
/// Once two frames' worth of bytes are buffered the assembler realigns on the
/// next marker, or drops the whole buffer if there is none. One frame's worth
/// of bytes after a sync point is then cut out and checked.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    geometry: FrameGeometry,
    buf: Vec<u8>,
    synced: bool,
    stats: AssemblerStats,
}

impl FrameAssembler {
    pub fn new(geometry: FrameGeometry) -> Self {
        Self { geometry, ..Default::default() }
    }

    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Bytes held back waiting for more data.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Append `data` and return every frame it completes.
    pub fn push(&mut self, data: &[u8]) -> Vec<Frame> {
        self.buf.extend_from_slice(data);
        let mut frames = Vec::new();
        let frame_len = self.geometry.byte_len();

        loop {
            if !self.synced && self.buf.len() >= 2 * frame_len {
                self.realign();
            }
            if !self.synced || self.buf.len() < frame_len {
                break;
            }
            if let Some(frame) = self.cut() {
                frames.push(frame);
            }
        }
        frames
    }

    /// Drain what is left at the end of the stream. The tail is shorter than
    /// the realignment threshold, so the last frame would otherwise be lost.
    pub fn finish(&mut self) -> Option<Frame> {
        if !self.synced {
            self.realign();
        }
        let frame = if self.synced && self.buf.len() >= self.geometry.byte_len()
        {
            self.cut()
        } else {
            None
        };
        self.stats.discarded += self.buf.len();
        self.buf.clear();
        self.synced = false;
        frame
    }

    fn realign(&mut self) {
        match find_image_start(&self.buf) {
            Some(start) => {
                self.buf.drain(..start);
                self.stats.discarded += start;
                self.stats.resyncs += 1;
                self.synced = true;
            }
            None => {
                tracing::debug!(bytes = self.buf.len(), "no frame marker, dropping buffer");
                self.stats.discarded += self.buf.len();
                self.buf.clear();
            }
        }
    }

    fn cut(&mut self) -> Option<Frame> {
        let frame_len = self.geometry.byte_len();
        self.synced = false;
        let frame = Frame::from_le_bytes(self.geometry, &self.buf[..frame_len]);
        self.buf.drain(..frame_len);
        match frame {
            Some(frame) if frame.is_valid() => {
                self.stats.frames += 1;
                Some(frame)
            }
            _ => {
                self.stats.rejected += 1;
                tracing::debug!("frame trailer missing, dropping frame");
                None
            }
        }
    }
}

/// Writes frames as numbered raw files under one directory.
pub struct FrameWriter {
    dir: PathBuf,
    next: usize,
}

impl FrameWriter {
    pub fn create(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, next: 0 })
    }

    /// Write `frame` and return the path it landed at.
    pub fn write(&mut self, frame: &Frame) -> io::Result<PathBuf> {
        let path = self.dir.join(format!("frame_{:05}.bin", self.next));
        fs::write(&path, frame.to_le_bytes())?;
        self.next += 1;
        Ok(path)
    }

    pub fn written(&self) -> usize {
        self.next
    }
}

/// Split a raw capture log into validated frame files.
pub fn extract(
    input: impl AsRef<Path>,
    writer: &mut FrameWriter,
    geometry: FrameGeometry,
) -> io::Result<AssemblerStats> {
    let data = fs::read(input)?;
    let mut assembler = FrameAssembler::new(geometry);
    for frame in assembler.push(&data) {
        writer.write(&frame)?;
    }
    if let Some(frame) = assembler.finish() {
        writer.write(&frame)?;
    }
    Ok(assembler.stats())
}
