use std::fs;
use taxi_host::frames::{
    extract, find_image_start, Frame, FrameAssembler, FrameGeometry,
    FrameWriter, SYNC_MARKER, TRAILER,
};

const SMALL: FrameGeometry = FrameGeometry { height: 4, width: 5, trailer: (3, 4) };

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Pixels of a frame as the sensor sends them: the last padding word, then
/// image data, with the trailer pixel set when `intact`.
fn frame_words(geometry: FrameGeometry, seed: usize, intact: bool) -> Vec<u16> {
    let mut words: Vec<u16> = (0..geometry.pixels())
        .map(|i| 0x0100 + ((i + seed * 7) % 0x3000) as u16)
        .collect();
    words[0] = 0x7fff;
    let (row, col) = geometry.trailer;
    if intact {
        words[row * geometry.width + col] = TRAILER;
    }
    words
}

/// Three padding words followed by the frame.
fn framed(geometry: FrameGeometry, seed: usize, intact: bool) -> Vec<u8> {
    let mut bytes = Vec::new();
    for _ in 0..3 {
        bytes.extend_from_slice(&0x7fffu16.to_le_bytes());
    }
    for word in frame_words(geometry, seed, intact) {
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    bytes
}

fn stream(geometry: FrameGeometry, seeds: &[usize]) -> Vec<u8> {
    seeds.iter().flat_map(|s| framed(geometry, *s, true)).collect()
}

// ---------------------------------------------------------------------------
// Marker search
// ---------------------------------------------------------------------------

#[test]
fn no_marker_no_start() {
    assert_eq!(find_image_start(&[]), None);
    assert_eq!(find_image_start(&[0x12; 64]), None);
    assert_eq!(find_image_start(&SYNC_MARKER), None);
    // Data too close to the end of the buffer is not looked at.
    let mut short = SYNC_MARKER.to_vec();
    short.extend_from_slice(&[0x01, 0x02]);
    assert_eq!(find_image_start(&short), None);
    // Padding that never ends.
    assert_eq!(find_image_start(&[0xffu8, 0x7f].repeat(32)), None);
}

#[test]
fn start_is_two_bytes_before_the_data() {
    let mut buf = vec![0x00, 0x11];
    buf.extend_from_slice(&SYNC_MARKER);
    buf.extend_from_slice(&[0x34, 0x12, 0x56, 0x12, 0x78, 0x12, 0x9a, 0x12]);

    assert_eq!(find_image_start(&buf), Some(8));
}

#[test]
fn longer_padding_still_lands_on_the_last_word() {
    let mut buf = [0xffu8, 0x7f].repeat(10);
    buf.extend_from_slice(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);

    assert_eq!(find_image_start(&buf), Some(18));
}

#[test]
fn marker_search_on_a_framed_stream() {
    let bytes = framed(SMALL, 0, true);
    assert_eq!(find_image_start(&bytes), Some(6));
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

#[test]
fn default_geometry_matches_the_sensor() {
    let geometry = FrameGeometry::default();
    assert_eq!((geometry.height, geometry.width), (245, 327));
    assert_eq!(geometry.trailer, (240, 326));
    assert_eq!(geometry.byte_len(), 245 * 327 * 2);
}

#[test]
fn frame_decodes_little_endian_rows() {
    let words = frame_words(SMALL, 0, true);
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();

    let frame = Frame::from_le_bytes(SMALL, &bytes).unwrap();

    assert_eq!(frame.pixels(), &words[..]);
    assert_eq!(frame.pixel(0, 0), Some(0x7fff));
    assert_eq!(frame.pixel(1, 2), Some(words[7]));
    assert_eq!(frame.row(2), Some(&words[10..15]));
    assert_eq!(frame.pixel(4, 0), None);
    assert_eq!(frame.pixel(0, 5), None);
    assert!(frame.is_valid());
    assert_eq!(frame.to_le_bytes(), bytes);
}

#[test]
fn frame_needs_exact_length() {
    assert_eq!(Frame::from_le_bytes(SMALL, &[0; 38]), None);
    assert_eq!(Frame::from_le_bytes(SMALL, &[0; 42]), None);
}

#[test]
fn frame_without_trailer_is_invalid() {
    let words = frame_words(SMALL, 0, false);
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();

    assert!(!Frame::from_le_bytes(SMALL, &bytes).unwrap().is_valid());
}

// ---------------------------------------------------------------------------
// Assembler
// ---------------------------------------------------------------------------

#[test]
fn waits_for_two_frames_before_syncing() {
    let mut assembler = FrameAssembler::new(SMALL);

    assert!(assembler.push(&framed(SMALL, 0, true)).is_empty());
    assert!(!assembler.is_synced());
    assert_eq!(assembler.buffered(), 46);

    let frames = assembler.push(&framed(SMALL, 1, true));

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].pixels(), &frame_words(SMALL, 0, true)[..]);
    assert_eq!(assembler.buffered(), 46);

    let last = assembler.finish().unwrap();
    assert_eq!(last.pixels(), &frame_words(SMALL, 1, true)[..]);
    assert_eq!(assembler.stats().frames, 2);
    assert_eq!(assembler.stats().resyncs, 2);
}

#[test]
fn chunked_input_yields_the_same_frames() {
    let bytes = stream(SMALL, &[0, 1, 2]);
    let mut assembler = FrameAssembler::new(SMALL);

    let mut frames = Vec::new();
    for chunk in bytes.chunks(7) {
        frames.extend(assembler.push(chunk));
    }
    assert_eq!(frames.len(), 2);
    frames.extend(assembler.finish());

    let expected: Vec<Vec<u16>> =
        (0..3).map(|s| frame_words(SMALL, s, true)).collect();
    let got: Vec<Vec<u16>> = frames.iter().map(|f| f.pixels().to_vec()).collect();
    assert_eq!(got, expected);
    assert_eq!(assembler.stats().rejected, 0);
}

#[test]
fn damaged_frame_is_dropped() {
    let mut bytes = framed(SMALL, 0, false);
    bytes.extend(framed(SMALL, 1, true));
    let mut assembler = FrameAssembler::new(SMALL);

    assert!(assembler.push(&bytes).is_empty());
    assert_eq!(assembler.stats().rejected, 1);

    let next = assembler.finish().unwrap();
    assert_eq!(next.pixels(), &frame_words(SMALL, 1, true)[..]);
}

#[test]
fn garbage_without_marker_is_discarded() {
    let mut assembler = FrameAssembler::new(SMALL);

    assert!(assembler.push(&[0x12; 80]).is_empty());

    assert_eq!(assembler.buffered(), 0);
    assert_eq!(assembler.stats().discarded, 80);
    assert!(!assembler.is_synced());
}

#[test]
fn leading_garbage_is_skipped() {
    let mut bytes = vec![0x42; 13];
    bytes.extend(stream(SMALL, &[0, 1]));
    let mut assembler = FrameAssembler::new(SMALL);

    let frames = assembler.push(&bytes);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].pixels(), &frame_words(SMALL, 0, true)[..]);
    assert_eq!(assembler.stats().discarded, 13 + 6);
}

#[test]
fn finish_on_short_tail_returns_nothing() {
    let mut assembler = FrameAssembler::new(SMALL);
    let bytes = framed(SMALL, 0, true);

    assembler.push(&bytes[..30]);

    assert_eq!(assembler.finish(), None);
    assert_eq!(assembler.buffered(), 0);
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

#[test]
fn extract_writes_one_file_per_valid_frame() {
    let geometry = FrameGeometry::default();
    let root = std::env::temp_dir()
        .join(format!("taxi-extract-{}", std::process::id()));
    let log = root.join("log.bin");
    fs::create_dir_all(&root).unwrap();
    let mut bytes = stream(geometry, &[0, 1]);
    bytes.extend(framed(geometry, 2, false));
    bytes.extend(framed(geometry, 3, true));
    fs::write(&log, &bytes).unwrap();

    let mut writer = FrameWriter::create(root.join("frames")).unwrap();
    let stats = extract(&log, &mut writer, geometry).unwrap();

    assert_eq!(stats.frames, 3);
    assert_eq!(stats.rejected, 1);
    assert_eq!(writer.written(), 3);
    let first = fs::read(root.join("frames").join("frame_00000.bin")).unwrap();
    assert_eq!(first.len(), geometry.byte_len());
    assert_eq!(u16::from_le_bytes([first[0], first[1]]), 0x7fff);
    assert!(root.join("frames").join("frame_00002.bin").exists());
    assert!(!root.join("frames").join("frame_00003.bin").exists());

    fs::remove_dir_all(&root).unwrap();
}
