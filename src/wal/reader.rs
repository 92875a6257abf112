//! Forward-only record reader over one segment or one checkpoint
//!
//! A checkpoint directory may hold several segment files; they are read
//! back-to-back as a single stream and offsets are counted across them.
//!
//! Corruption policy:
//! - A clean end of stream on a frame boundary ends iteration
//! - Every frame lies wholly within one file; a file ending mid-frame is
//!   corruption even when another file follows
//! - Anything else short of a full, checksum-valid frame is corruption
//! - No skipping, no repair

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use super::errors::{WalError, WalResult};
use super::frame::{payload_checksum, FrameHeader, FRAME_HEADER_SIZE};

/// Lazy reader yielding raw record payloads in append order.
pub struct SegmentReader {
    files: Vec<(PathBuf, BufReader<File>)>,
    /// Index into `files` of the file currently being read
    current: usize,
    /// Bytes consumed from the logical stream
    offset: u64,
    /// Stream offset of the most recently returned record
    record_offset: u64,
    max_record_bytes: u32,
    buf: Vec<u8>,
}

impl SegmentReader {
    /// Opens a single segment file.
    pub fn open(path: &Path, max_record_bytes: u32) -> WalResult<Self> {
        Self::open_all(&[path.to_path_buf()], max_record_bytes)
    }

    /// Opens several segment files to be read as one stream, in the given order.
    ///
    /// All files are opened up front so that a missing file fails the open
    /// rather than surfacing halfway through replay.
    pub fn open_all(paths: &[PathBuf], max_record_bytes: u32) -> WalResult<Self> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let file = File::open(path).map_err(|e| {
                WalError::read_failed(format!("Failed to open segment: {}", path.display()), e)
            })?;
            files.push((path.clone(), BufReader::new(file)));
        }

        Ok(Self {
            files,
            current: 0,
            offset: 0,
            record_offset: 0,
            max_record_bytes,
            buf: Vec::new(),
        })
    }

    /// Paths of the files backing this reader.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|(path, _)| path.as_path())
    }

    /// Stream offset of the most recently returned record.
    pub fn record_offset(&self) -> u64 {
        self.record_offset
    }

    /// Total bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Reads into `out` until it is full or the current file ends.
    ///
    /// Moves on to the next file only when `at_frame_start` is set and
    /// nothing has been read yet, so a frame is never stitched together
    /// from two files.
    fn read_fully(&mut self, out: &mut [u8], at_frame_start: bool) -> io::Result<usize> {
        let mut filled = 0;
        while filled < out.len() && self.current < self.files.len() {
            let (_, reader) = &mut self.files[self.current];
            match reader.read(&mut out[filled..]) {
                Ok(0) if filled == 0 && at_frame_start => self.current += 1,
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    fn current_path(&self) -> String {
        self.files
            .get(self.current)
            .map(|(path, _)| path.display().to_string())
            .unwrap_or_default()
    }

    fn io_error(&self, offset: u64, source: io::Error) -> WalError {
        WalError::read_failed(
            format!(
                "Failed to read segment {} at stream offset {}",
                self.current_path(),
                offset
            ),
            source,
        )
    }

    /// Reads the next record payload.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(payload))` for a complete, checksum-valid record
    /// - `Ok(None)` at a clean end of stream
    /// - `Err(WalError)` with code `WAL_CORRUPTION` for a torn or corrupt
    ///   frame, `WAL_READ_FAILED` for I/O errors
    pub fn next_record(&mut self) -> WalResult<Option<&[u8]>> {
        let start = self.offset;

        let mut raw = [0u8; FRAME_HEADER_SIZE];
        let n = self
            .read_fully(&mut raw, true)
            .map_err(|e| self.io_error(start, e))?;
        if n == 0 {
            return Ok(None);
        }
        if n < FRAME_HEADER_SIZE {
            return Err(WalError::corruption_at_offset(
                start,
                format!(
                    "Truncated frame header in {}: {} of {} bytes",
                    self.current_path(),
                    n,
                    FRAME_HEADER_SIZE
                ),
            ));
        }

        let header = FrameHeader::parse(&raw);
        if header.length > self.max_record_bytes {
            return Err(WalError::corruption_at_offset(
                start,
                format!(
                    "Record length {} exceeds maximum {}",
                    header.length, self.max_record_bytes
                ),
            ));
        }

        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();
        buf.resize(header.length as usize, 0);
        let read = self.read_fully(&mut buf, false);
        self.buf = buf;
        let n = read.map_err(|e| self.io_error(start, e))?;

        if n < header.length as usize {
            return Err(WalError::corruption_at_offset(
                start,
                format!(
                    "Truncated record in {}: {} of {} payload bytes",
                    self.current_path(),
                    n,
                    header.length
                ),
            ));
        }

        let computed = payload_checksum(&self.buf);
        if computed != header.checksum {
            return Err(WalError::corruption_at_offset(
                start,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    computed, header.checksum
                ),
            ));
        }

        self.record_offset = start;
        self.offset = start + (FRAME_HEADER_SIZE + self.buf.len()) as u64;
        Ok(Some(self.buf.as_slice()))
    }

    /// Releases the underlying files.
    ///
    /// Read-only handles have nothing to flush, so this only fails for
    /// readers of other backends; the filesystem reader always succeeds.
    pub fn close(self) -> WalResult<()> {
        drop(self.files);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::frame::{encode_frame, DEFAULT_MAX_RECORD_BYTES};
    use std::fs::{self, OpenOptions};
    use std::io::{Seek, SeekFrom, Write};
    use tempfile::TempDir;

    fn write_frames(path: &Path, payloads: &[&[u8]]) {
        let mut data = Vec::new();
        for payload in payloads {
            data.extend_from_slice(&encode_frame(payload).unwrap());
        }
        fs::write(path, data).unwrap();
    }

    fn read_all(reader: &mut SegmentReader) -> WalResult<Vec<Vec<u8>>> {
        let mut out = Vec::new();
        while let Some(rec) = reader.next_record()? {
            out.push(rec.to_vec());
        }
        Ok(out)
    }

    #[test]
    fn test_read_empty_segment() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("00000000");
        fs::write(&path, b"").unwrap();

        let mut reader = SegmentReader::open(&path, DEFAULT_MAX_RECORD_BYTES).unwrap();
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn test_read_records_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("00000000");
        write_frames(&path, &[b"one", b"two", b"three"]);

        let mut reader = SegmentReader::open(&path, DEFAULT_MAX_RECORD_BYTES).unwrap();
        assert_eq!(reader.next_record().unwrap(), Some(&b"one"[..]));
        assert_eq!(reader.record_offset(), 0);
        assert_eq!(reader.next_record().unwrap(), Some(&b"two"[..]));
        assert_eq!(reader.record_offset(), 11);
        assert_eq!(reader.next_record().unwrap(), Some(&b"three"[..]));
        assert!(reader.next_record().unwrap().is_none());
        assert_eq!(reader.offset(), 3 * 8 + 3 + 3 + 5);
    }

    #[test]
    fn test_multiple_files_read_as_one_stream() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("00000000");
        let b = temp_dir.path().join("00000001");
        write_frames(&a, &[b"a1", b"a2"]);
        write_frames(&b, &[b"b1"]);

        let mut reader =
            SegmentReader::open_all(&[a.clone(), b.clone()], DEFAULT_MAX_RECORD_BYTES).unwrap();
        let records = read_all(&mut reader).unwrap();
        assert_eq!(records, vec![b"a1".to_vec(), b"a2".to_vec(), b"b1".to_vec()]);
        assert_eq!(reader.paths().count(), 2);
        reader.close().unwrap();
    }

    #[test]
    fn test_missing_file_fails_open() {
        let temp_dir = TempDir::new().unwrap();
        let result = SegmentReader::open(
            &temp_dir.path().join("00000005"),
            DEFAULT_MAX_RECORD_BYTES,
        );
        let err = result.err().unwrap();
        assert_eq!(err.code().code(), "WAL_READ_FAILED");
    }

    #[test]
    fn test_torn_tail_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("00000000");
        write_frames(&path, &[b"complete", b"torn-record"]);

        let file = OpenOptions::new().write(true).open(&path).unwrap();
        let len = file.metadata().unwrap().len();
        file.set_len(len - 4).unwrap();

        let mut reader = SegmentReader::open(&path, DEFAULT_MAX_RECORD_BYTES).unwrap();
        assert_eq!(reader.next_record().unwrap(), Some(&b"complete"[..]));

        let err = reader.next_record().unwrap_err();
        assert!(err.is_corruption());
        assert_eq!(err.offset(), Some(16));
    }

    #[test]
    fn test_partial_header_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("00000000");
        fs::write(&path, [1u8, 0, 0]).unwrap();

        let mut reader = SegmentReader::open(&path, DEFAULT_MAX_RECORD_BYTES).unwrap();
        let err = reader.next_record().unwrap_err();
        assert!(err.is_corruption());
        assert_eq!(err.offset(), Some(0));
    }

    #[test]
    fn test_checksum_mismatch_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("00000000");
        write_frames(&path, &[b"payload"]);

        {
            let mut file = OpenOptions::new().write(true).open(&path).unwrap();
            file.seek(SeekFrom::Start(10)).unwrap();
            file.write_all(&[0xFF]).unwrap();
        }

        let mut reader = SegmentReader::open(&path, DEFAULT_MAX_RECORD_BYTES).unwrap();
        let err = reader.next_record().unwrap_err();
        assert!(err.is_corruption());
        assert!(err.message().contains("Checksum mismatch"));
    }

    #[test]
    fn test_oversized_length_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("00000000");
        write_frames(&path, &[&[0u8; 64]]);

        let mut reader = SegmentReader::open(&path, 32).unwrap();
        let err = reader.next_record().unwrap_err();
        assert!(err.message().contains("exceeds maximum"));
    }

    #[test]
    fn test_payload_split_across_files_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("00000000");
        let b = temp_dir.path().join("00000001");

        // One valid frame whose payload is cut at the file boundary
        let frame = encode_frame(b"split-payload").unwrap();
        let cut = FRAME_HEADER_SIZE + 5;
        let mut first = encode_frame(b"whole").unwrap();
        first.extend_from_slice(&frame[..cut]);
        fs::write(&a, first).unwrap();
        fs::write(&b, &frame[cut..]).unwrap();

        let mut reader =
            SegmentReader::open_all(&[a.clone(), b], DEFAULT_MAX_RECORD_BYTES).unwrap();
        assert_eq!(reader.next_record().unwrap(), Some(&b"whole"[..]));

        let err = reader.next_record().unwrap_err();
        assert!(err.is_corruption());
        assert_eq!(err.offset(), Some(13));
        assert!(err.message().contains(&a.display().to_string()));
    }

    #[test]
    fn test_header_split_across_files_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("00000000");
        let b = temp_dir.path().join("00000001");

        let frame = encode_frame(b"abc").unwrap();
        fs::write(&a, &frame[..3]).unwrap();
        fs::write(&b, &frame[3..]).unwrap();

        let mut reader = SegmentReader::open_all(&[a, b], DEFAULT_MAX_RECORD_BYTES).unwrap();
        let err = reader.next_record().unwrap_err();
        assert!(err.is_corruption());
        assert_eq!(err.offset(), Some(0));
        assert!(err.message().contains("Truncated frame header"));
    }

    #[test]
    fn test_empty_file_between_files_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("00000000");
        let b = temp_dir.path().join("00000001");
        let c = temp_dir.path().join("00000002");
        write_frames(&a, &[b"a"]);
        fs::write(&b, b"").unwrap();
        write_frames(&c, &[b"c"]);

        let mut reader = SegmentReader::open_all(&[a, b, c], DEFAULT_MAX_RECORD_BYTES).unwrap();
        let records = read_all(&mut reader).unwrap();
        assert_eq!(records, vec![b"a".to_vec(), b"c".to_vec()]);
    }
}
