//! Stream helpers shared by the header and record codecs.

use std::io::{ErrorKind, Read};

/// Reads into `buf` until it is full or the source reaches end-of-stream.
///
/// Returns how many bytes were actually delivered, which is less than
/// `buf.len()` only at end-of-stream. `Interrupted` is retried.
pub(crate) fn read_full<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
