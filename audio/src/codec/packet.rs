//! Length-prefixed packet bitstream.
//!
//! Each packet is stored as a 2-byte little-endian length followed by the
//! packet bytes. The stream has no header and no terminator record.

use std::io::{self, Read, Write};

use crate::error::{AudioError, AudioResult};

/// Largest packet a record can hold.
pub const MAX_PACKET_LEN: usize = u16::MAX as usize;

/// Writes length-prefixed packets.
pub struct PacketWriter<W: Write> {
    inner: W,
    packets: u32,
    max_packet_len: usize,
}

impl<W: Write> PacketWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            packets: 0,
            max_packet_len: 0,
        }
    }

    /// Appends one packet record.
    pub fn write_packet(&mut self, packet: &[u8]) -> AudioResult<()> {
        let len = u16::try_from(packet.len()).map_err(|_| {
            AudioError::InvalidArgument(format!(
                "packet of {} bytes exceeds {MAX_PACKET_LEN}",
                packet.len()
            ))
        })?;
        self.inner.write_all(&len.to_le_bytes())?;
        self.inner.write_all(packet)?;
        self.packets += 1;
        self.max_packet_len = self.max_packet_len.max(packet.len());
        Ok(())
    }

    /// Packets written so far.
    pub fn packets(&self) -> u32 {
        self.packets
    }

    /// Length of the longest packet written so far.
    pub fn max_packet_len(&self) -> usize {
        self.max_packet_len
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Reads length-prefixed packets until end of stream.
pub struct PacketReader<R: Read> {
    inner: R,
}

impl<R: Read> PacketReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Reads the next packet, or `None` at a clean end of stream.
    pub fn next_packet(&mut self) -> AudioResult<Option<Vec<u8>>> {
        let mut header = [0u8; 2];
        match read_full(&mut self.inner, &mut header)? {
            0 => return Ok(None),
            2 => {}
            _ => {
                return Err(AudioError::CorruptData(
                    "packet stream ends inside a length prefix".to_string(),
                ));
            }
        }

        let len = usize::from(u16::from_le_bytes(header));
        let mut packet = vec![0u8; len];
        let n = read_full(&mut self.inner, &mut packet)?;
        if n != len {
            return Err(AudioError::CorruptData(format!(
                "packet stream truncated: expected {len} bytes, got {n}"
            )));
        }
        Ok(Some(packet))
    }
}

impl<R: Read> Iterator for PacketReader<R> {
    type Item = AudioResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_packet().transpose()
    }
}

/// Reads until `buf` is full or the stream ends, returning the bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let mut writer = PacketWriter::new(Vec::new());
        writer.write_packet(&[0xAA, 0xBB, 0xCC]).unwrap();
        writer.write_packet(&[]).unwrap();
        writer.write_packet(&[0x01]).unwrap();
        assert_eq!(writer.packets(), 3);
        assert_eq!(writer.max_packet_len(), 3);

        let bytes = writer.into_inner();
        assert_eq!(
            bytes,
            vec![3, 0, 0xAA, 0xBB, 0xCC, 0, 0, 1, 0, 0x01]
        );
    }

    #[test]
    fn test_read_back() {
        let mut writer = PacketWriter::new(Vec::new());
        let big = vec![7u8; 300];
        writer.write_packet(&big).unwrap();
        writer.write_packet(b"tail").unwrap();

        let bytes = writer.into_inner();
        let reader = PacketReader::new(bytes.as_slice());
        let packets: Vec<Vec<u8>> = reader.collect::<AudioResult<_>>().unwrap();
        assert_eq!(packets, vec![big, b"tail".to_vec()]);
    }

    #[test]
    fn test_oversized_packet_rejected() {
        let mut writer = PacketWriter::new(Vec::new());
        let err = writer.write_packet(&vec![0u8; MAX_PACKET_LEN + 1]).unwrap_err();
        assert!(matches!(err, AudioError::InvalidArgument(_)));
        assert!(writer.into_inner().is_empty());

        let mut writer = PacketWriter::new(Vec::new());
        writer.write_packet(&vec![0u8; MAX_PACKET_LEN]).unwrap();
    }

    #[test]
    fn test_truncated_stream() {
        // half a length prefix
        let mut reader = PacketReader::new(&[5u8][..]);
        assert!(matches!(reader.next_packet(), Err(AudioError::CorruptData(_))));

        // prefix promises more than is there
        let mut reader = PacketReader::new(&[5u8, 0, 1, 2][..]);
        assert!(matches!(reader.next_packet(), Err(AudioError::CorruptData(_))));
    }

    #[test]
    fn test_empty_stream() {
        let mut reader = PacketReader::new(&[0u8; 0][..]);
        assert!(reader.next_packet().unwrap().is_none());
    }
}
