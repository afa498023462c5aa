//! Byte sources fed to the decoder

use std::io::{self, Read};

use crate::config::ShortRead;
use crate::error::LoadError;

pub(super) const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Cheap up-front check so non-PNG blobs never reach the decoder
pub(super) fn check_signature(data: &[u8]) -> Result<(), LoadError> {
    match data.get(..PNG_SIGNATURE.len()) {
        Some(head) if *head == PNG_SIGNATURE => Ok(()),
        _ => Err(LoadError::UnsupportedSignature),
    }
}

/// Reads from a fixed buffer, advancing a cursor over it
#[derive(Debug)]
pub struct MemoryReader<'a> {
    remaining: &'a [u8],
    short_read: ShortRead,
    padded: usize,
}

impl<'a> MemoryReader<'a> {
    pub fn new(data: &'a [u8], short_read: ShortRead) -> Self {
        Self {
            remaining: data,
            short_read,
            padded: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    /// Zero bytes handed out past the end of the buffer so far
    pub fn padded(&self) -> usize {
        self.padded
    }
}

impl Read for MemoryReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.remaining.len());
        let (head, tail) = self.remaining.split_at(n);
        buf[..n].copy_from_slice(head);
        self.remaining = tail;

        match self.short_read {
            ShortRead::Fail => Ok(n),
            ShortRead::ZeroFill => {
                let shortfall = buf.len() - n;
                if shortfall > 0 {
                    if self.padded == 0 {
                        log::warn!("PNG buffer exhausted, feeding zero bytes to the decoder");
                    }
                    buf[n..].fill(0);
                    self.padded += shortfall;
                }
                Ok(buf.len())
            }
        }
    }
}

#[test]
fn signature() {
    let mut data = PNG_SIGNATURE.to_vec();
    assert!(check_signature(&data).is_ok());
    assert!(check_signature(&data[..7]).is_err());

    data[1] = b'p';
    assert!(matches!(
        check_signature(&data),
        Err(LoadError::UnsupportedSignature)
    ));
}

#[test]
fn fail_mode_reports_eof() {
    let mut reader = MemoryReader::new(&[1, 2, 3], ShortRead::Fail);
    let mut buf = [9u8; 2];

    assert_eq!(reader.read(&mut buf).unwrap(), 2);
    assert_eq!(buf, [1, 2]);
    assert_eq!(reader.read(&mut buf).unwrap(), 1);
    assert_eq!(reader.read(&mut buf).unwrap(), 0);

    let mut reader = MemoryReader::new(&[1, 2, 3], ShortRead::Fail);
    let mut buf = [0u8; 4];
    let err = reader.read_exact(&mut buf).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
}

#[test]
fn zero_fill_mode_pads_deterministically() {
    let mut reader = MemoryReader::new(&[1, 2, 3], ShortRead::ZeroFill);
    let mut buf = [9u8; 5];

    assert_eq!(reader.read(&mut buf).unwrap(), 5);
    assert_eq!(buf, [1, 2, 3, 0, 0]);
    assert_eq!(reader.remaining(), 0);

    let mut buf = [9u8; 4];
    assert_eq!(reader.read(&mut buf).unwrap(), 4);
    assert_eq!(buf, [0; 4]);
    assert_eq!(reader.padded(), 6);
}
