//! Serial stream framing.
//!
//! Every protobuf on the wire is prefixed by a 4 byte header:
//! `0x94 0xC3 <len hi> <len lo>`. The radio also prints plain debug text
//! on the same port, so the decoder skips anything between frames.

use prost::Message;

use super::RadioError;

pub const START1: u8 = 0x94;
pub const START2: u8 = 0xC3;
pub const HEADER_LEN: usize = 4;
/// Largest payload the firmware will send or accept.
pub const MAX_PAYLOAD: usize = 512;

/// Encode a message into a length-prefixed frame.
pub fn encode_frame<M: Message>(msg: &M) -> Result<Vec<u8>, RadioError> {
    let len = msg.encoded_len();
    if len > MAX_PAYLOAD {
        return Err(RadioError::PayloadTooLarge {
            len,
            max: MAX_PAYLOAD,
        });
    }

    let mut frame = Vec::with_capacity(HEADER_LEN + len);
    frame.extend_from_slice(&[START1, START2]);
    frame.extend_from_slice(&(len as u16).to_be_bytes());
    msg.encode(&mut frame)?;
    Ok(frame)
}

/// Incremental decoder for the radio's output stream.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pop the next complete frame payload, if one is buffered.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.buf.windows(2).position(|w| w == [START1, START2]) {
                Some(0) => {}
                Some(pos) => {
                    self.buf.drain(..pos);
                }
                None => {
                    // A trailing START1 may be the first half of a header.
                    let keep = usize::from(self.buf.last() == Some(&START1));
                    let cut = self.buf.len() - keep;
                    self.buf.drain(..cut);
                    return None;
                }
            }

            if self.buf.len() < HEADER_LEN {
                return None;
            }

            let len = u16::from_be_bytes([self.buf[2], self.buf[3]]) as usize;
            if len > MAX_PAYLOAD {
                // Not a real header, resync past it.
                self.buf.drain(..1);
                continue;
            }
            if self.buf.len() < HEADER_LEN + len {
                return None;
            }

            let frame = self.buf[HEADER_LEN..HEADER_LEN + len].to_vec();
            self.buf.drain(..HEADER_LEN + len);
            return Some(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::proto::{MeshPacket, ToRadio};

    #[test]
    fn test_encode_frame_header() {
        let frame = encode_frame(&ToRadio::want_config(1)).unwrap();
        assert_eq!(frame, vec![0x94, 0xC3, 0x00, 0x02, 0x18, 0x01]);
    }

    #[test]
    fn test_encode_frame_rejects_oversize() {
        let text = "x".repeat(600);
        let packet = MeshPacket::text(1, 0, 3, 1, &text);
        assert!(matches!(
            encode_frame(&ToRadio::packet(packet)),
            Err(RadioError::PayloadTooLarge { max: 512, .. })
        ));
    }

    #[test]
    fn test_decoder_skips_debug_text() {
        let mut decoder = FrameDecoder::new();
        decoder.push(b"INFO | booting\r\n");
        decoder.push(&[0x94, 0xC3, 0x00, 0x02, 0x38, 0x05]);
        decoder.push(b"more noise");

        assert_eq!(decoder.next_frame(), Some(vec![0x38, 0x05]));
        assert_eq!(decoder.next_frame(), None);
    }

    #[test]
    fn test_decoder_handles_split_frames() {
        let mut decoder = FrameDecoder::new();
        decoder.push(&[0x00, 0x94]);
        assert_eq!(decoder.next_frame(), None);
        decoder.push(&[0xC3, 0x00]);
        assert_eq!(decoder.next_frame(), None);
        decoder.push(&[0x03, 0x01, 0x02]);
        assert_eq!(decoder.next_frame(), None);
        decoder.push(&[0x03, 0x94, 0xC3, 0x00, 0x00]);

        assert_eq!(decoder.next_frame(), Some(vec![0x01, 0x02, 0x03]));
        assert_eq!(decoder.next_frame(), Some(vec![]));
        assert_eq!(decoder.next_frame(), None);
    }

    #[test]
    fn test_decoder_resyncs_on_bogus_length() {
        let mut decoder = FrameDecoder::new();
        decoder.push(&[0x94, 0xC3, 0xFF, 0xFF, 0x94, 0xC3, 0x00, 0x01, 0x2A]);
        assert_eq!(decoder.next_frame(), Some(vec![0x2A]));
    }
}
