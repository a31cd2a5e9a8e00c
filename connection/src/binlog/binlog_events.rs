use tracing::debug;

use common::err::replica_error::ReError;
use common::err::CResult;

use binlog::decoder::event_decoder::EventDecoder;
use binlog::events::event::Event;
use binlog::events::event_header::Header;

use crate::conn::packet_channel::PacketChannel;
use crate::packet::{check_error_packet, is_eof_packet, response_type};

const SEMI_SYNC_INDICATOR: u8 = 0xef;

/// The blocking event stream behind a dump command. Each iteration pulls
/// one network packet, strips the OK byte and the optional semi-sync
/// header, validates the checksum and decodes the event. Semi-sync ACKs
/// are written back inline when the primary asks for one.
pub struct BinlogEvents {
    channel: PacketChannel,
    decoder: EventDecoder,
    semi_sync: bool,
    /// Maintained off ROTATE events for semi-sync ACK frames
    current_file: String,
    closed: bool,
}

impl BinlogEvents {
    pub fn new(
        channel: PacketChannel,
        decoder: EventDecoder,
        semi_sync: bool,
        current_file: String,
    ) -> Self {
        BinlogEvents {
            channel,
            decoder,
            semi_sync,
            current_file,
            closed: false,
        }
    }

    /// Tear the socket down; the iterator yields `None` from here on.
    pub fn shutdown(&mut self) {
        if !self.closed {
            self.closed = true;
            let _ = self.channel.shutdown();
        }
    }

    pub fn current_file(&self) -> &str {
        &self.current_file
    }

    fn read_one(&mut self) -> CResult<(Header, Event)> {
        let (packet, _) = self.channel.read_packet()?;

        match packet.first() {
            Some(&response_type::ERROR) => {
                check_error_packet(&packet, "Binlog stream error.")?;
                return Err(ReError::ConnectionError(
                    "malformed error packet".to_string(),
                ));
            }
            Some(&response_type::OK) => {}
            _ if is_eof_packet(&packet) => return Err(ReError::StreamClosed),
            _ => {
                return Err(ReError::decode(
                    0,
                    format!("unexpected packet marker {:?}", packet.first()),
                ))
            }
        }

        let mut payload = &packet[1..];

        let mut need_ack = false;
        if self.semi_sync && payload.first() == Some(&SEMI_SYNC_INDICATOR) {
            need_ack = payload.get(1) == Some(&1);
            payload = payload.get(2..).ok_or_else(ReError::incomplete)?;
        }

        let (header, event) = self.decoder.decode(payload)?;

        if let Event::Rotate(ref rotate) = event {
            self.current_file = rotate.next_binlog.clone();
        }

        if need_ack {
            self.ack(header.log_pos as u64)?;
        }

        Ok((header, event))
    }

    /// Semi-sync ACK: magic byte, 8-byte position, current file name.
    fn ack(&mut self, log_pos: u64) -> CResult<()> {
        let mut packet = Vec::with_capacity(9 + self.current_file.len());
        packet.push(SEMI_SYNC_INDICATOR);
        packet.extend_from_slice(&log_pos.to_le_bytes());
        packet.extend_from_slice(self.current_file.as_bytes());
        debug!(log_pos, file = self.current_file.as_str(), "semi-sync ack");
        self.channel.write_packet(&packet, 0)
    }
}

impl Iterator for BinlogEvents {
    type Item = CResult<(Header, Event)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }
        match self.read_one() {
            Ok(item) => Some(Ok(item)),
            Err(ReError::StreamClosed) => {
                self.closed = true;
                None
            }
            Err(e) => {
                if e.is_transport() {
                    self.closed = true;
                }
                Some(Err(e))
            }
        }
    }
}
