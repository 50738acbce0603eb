//! SAE J1939-21 transport protocol: moves payloads of up to 1785 bytes as a
//! connection-management exchange followed by numbered data-transfer frames.
//!
//! Two sub-protocols share one engine:
//! - **BAM** (broadcast): the sender announces the transfer, then emits a data
//!   frame every 50 ms; receivers never answer.
//! - **RTS/CTS** (peer to peer): the receiver clears the transfer with a CTS and
//!   confirms the complete message with an end-of-message ACK.
//!
//! A node runs at most one connection at a time. The engine is driven by
//! [`TransportProtocol::update`] (timers) and [`TransportProtocol::dispatch`]
//! (received CM/DT messages); it talks to the bus and the application only
//! through the node's [`NodePort`].
pub mod cm;
pub mod session;

use crate::core::{Message, MAX_TP_PAYLOAD};
use crate::error::SendError;
use crate::protocol::node::port::NodePort;
use crate::protocol::transport::traits::link::J1939Link;
use crate::protocol::transport::{
    TP_PACKET_PERIOD_MS, TP_PRIORITY, TP_TIMEOUT_T1_MS, TP_TIMEOUT_T3_MS, TP_TIMEOUT_TR_MS,
};
use crate::protocol::{ADDRESS_GLOBAL, PGN_TP_CM, PGN_TP_DT};
use cm::{AbortReason, ConnectionManagement, RTS_MAX_PACKETS};
use session::{AcceptResult, Session, BYTES_PER_PACKET};

//==================================================================================POLICY
/// What a receiver does with a data-transfer frame carrying an unexpected
/// sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceMismatch {
    /// Drop the frame; the connection keeps waiting for the expected one.
    #[default]
    Ignore,
    /// Send ABORT (Other) and close the connection.
    Abort,
}

//==================================================================================CONNECTION
/// Connection kind as seen from outside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionKind {
    None,
    Broadcast,
    PeerToPeer,
}

/// Side of the active connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    Sender,
    Receiver,
}

/// One state per (kind, role) pair; the flags only exist where they mean something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connection {
    Idle,
    BroadcastSender,
    BroadcastReceiver,
    PeerSender { clear_to_send: bool },
    PeerReceiver { cts_sent: bool },
}

/// Routing of the message being transferred.
#[derive(Debug, Clone, Copy)]
struct Transfer {
    pgn: u32,
    priority: u8,
    /// Remote end: destination when sending, source when receiving.
    peer: u8,
    /// Destination recorded on the reassembled message.
    destination: u8,
}

impl Transfer {
    const EMPTY: Self = Self {
        pgn: 0,
        priority: TP_PRIORITY,
        peer: ADDRESS_GLOBAL,
        destination: ADDRESS_GLOBAL,
    };
}

//==================================================================================ENGINE
/// Per-node transport-protocol state.
pub struct TransportProtocol {
    connection: Connection,
    transfer: Transfer,
    session: Session,
    timer_ms: u32,
    sequence_mismatch: SequenceMismatch,
}

impl TransportProtocol {
    pub const fn new(sequence_mismatch: SequenceMismatch) -> Self {
        Self {
            connection: Connection::Idle,
            transfer: Transfer::EMPTY,
            session: Session::new(),
            timer_ms: 0,
            sequence_mismatch,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.connection != Connection::Idle
    }

    pub fn connection_kind(&self) -> ConnectionKind {
        match self.connection {
            Connection::Idle => ConnectionKind::None,
            Connection::BroadcastSender | Connection::BroadcastReceiver => {
                ConnectionKind::Broadcast
            }
            Connection::PeerSender { .. } | Connection::PeerReceiver { .. } => {
                ConnectionKind::PeerToPeer
            }
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self.connection {
            Connection::Idle => None,
            Connection::BroadcastSender | Connection::PeerSender { .. } => Some(Role::Sender),
            Connection::BroadcastReceiver | Connection::PeerReceiver { .. } => {
                Some(Role::Receiver)
            }
        }
    }

    /// PGN of the message in transfer, if any.
    pub fn active_pgn(&self) -> Option<u32> {
        self.is_active().then_some(self.transfer.pgn)
    }

    /// Time since the last meaningful event of the active connection.
    #[inline]
    pub fn timer_ms(&self) -> u32 {
        self.timer_ms
    }

    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Drop the active connection without telling the peer.
    pub fn close(&mut self) {
        #[cfg(feature = "defmt")]
        if self.is_active() {
            defmt::debug!("TP connection closed (pgn {=u32:#x})", self.transfer.pgn);
        }
        self.connection = Connection::Idle;
    }

    //==================================================================================QUEUE
    /// Start sending `message` (BAM when its destination is global, RTS/CTS otherwise).
    pub fn queue<L: J1939Link>(
        &mut self,
        port: &mut NodePort<L>,
        message: &Message<'_>,
    ) -> Result<(), SendError<L::Error>> {
        if self.is_active() {
            return Err(SendError::ConnectionBusy);
        }
        let len = message.data.len();
        if len == 0 {
            return Err(SendError::EmptyPayload);
        }
        if len > MAX_TP_PAYLOAD {
            return Err(SendError::PayloadTooLarge { len });
        }

        self.session.start_send(message.data);
        self.transfer = Transfer {
            pgn: message.pgn,
            priority: message.priority,
            peer: message.destination,
            destination: message.destination,
        };
        self.timer_ms = 0;

        let total_size = len as u16;
        let total_packets = self.session.total_packets();
        let announce = if message.is_broadcast() {
            self.connection = Connection::BroadcastSender;
            ConnectionManagement::BroadcastAnnounce {
                total_size,
                total_packets,
                pgn: message.pgn,
            }
        } else {
            self.connection = Connection::PeerSender {
                clear_to_send: false,
            };
            ConnectionManagement::RequestToSend {
                total_size,
                total_packets,
                max_packets: RTS_MAX_PACKETS,
                pgn: message.pgn,
            }
        };

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "TP open as sender: pgn {=u32:#x}, {} bytes to {}",
            message.pgn,
            len,
            message.destination
        );

        if let Err(e) = send_cm(port, &announce, message.destination) {
            self.close();
            return Err(e);
        }
        Ok(())
    }

    //==================================================================================UPDATE
    /// Advance the connection timer by `elapsed_ms` and run the periodic duties
    /// of the active connection.
    pub fn update<L: J1939Link>(&mut self, port: &mut NodePort<L>, elapsed_ms: u32) {
        self.timer_ms = self.timer_ms.saturating_add(elapsed_ms);

        match self.connection {
            Connection::Idle => {}
            Connection::BroadcastSender => self.update_broadcast_sender(port),
            Connection::BroadcastReceiver => self.update_broadcast_receiver(port),
            Connection::PeerSender { clear_to_send } => {
                self.update_peer_sender(port, clear_to_send)
            }
            Connection::PeerReceiver { cts_sent } => self.update_peer_receiver(port, cts_sent),
        }
    }

    fn update_broadcast_sender<L: J1939Link>(&mut self, port: &mut NodePort<L>) {
        if self.timer_ms >= TP_PACKET_PERIOD_MS {
            self.send_next_segment(port);
            self.timer_ms = 0;
        }
        if self.session.bytes_remaining() == 0 {
            self.close();
        }
    }

    fn update_broadcast_receiver<L: J1939Link>(&mut self, port: &mut NodePort<L>) {
        if self.session.bytes_remaining() == 0 {
            self.deliver(port);
            self.close();
        } else if self.timer_ms >= TP_TIMEOUT_T1_MS {
            self.abort(port, AbortReason::Timeout);
        }
    }

    fn update_peer_sender<L: J1939Link>(&mut self, port: &mut NodePort<L>, clear_to_send: bool) {
        if !clear_to_send {
            if self.timer_ms >= TP_TIMEOUT_TR_MS {
                self.abort(port, AbortReason::Timeout);
            }
        } else if self.session.bytes_remaining() > 0 {
            if self.timer_ms >= TP_PACKET_PERIOD_MS {
                self.send_next_segment(port);
                self.timer_ms = 0;
            }
        } else if self.timer_ms >= TP_TIMEOUT_T3_MS {
            self.abort(port, AbortReason::Timeout);
        }
    }

    fn update_peer_receiver<L: J1939Link>(&mut self, port: &mut NodePort<L>, cts_sent: bool) {
        if !cts_sent {
            if self.timer_ms >= TP_PACKET_PERIOD_MS {
                let cts = ConnectionManagement::ClearToSend {
                    packets: self.session.total_packets(),
                    next_sequence: 1,
                    pgn: self.transfer.pgn,
                };
                log_failure(send_cm(port, &cts, self.transfer.peer));
                self.timer_ms = 0;
                self.connection = Connection::PeerReceiver { cts_sent: true };
            }
        } else if self.session.bytes_remaining() == 0 {
            let ack = ConnectionManagement::EndOfMessageAck {
                total_size: self.session.total_size() as u16,
                total_packets: self.session.total_packets(),
                pgn: self.transfer.pgn,
            };
            log_failure(send_cm(port, &ack, self.transfer.peer));
            self.deliver(port);
            self.close();
        } else if self.timer_ms >= TP_TIMEOUT_T1_MS {
            self.abort(port, AbortReason::Timeout);
        }
    }

    //==================================================================================DISPATCH
    /// Entry point for received TP.CM and TP.DT messages; other PGNs are ignored.
    pub fn dispatch<L: J1939Link>(&mut self, port: &mut NodePort<L>, message: &Message<'_>) {
        match message.pgn {
            PGN_TP_CM => self.on_connection_management(port, message),
            PGN_TP_DT => self.on_data_transfer(port, message),
            _ => {}
        }
    }

    fn on_connection_management<L: J1939Link>(
        &mut self,
        port: &mut NodePort<L>,
        message: &Message<'_>,
    ) {
        let Ok(cm) = ConnectionManagement::decode(message.data) else {
            return;
        };

        match cm {
            ConnectionManagement::RequestToSend {
                total_size,
                total_packets,
                pgn,
                ..
            } => {
                if self.refuse_when_busy(port, message.source, pgn) {
                    return;
                }
                if !valid_announced_size(total_size) {
                    let abort = ConnectionManagement::Abort {
                        reason: AbortReason::Resources,
                        pgn,
                    };
                    log_failure(send_cm(port, &abort, message.source));
                    return;
                }
                self.open_receiver(
                    Connection::PeerReceiver { cts_sent: false },
                    message,
                    pgn,
                    total_size,
                    total_packets,
                    port.source_address(),
                );
            }
            ConnectionManagement::BroadcastAnnounce {
                total_size,
                total_packets,
                pgn,
            } => {
                if self.refuse_when_busy(port, message.source, pgn) {
                    return;
                }
                if valid_announced_size(total_size) {
                    self.open_receiver(
                        Connection::BroadcastReceiver,
                        message,
                        pgn,
                        total_size,
                        total_packets,
                        ADDRESS_GLOBAL,
                    );
                }
            }
            ConnectionManagement::ClearToSend { .. } => {
                // Any CTS clears the whole transfer: hold-open requests are not honored.
                // Once every packet is out, the T3 wait for the ACK keeps running.
                if let Connection::PeerSender { .. } = self.connection {
                    self.connection = Connection::PeerSender {
                        clear_to_send: true,
                    };
                    if self.session.bytes_remaining() > 0 {
                        self.timer_ms = 0;
                    }
                }
            }
            ConnectionManagement::EndOfMessageAck { pgn, .. } => {
                if matches!(self.connection, Connection::PeerSender { .. })
                    && pgn == self.transfer.pgn
                    && self.session.bytes_remaining() == 0
                {
                    self.close();
                }
            }
            ConnectionManagement::Abort { pgn, .. } => {
                if self.is_active() && pgn == self.transfer.pgn {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("TP aborted by {}", message.source);
                    self.close();
                }
            }
        }
    }

    /// Busy rule: a second connection request gets ABORT (Busy), the active one is kept.
    fn refuse_when_busy<L: J1939Link>(
        &mut self,
        port: &mut NodePort<L>,
        requester: u8,
        pgn: u32,
    ) -> bool {
        if !self.is_active() {
            return false;
        }
        let abort = ConnectionManagement::Abort {
            reason: AbortReason::Busy,
            pgn,
        };
        log_failure(send_cm(port, &abort, requester));
        true
    }

    fn open_receiver(
        &mut self,
        connection: Connection,
        message: &Message<'_>,
        pgn: u32,
        total_size: u16,
        total_packets: u8,
        destination: u8,
    ) {
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "TP open as receiver: pgn {=u32:#x}, {} bytes from {}",
            pgn,
            total_size,
            message.source
        );

        self.session.start_receive(total_size as usize, total_packets);
        self.transfer = Transfer {
            pgn,
            priority: message.priority,
            peer: message.source,
            destination,
        };
        self.timer_ms = 0;
        self.connection = connection;
    }

    fn on_data_transfer<L: J1939Link>(&mut self, port: &mut NodePort<L>, message: &Message<'_>) {
        if self.role() != Some(Role::Receiver) || message.source != self.transfer.peer {
            return;
        }
        let Some((&sequence, chunk)) = message.data.split_first() else {
            return;
        };
        if chunk.len() != BYTES_PER_PACKET {
            return;
        }

        match self.session.accept(sequence, chunk) {
            AcceptResult::FragmentConsumed | AcceptResult::MessageComplete => self.timer_ms = 0,
            AcceptResult::SequenceMismatch => match self.sequence_mismatch {
                SequenceMismatch::Ignore => {}
                SequenceMismatch::Abort => self.abort(port, AbortReason::Other),
            },
        }
    }

    //==================================================================================HELPERS
    fn send_next_segment<L: J1939Link>(&mut self, port: &mut NodePort<L>) {
        if let Some(frame) = self.session.next_segment() {
            let message = Message::new(
                PGN_TP_DT,
                TP_PRIORITY,
                port.source_address(),
                self.transfer.peer,
                &frame,
            );
            log_failure(port.transmit(&message));
        }
    }

    /// Tell the other end and close. Stalled broadcasts are aborted to everyone.
    fn abort<L: J1939Link>(&mut self, port: &mut NodePort<L>, reason: AbortReason) {
        #[cfg(feature = "defmt")]
        defmt::warn!("TP abort: {} (pgn {=u32:#x})", reason, self.transfer.pgn);

        let abort = ConnectionManagement::Abort {
            reason,
            pgn: self.transfer.pgn,
        };
        let destination = match self.connection {
            Connection::BroadcastSender | Connection::BroadcastReceiver => ADDRESS_GLOBAL,
            _ => self.transfer.peer,
        };
        log_failure(send_cm(port, &abort, destination));
        self.close();
    }

    fn deliver<L: J1939Link>(&self, port: &mut NodePort<L>) {
        let message = Message::new(
            self.transfer.pgn,
            self.transfer.priority,
            self.transfer.peer,
            self.transfer.destination,
            self.session.payload(),
        );
        port.deliver(&message);
    }
}

/// Announced sizes must fit the reassembly buffer and carry at least one byte.
fn valid_announced_size(total_size: u16) -> bool {
    (1..=MAX_TP_PAYLOAD).contains(&(total_size as usize))
}

fn send_cm<L: J1939Link>(
    port: &mut NodePort<L>,
    cm: &ConnectionManagement,
    destination: u8,
) -> Result<(), SendError<L::Error>> {
    let data = cm.encode();
    let message = Message::new(
        PGN_TP_CM,
        TP_PRIORITY,
        port.source_address(),
        destination,
        &data,
    );
    port.transmit(&message)
}

/// Periodic duties never retry a failed transmit within the same tick.
#[inline]
fn log_failure<E: core::fmt::Debug>(result: Result<(), SendError<E>>) {
    if let Err(_e) = result {
        #[cfg(feature = "defmt")]
        defmt::warn!("TP transmit failed: {}", defmt::Debug2Format(&_e));
    }
}
