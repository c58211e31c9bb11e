#![doc(html_root_url = "https://docs.rs/torqlink/latest")]
//! Asynchronous client for Open Protocol, the ASCII-framed
//! request/response protocol spoken by industrial tightening controllers
//! (torque/angle tools) over TCP.
//!
//! The crate is organised as a pipeline of four stages. Outbound, a
//! structured [`Message`] passes through the MID serializer
//! ([`mid::registry`]), the header serializer
//! ([`header::encode_frame`]), and the link layer ([`link::LinkActor`]),
//! which sequences, splits, and retransmits frames. Inbound, the header
//! parser slices frames out of the byte stream, the link layer
//! reassembles, deduplicates, and acknowledges them, and the MID parser
//! decodes known payloads before delivery.
//!
//! The transport is caller-owned: anything `AsyncRead + AsyncWrite`
//! works, typically a `TcpStream` connected to the controller.

pub mod header;
pub mod link;
pub mod message;
pub mod mid;

pub use link::{LinkActor, LinkChannels, LinkError, LinkHandle, LinkOptions};
pub use message::{Message, Payload};
