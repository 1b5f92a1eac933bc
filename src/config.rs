//! Session-wide limits. A conforming producer and decoder must agree on
//! these out of band (the wire carries no negotiation); mismatched limits
//! between the two sides of a stream are a deployment error, not something
//! this crate can detect from the bytes alone.

/// Tunable ceilings for one decode session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Highest valid layer id, plus one. The wire format's layer id byte
    /// always ranges 0..=15 regardless of this value; this bounds how many
    /// of those ids a session is willing to actually populate.
    pub max_layers: u8,
    /// Upper bound on `DrawPolygon` point counts before the decoder fails
    /// with [`crate::errors::ProtocolError::ResourceExhausted`].
    pub max_polygon_points: u32,
    /// Upper bound on `DrawText` UTF-8 byte length, same failure mode.
    pub max_text_bytes: u32,
    /// Upper bound on in-flight bytes the transport layer should buffer
    /// before delivering to the decoder. Enforced by the session owner,
    /// not by `StreamDecoder` itself — see the module docs on
    /// [`crate::decoder`].
    pub receive_buffer_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_layers: 16,
            max_polygon_points: 65_536,
            max_text_bytes: 65_536,
            receive_buffer_bytes: 8 * 1024 * 1024,
        }
    }
}
