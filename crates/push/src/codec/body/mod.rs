//! Body decoders: one per framing the server may choose.

mod chunked_decoder;
mod length_decoder;

pub use chunked_decoder::ChunkedDecoder;
pub use length_decoder::LengthDecoder;
