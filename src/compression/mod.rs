//! Streaming and bulk compression/decompression.
//!
//! Both the bulk (`compress`/`decompress`) and the streaming
//! (`init`/`chunk`/`flush`) APIs are kept: the bulk path is useful to direct
//! callers that already have the whole buffer, and the streaming path is
//! what `CompressionStream`/`DecompressionStream` need.

mod bulk;
mod format;
mod stream;

pub use bulk::{compress, decompress, MAX_DECOMPRESSED_BYTES};
pub use format::Format;
pub use stream::{CompressStreamState, Mode, StreamRegistry};
