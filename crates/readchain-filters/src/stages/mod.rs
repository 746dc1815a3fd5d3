//! Built-in stages.
//!
//! | Stage      | Module          | Purpose                               |
//! |------------|-----------------|---------------------------------------|
//! | `gzip`     | [`compression`] | Decode gzip                           |
//! | `zlib`     | [`compression`] | Decode zlib                           |
//! | `deflate`  | [`compression`] | Decode raw deflate                    |
//! | `brotli`   | [`compression`] | Decode brotli                         |
//! | `base64`   | [`encoding`]    | Decode base64, ignoring whitespace    |
//! | `checksum` | [`checksum`]    | CRC-32 with optional verification     |
//! | `limit`    | [`limit`]       | Truncate to a byte count              |
//! | `meter`    | [`meter`]       | Count bytes into a metrics counter    |

pub mod checksum;
pub mod compression;
pub mod encoding;
pub mod limit;
pub mod meter;

// Re-export main types
pub use self::checksum::{Checksum, ChecksumMismatch};
pub use self::compression::{Brotli, Decode, Decoder, Deflate, Gzip, Zlib};
pub use self::encoding::{Base64, Base64Decoder};
pub use self::limit::Limit;
pub use self::meter::Meter;
