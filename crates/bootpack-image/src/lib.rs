//! bootpack-image: the firmware container codec
//!
//! Container layout (all integers little-endian):
//! ```text
//! offset  size  field
//! 0       4     protocol_version
//! 4       4     product_id
//! 8       4     app_version
//! 12      4     page_count        padded plaintext length / PAGE_SIZE
//! 16      16    iv
//! 32      4     plaintext_crc32   CRC32 of the padded plaintext
//! 36      N     ciphertext        N = page_count * PAGE_SIZE
//! ```
//!
//! - `padding`: zero-padding to whole pages
//! - `header`: `ContainerHeader` encode/decode
//! - `codec`: `create`, `recover` and `inspect` over byte streams
//! - `file`: path-based wrappers with atomic output

pub mod codec;
pub mod file;
pub mod header;
pub mod padding;

pub use codec::{
    create, inspect, open_image, recover, seal_image, ContainerSummary, CreateReport,
    RecoverReport, RecoveredImage,
};
pub use file::{create_file, recover_file};
pub use header::ContainerHeader;
pub use padding::{pad_to_page_boundary, padded_len};
