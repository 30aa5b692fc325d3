//! Encoding Module
//!
//! Byte-level formats shared by the block writer and readers.
//!
//! ## Responsibilities
//! - Object codec: one `(identifier, payload)` pair per object
//! - Sparse record index and its span lookup
//! - Block metadata carried alongside the index
//!
//! ## Block File Layout
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Span 0 (record 0)                      │
//! │   Object | Object | ... (ascending id) │
//! ├────────────────────────────────────────┤
//! │ Span 1 (record 1)                      │
//! │   Object | Object | ...                │
//! ├────────────────────────────────────────┤
//! │ ...                                    │
//! └────────────────────────────────────────┘
//! ```
//! Span boundaries live only in the index; the file itself is a flat
//! concatenation of objects.

mod meta;
mod object;
mod record;

pub use meta::{BlockMeta, BLOCK_VERSION};
pub use object::{
    decode_next, encode, encode_into, encoded_len, Object, ObjectReader, OBJECT_HEADER_SIZE,
};
pub use record::{decode_records, encode_records, find_candidate_span, validate_records, Record};
