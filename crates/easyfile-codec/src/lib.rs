//! Typed codec for easyfile: JSON and YAML through one value model.
//!
//! Everything goes through [`Value`], a format-agnostic tree whose mappings
//! keep insertion order. [`encode`] lowers any `T: Serialize` into that tree,
//! rejects what the target format cannot hold faithfully (NaN in JSON,
//! integers wider than 64 bits), then renders it. [`decode`] parses into a
//! `Value`; [`decode_as`] parses straight into a declared shape.
//!
//! ```
//! use easyfile_codec::{decode, encode, Format, Mapping, Value};
//!
//! let mut doc = Mapping::new();
//! doc.insert("name", "Easy File");
//! let json = encode(&doc, Format::Json, 0).unwrap();
//! assert_eq!(json, br#"{"name":"Easy File"}"#);
//! assert_eq!(decode(&json, Format::Json).unwrap()["name"], Value::from("Easy File"));
//! ```

pub mod codec;
pub mod error;
pub mod format;
pub mod ser;
pub mod value;

pub use codec::{decode, decode_as, encode};
pub use error::{CodecError, CodecResult};
pub use format::Format;
pub use ser::{to_value, ValueSerializer};
pub use value::{Mapping, Value};
