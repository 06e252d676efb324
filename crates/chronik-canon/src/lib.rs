//! Canonical encoding and hashing for Chronik.
//!
//! Every hash and checksum in Chronik is computed over the canonical
//! encoding produced here, so two conforming implementations of the ledger
//! agree byte-for-byte on what they hash. The rules:
//!
//! - Object keys sorted lexicographically (by code point) at every depth
//! - Arrays preserve element order; elements are never sorted
//! - Null-valued object members are omitted; nulls inside arrays are kept
//! - Dates serialize as ISO-8601 strings before they reach the encoder
//!   (chrono's serde form), so they canonicalize as ordinary strings
//! - Integers render as plain decimal digits
//! - No insignificant whitespace
//!
//! [`canonical_equals`] is defined as equality of canonical strings.

pub mod stringify;

pub use stringify::{
    canonical_bytes, canonical_equals, canonical_string, hash_of, hash_value, to_canonical_value,
};
