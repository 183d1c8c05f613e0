//! Reference-counted heap objects - the default handle backend
//!
//! Design: the counter lives in a header placed directly in front of the
//! payload, so a handle is just the payload address and reference counting
//! needs no lookup.
//!
//! - `header.rs` - object header and allocation layout
//! - `refcount.rs` - null-safe add-ref / release on raw addresses
//! - `handle.rs` - owned counted reference driven by type behaviours

mod handle;
mod header;
mod refcount;

pub use handle::HandleRef;
pub use header::{alloc_object, ObjectHeader};
pub use refcount::{add_ref_raw, object_ref, refcount, release_raw};

#[cfg(test)]
mod tests;
