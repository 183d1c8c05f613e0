//! Reference counting on raw object addresses
//!
//! Null-safe; thread-safe atomic operations. These are the hooks
//! [`TypeDescriptor::ref_counted`](crate::types::TypeDescriptor::ref_counted)
//! installs as the type's add-ref and release behaviours.

use super::header::ObjectHeader;
use std::sync::atomic::{fence, Ordering};

/// Increment reference count
///
/// # Safety
/// `obj` must be null or an address returned by [`alloc_object`](super::alloc_object)
/// that is still alive.
pub unsafe fn add_ref_raw(obj: *mut u8) {
    if obj.is_null() {
        return;
    }

    let header = &*ObjectHeader::from_object(obj);
    let old = header.refcount.fetch_add(1, Ordering::Relaxed);

    debug_assert!(old < u32::MAX, "refcount overflow");
}

/// Decrement reference count, destroying the object when it reaches zero
///
/// # Safety
/// `obj` must be null or a live object on which the caller owns a reference.
pub unsafe fn release_raw(obj: *mut u8) {
    if obj.is_null() {
        return;
    }

    let header = &*ObjectHeader::from_object(obj);
    let old = header.refcount.fetch_sub(1, Ordering::Release);

    debug_assert!(old > 0, "refcount underflow");

    if old == 1 {
        // Synchronize with all previous decrements
        fence(Ordering::Acquire);
        ObjectHeader::destroy(obj);
    }
}

/// Current reference count (0 for null)
///
/// # Safety
/// `obj` must be null or a live object.
pub unsafe fn refcount(obj: *const u8) -> u32 {
    if obj.is_null() {
        return 0;
    }

    let header = &*ObjectHeader::from_object(obj as *mut u8);
    header.refcount.load(Ordering::Relaxed)
}

/// Borrow the payload of a counted object
///
/// # Safety
/// `obj` must be a live object allocated with payload type `T`, and the
/// returned reference must not outlive the caller's reference.
#[inline]
pub unsafe fn object_ref<'a, T>(obj: *const u8) -> &'a T {
    &*obj.cast::<T>()
}
