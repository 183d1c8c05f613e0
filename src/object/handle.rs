//! Owned counted reference to a handle-typed object
//!
//! A `HandleRef` owns exactly one reference. Cloning adds one through the
//! type's add-ref behaviour, dropping releases it. `into_raw` hands the
//! reference to someone else without touching the count.

use crate::types::TypeDescriptor;
use core::fmt;
use core::ptr::NonNull;
use std::sync::Arc;

pub struct HandleRef {
    ptr: NonNull<u8>,
    ty: Arc<TypeDescriptor>,
}

impl HandleRef {
    /// Adopt a reference the caller already owns (no increment)
    ///
    /// Returns `None` for null.
    ///
    /// # Safety
    /// `ptr` must be null or a live instance of `ty` carrying a reference
    /// owned by the caller.
    #[inline]
    pub unsafe fn from_raw(ptr: *mut u8, ty: Arc<TypeDescriptor>) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr, ty })
    }

    /// Take a new reference on a borrowed address (increments)
    ///
    /// # Safety
    /// `ptr` must be null or a live instance of `ty`.
    pub unsafe fn from_borrowed(ptr: *mut u8, ty: Arc<TypeDescriptor>) -> Option<Self> {
        let handle = Self::from_raw(ptr, ty)?;
        handle.ty.add_ref(handle.ptr.as_ptr());
        Some(handle)
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn type_descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.ty
    }

    /// Give up ownership of the reference without releasing it
    #[inline]
    pub fn into_raw(self) -> *mut u8 {
        let ptr = self.ptr.as_ptr();
        core::mem::forget(self);
        ptr
    }

    /// Borrow the payload
    ///
    /// # Safety
    /// The object's payload must be a `T`.
    #[inline]
    pub unsafe fn payload<T>(&self) -> &T {
        &*self.ptr.as_ptr().cast::<T>()
    }
}

impl Clone for HandleRef {
    fn clone(&self) -> Self {
        unsafe { self.ty.add_ref(self.ptr.as_ptr()) };
        Self {
            ptr: self.ptr,
            ty: Arc::clone(&self.ty),
        }
    }
}

impl Drop for HandleRef {
    fn drop(&mut self) {
        unsafe { self.ty.release(self.ptr.as_ptr()) };
    }
}

impl PartialEq for HandleRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl fmt::Debug for HandleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRef")
            .field("type", &self.ty.name())
            .field("address", &self.ptr)
            .finish()
    }
}

// The engine's reference counting hooks are required to be thread-safe
unsafe impl Send for HandleRef {}
unsafe impl Sync for HandleRef {}
