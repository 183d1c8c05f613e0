//! Heap storage for inline object instances
//!
//! `RawStorage` is memory only. `OwnedObject` adds a constructed instance
//! destroyed on drop. `OutRef` is caller-owned, default-constructed storage
//! for `&out` parameters.

use crate::error::MarshalError;
use crate::frame::ArgValue;
use crate::object::HandleRef;
use crate::types::{Primitive, PrimitiveKind, TypeCategory, TypeDescriptor};
use core::alloc::Layout;
use core::fmt;
use core::ptr::NonNull;
use std::sync::Arc;

/// Uninitialised, correctly sized and aligned memory; frees on drop
pub(crate) struct RawStorage {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl RawStorage {
    pub(crate) fn uninit(layout: Layout) -> Self {
        Self::allocate(layout, false)
    }

    pub(crate) fn zeroed(layout: Layout) -> Self {
        Self::allocate(layout, true)
    }

    fn allocate(layout: Layout, zeroed: bool) -> Self {
        if layout.size() == 0 {
            // Zero-sized: any aligned non-null address will do
            let ptr = unsafe { NonNull::new_unchecked(layout.align() as *mut u8) };
            return Self { ptr, layout };
        }

        let raw = unsafe {
            if zeroed {
                std::alloc::alloc_zeroed(layout)
            } else {
                std::alloc::alloc(layout)
            }
        };
        match NonNull::new(raw) {
            Some(ptr) => Self { ptr, layout },
            None => std::alloc::handle_alloc_error(layout),
        }
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }
}

impl Drop for RawStorage {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            unsafe { std::alloc::dealloc(self.ptr.as_ptr(), self.layout) };
        }
    }
}

/// A constructed value-type instance owned by the holder
///
/// Returned to the caller for object-by-value returns; destroyed and freed
/// on drop.
pub struct OwnedObject {
    storage: RawStorage,
    ty: Arc<TypeDescriptor>,
}

impl OwnedObject {
    /// # Safety
    /// `storage` must hold a constructed instance of `ty`.
    pub(crate) unsafe fn from_constructed(storage: RawStorage, ty: Arc<TypeDescriptor>) -> Self {
        Self { storage, ty }
    }

    /// Copy-construct a frame-owned instance from `src`
    ///
    /// # Safety
    /// `src` must be a live instance of `ty`.
    pub(crate) unsafe fn copy_from(ty: &Arc<TypeDescriptor>, src: *const u8) -> Result<Self, MarshalError> {
        let storage = RawStorage::uninit(ty.layout());
        ty.copy_construct(storage.as_ptr(), src)?;
        Ok(Self::from_constructed(storage, Arc::clone(ty)))
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.storage.as_ptr()
    }

    #[inline]
    pub fn type_descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.ty
    }

    /// Borrow the instance as `T`
    ///
    /// # Safety
    /// The type's layout must be that of `T`.
    #[inline]
    pub unsafe fn get<T>(&self) -> &T {
        &*self.storage.as_ptr().cast::<T>()
    }
}

impl Drop for OwnedObject {
    fn drop(&mut self) {
        unsafe { self.ty.destruct(self.storage.as_ptr()) };
    }
}

impl fmt::Debug for OwnedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedObject")
            .field("type", &self.ty.name())
            .field("address", &self.storage.as_ptr())
            .finish()
    }
}

enum OutTarget {
    Primitive(PrimitiveKind),
    Object(Arc<TypeDescriptor>),
    Handle(Arc<TypeDescriptor>),
}

/// Caller-owned target of an `&out` parameter
///
/// Holds a valid default instance before the call: zero for primitives,
/// the default constructor's result for value types, a null handle for
/// reference types. The callee may leave it untouched or overwrite it.
pub struct OutRef {
    storage: RawStorage,
    target: OutTarget,
}

impl OutRef {
    pub fn new(ty: &Arc<TypeDescriptor>) -> Result<Self, MarshalError> {
        match ty.category() {
            TypeCategory::Primitive(kind) => Ok(Self {
                storage: RawStorage::zeroed(ty.layout()),
                target: OutTarget::Primitive(kind),
            }),
            TypeCategory::Value => {
                let storage = RawStorage::uninit(ty.layout());
                unsafe { ty.construct(storage.as_ptr())? };
                Ok(Self {
                    storage,
                    target: OutTarget::Object(Arc::clone(ty)),
                })
            }
            TypeCategory::Reference => Ok(Self {
                storage: RawStorage::zeroed(Layout::new::<*mut u8>()),
                target: OutTarget::Handle(Arc::clone(ty)),
            }),
        }
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.storage.as_ptr()
    }

    /// Argument value pointing at this storage
    #[inline]
    pub fn arg(&self) -> ArgValue {
        ArgValue::Reference(self.as_ptr())
    }

    /// Read a primitive output; `None` if `T` is not the declared kind
    pub fn read<T: Primitive>(&self) -> Option<T> {
        match self.target {
            OutTarget::Primitive(kind) if kind == T::KIND => {
                Some(unsafe { self.storage.as_ptr().cast::<T>().read() })
            }
            _ => None,
        }
    }

    /// Borrow a value-type output as `T`
    ///
    /// # Safety
    /// The type's layout must be that of `T`.
    pub unsafe fn get<T>(&self) -> &T {
        &*self.storage.as_ptr().cast::<T>()
    }

    /// Take ownership of a handle written by the callee
    pub fn take_handle(&mut self) -> Option<HandleRef> {
        match &self.target {
            OutTarget::Handle(ty) => unsafe {
                let slot = self.storage.as_ptr().cast::<*mut u8>();
                let ptr = slot.replace(core::ptr::null_mut());
                HandleRef::from_raw(ptr, Arc::clone(ty))
            },
            _ => None,
        }
    }
}

impl Drop for OutRef {
    fn drop(&mut self) {
        match &self.target {
            OutTarget::Primitive(_) => {}
            OutTarget::Object(ty) => unsafe { ty.destruct(self.storage.as_ptr()) },
            OutTarget::Handle(ty) => unsafe {
                ty.release(self.storage.as_ptr().cast::<*mut u8>().read());
            },
        }
    }
}
