//! Object header - prefixed before every counted heap object

use crate::logging::trace;
use core::alloc::Layout;
use core::ptr::NonNull;
use std::sync::atomic::AtomicU32;

/// Header stored immediately before the payload
///
/// Records the allocation layout and payload drop glue so the final
/// release can tear the object down without knowing its type.
#[repr(C)]
pub struct ObjectHeader {
    pub refcount: AtomicU32,
    pub flags: u32,
    drop: Option<unsafe fn(*mut u8)>,
    block: Layout,
    offset: usize,
}

impl ObjectHeader {
    const SIZE: usize = core::mem::size_of::<ObjectHeader>();

    /// Get header from object pointer
    ///
    /// # Safety
    /// `obj` must come from [`alloc_object`].
    #[inline]
    pub unsafe fn from_object(obj: *mut u8) -> *mut Self {
        obj.sub(Self::SIZE).cast()
    }

    /// Run the payload's drop glue and free the block
    ///
    /// # Safety
    /// `obj` must come from [`alloc_object`] and have no remaining references.
    #[cold]
    #[inline(never)]
    pub(crate) unsafe fn destroy(obj: *mut u8) {
        let header = Self::from_object(obj);
        let block = (*header).block;
        let offset = (*header).offset;

        trace!(event = "object_destroy", address = ?obj);

        if let Some(drop_fn) = (*header).drop {
            drop_fn(obj);
        }
        std::alloc::dealloc(obj.sub(offset), block);
    }
}

unsafe fn drop_payload<T>(obj: *mut u8) {
    core::ptr::drop_in_place(obj.cast::<T>());
}

/// Allocate a counted object holding `value`, starting with one reference
///
/// The returned address is what handles carry; release it with
/// [`release_raw`](super::release_raw).
pub fn alloc_object<T: Send + Sync + 'static>(value: T) -> NonNull<u8> {
    let align = core::mem::align_of::<T>().max(core::mem::align_of::<ObjectHeader>());
    let offset = ObjectHeader::SIZE.next_multiple_of(align);
    let block = Layout::from_size_align(offset + core::mem::size_of::<T>(), align)
        .unwrap_or_else(|_| std::alloc::handle_alloc_error(Layout::new::<T>()));

    unsafe {
        let base = std::alloc::alloc(block);
        if base.is_null() {
            std::alloc::handle_alloc_error(block);
        }
        let obj = base.add(offset);
        ObjectHeader::from_object(obj).write(ObjectHeader {
            refcount: AtomicU32::new(1),
            flags: 0,
            drop: Some(drop_payload::<T>),
            block,
            offset,
        });
        obj.cast::<T>().write(value);

        trace!(event = "object_new", address = ?obj, size_bytes = block.size());
        NonNull::new_unchecked(obj)
    }
}
