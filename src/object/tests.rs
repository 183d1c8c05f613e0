//! Tests for counted objects and owned handles

use super::*;
use crate::types::TypeDescriptor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn test_alloc_starts_at_one() {
    let obj = alloc_object(7u64).as_ptr();
    unsafe {
        assert_eq!(refcount(obj), 1);
        assert_eq!(*object_ref::<u64>(obj), 7);
        release_raw(obj);
    }
}

#[test]
fn test_add_ref_release() {
    let obj = alloc_object(String::from("payload")).as_ptr();
    unsafe {
        add_ref_raw(obj);
        add_ref_raw(obj);
        assert_eq!(refcount(obj), 3);
        release_raw(obj);
        assert_eq!(refcount(obj), 2);
        release_raw(obj);
        release_raw(obj);
    }
}

#[test]
fn test_null_is_noop() {
    unsafe {
        add_ref_raw(core::ptr::null_mut());
        release_raw(core::ptr::null_mut());
        assert_eq!(refcount(core::ptr::null()), 0);
    }
}

static DROPS: AtomicUsize = AtomicUsize::new(0);

struct Tracked(#[allow(dead_code)] u32);

impl Drop for Tracked {
    fn drop(&mut self) {
        DROPS.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_final_release_runs_drop() {
    let before = DROPS.load(Ordering::SeqCst);
    let obj = alloc_object(Tracked(1)).as_ptr();
    unsafe {
        add_ref_raw(obj);
        release_raw(obj);
        assert_eq!(DROPS.load(Ordering::SeqCst), before);
        release_raw(obj);
    }
    assert_eq!(DROPS.load(Ordering::SeqCst), before + 1);
}

#[test]
fn test_overaligned_payload() {
    #[repr(align(32))]
    struct Wide([u8; 64]);

    let obj = alloc_object(Wide([3; 64])).as_ptr();
    assert_eq!(obj as usize % 32, 0);
    unsafe {
        assert_eq!(object_ref::<Wide>(obj).0[63], 3);
        release_raw(obj);
    }
}

#[test]
fn test_handle_ref_adopt_and_drop() {
    let ty = Arc::new(TypeDescriptor::ref_counted("Obj"));
    let obj = alloc_object(5i32).as_ptr();
    unsafe {
        add_ref_raw(obj);
        let handle = HandleRef::from_raw(obj, ty).unwrap();
        assert_eq!(refcount(obj), 2);
        assert_eq!(*handle.payload::<i32>(), 5);
        drop(handle);
        assert_eq!(refcount(obj), 1);
        release_raw(obj);
    }
}

#[test]
fn test_handle_ref_clone_and_into_raw() {
    let ty = Arc::new(TypeDescriptor::ref_counted("Obj"));
    let obj = alloc_object(5i32).as_ptr();
    unsafe {
        let borrowed = HandleRef::from_borrowed(obj, ty).unwrap();
        assert_eq!(refcount(obj), 2);

        let cloned = borrowed.clone();
        assert_eq!(refcount(obj), 3);
        assert_eq!(cloned, borrowed);

        let raw = cloned.into_raw();
        assert_eq!(raw, obj);
        assert_eq!(refcount(obj), 3);

        drop(borrowed);
        release_raw(raw);
        assert_eq!(refcount(obj), 1);
        release_raw(obj);
    }
}

#[test]
fn test_handle_ref_null() {
    let ty = Arc::new(TypeDescriptor::ref_counted("Obj"));
    unsafe {
        assert!(HandleRef::from_raw(core::ptr::null_mut(), ty.clone()).is_none());
        assert!(HandleRef::from_borrowed(core::ptr::null_mut(), ty).is_none());
    }
}

#[test]
fn test_concurrent_refcounting() {
    let ty = Arc::new(TypeDescriptor::ref_counted("Obj"));
    let obj = alloc_object(0u32).as_ptr() as usize;

    let threads: Vec<_> = (0..4)
        .map(|_| {
            let ty = ty.clone();
            thread::spawn(move || {
                for _ in 0..1000 {
                    let h = unsafe { HandleRef::from_borrowed(obj as *mut u8, ty.clone()) };
                    drop(h);
                }
            })
        })
        .collect();

    for t in threads {
        t.join().unwrap();
    }

    unsafe {
        assert_eq!(refcount(obj as *const u8), 1);
        release_raw(obj as *mut u8);
    }
}
