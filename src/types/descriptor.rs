//! Type descriptors - per-type metadata consulted by the marshalling layer
//!
//! A descriptor is owned by the engine's type system and shared with the
//! frame through `Arc`. The frame only reads it: layout for preallocated
//! storage, and behaviour hooks for constructing, copying, destroying and
//! reference counting instances.

use super::primitive::PrimitiveKind;
use crate::error::MarshalError;
use crate::object;
use core::alloc::Layout;
use core::fmt;

/// Category of a registered type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    /// Built-in primitive stored directly in the slot
    Primitive(PrimitiveKind),
    /// Value type: lives inline, passed by value or by reference
    Value,
    /// Reference type: heap resident, passed as a handle or by reference
    Reference,
}

/// Behaviour hooks of an object type
///
/// All hooks receive addresses of properly aligned storage of the type's
/// size. Reference types without `add_ref`/`release` are treated as
/// uncounted: handle transfers become plain address copies.
#[derive(Clone, Copy, Default)]
pub struct TypeBehaviours {
    pub construct: Option<unsafe fn(*mut u8)>,
    pub copy_construct: Option<unsafe fn(*mut u8, *const u8)>,
    pub destruct: Option<unsafe fn(*mut u8)>,
    pub add_ref: Option<unsafe fn(*mut u8)>,
    pub release: Option<unsafe fn(*mut u8)>,
}

impl fmt::Debug for TypeBehaviours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeBehaviours")
            .field("construct", &self.construct.is_some())
            .field("copy_construct", &self.copy_construct.is_some())
            .field("destruct", &self.destruct.is_some())
            .field("add_ref", &self.add_ref.is_some())
            .field("release", &self.release.is_some())
            .finish()
    }
}

unsafe fn construct_default<T: Default>(dst: *mut u8) {
    dst.cast::<T>().write(T::default());
}

unsafe fn copy_clone<T: Clone>(dst: *mut u8, src: *const u8) {
    dst.cast::<T>().write((*src.cast::<T>()).clone());
}

unsafe fn destruct_in_place<T>(ptr: *mut u8) {
    core::ptr::drop_in_place(ptr.cast::<T>());
}

/// Registered type metadata
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    category: TypeCategory,
    layout: Layout,
    behaviours: TypeBehaviours,
}

impl TypeDescriptor {
    /// Descriptor for a built-in primitive
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self {
            name: kind.script_name().to_string(),
            category: TypeCategory::Primitive(kind),
            layout: kind.layout(),
            behaviours: TypeBehaviours::default(),
        }
    }

    /// Value type backed by a Rust type's `Default`, `Clone` and `Drop`
    pub fn value<T: Default + Clone + 'static>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: TypeCategory::Value,
            layout: Layout::new::<T>(),
            behaviours: TypeBehaviours {
                construct: Some(construct_default::<T>),
                copy_construct: Some(copy_clone::<T>),
                destruct: Some(destruct_in_place::<T>),
                add_ref: None,
                release: None,
            },
        }
    }

    /// Value type with explicit layout and hooks
    ///
    /// `align` must be a power of two and `size`, rounded up to `align`,
    /// must not overflow `isize`.
    pub fn value_with(
        name: impl Into<String>,
        size: usize,
        align: usize,
        behaviours: TypeBehaviours,
    ) -> Result<Self, MarshalError> {
        let name = name.into();
        let layout = Layout::from_size_align(size, align).map_err(|_| MarshalError::InvalidLayout {
            type_name: name.clone(),
            size,
            align,
        })?;
        Ok(Self {
            name,
            category: TypeCategory::Value,
            layout,
            behaviours,
        })
    }

    /// Reference type with explicit reference counting hooks
    pub fn reference(name: impl Into<String>, behaviours: TypeBehaviours) -> Self {
        Self {
            name: name.into(),
            category: TypeCategory::Reference,
            layout: Layout::new::<*mut u8>(),
            behaviours,
        }
    }

    /// Reference type whose instances are allocated through [`object::alloc_object`]
    pub fn ref_counted(name: impl Into<String>) -> Self {
        Self::reference(
            name,
            TypeBehaviours {
                add_ref: Some(object::add_ref_raw),
                release: Some(object::release_raw),
                ..TypeBehaviours::default()
            },
        )
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn category(&self) -> TypeCategory {
        self.category
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    #[inline]
    pub fn align(&self) -> usize {
        self.layout.align()
    }

    #[inline]
    pub fn behaviours(&self) -> &TypeBehaviours {
        &self.behaviours
    }

    /// Layout of one inline instance
    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    #[inline]
    pub fn is_ref_counted(&self) -> bool {
        self.behaviours.add_ref.is_some() && self.behaviours.release.is_some()
    }

    /// Add one reference to `ptr` (no-op for null or uncounted types)
    ///
    /// # Safety
    /// `ptr` must be null or a live instance of this type.
    #[inline]
    pub unsafe fn add_ref(&self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        if let Some(add_ref) = self.behaviours.add_ref {
            add_ref(ptr);
        }
    }

    /// Release one reference to `ptr` (no-op for null or uncounted types)
    ///
    /// # Safety
    /// `ptr` must be null or a live instance of this type on which the
    /// caller owns a reference.
    #[inline]
    pub unsafe fn release(&self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        if let Some(release) = self.behaviours.release {
            release(ptr);
        }
    }

    /// Default-construct an instance at `dst`
    ///
    /// # Safety
    /// `dst` must be valid, aligned, uninitialised storage for this type.
    pub unsafe fn construct(&self, dst: *mut u8) -> Result<(), MarshalError> {
        match self.behaviours.construct {
            Some(construct) => {
                construct(dst);
                Ok(())
            }
            None => Err(self.missing("default constructor")),
        }
    }

    /// Copy-construct an instance at `dst` from `src`
    ///
    /// # Safety
    /// `dst` must be valid uninitialised storage, `src` a live instance.
    pub unsafe fn copy_construct(&self, dst: *mut u8, src: *const u8) -> Result<(), MarshalError> {
        match self.behaviours.copy_construct {
            Some(copy) => {
                copy(dst, src);
                Ok(())
            }
            None => Err(self.missing("copy constructor")),
        }
    }

    /// Run the destructor hook, if any
    ///
    /// # Safety
    /// `ptr` must be a live instance; it is uninitialised afterwards.
    #[inline]
    pub unsafe fn destruct(&self, ptr: *mut u8) {
        if let Some(destruct) = self.behaviours.destruct {
            destruct(ptr);
        }
    }

    pub(crate) fn missing(&self, behaviour: &'static str) -> MarshalError {
        MarshalError::MissingBehaviour {
            type_name: self.name.clone(),
            behaviour,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
