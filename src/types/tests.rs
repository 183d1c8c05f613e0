//! Tests for type descriptors and primitive values

use super::*;
use std::sync::Arc;

#[test]
fn test_primitive_sizes() {
    assert_eq!(PrimitiveKind::Bool.size(), 1);
    assert_eq!(PrimitiveKind::I8.size(), 1);
    assert_eq!(PrimitiveKind::U16.size(), 2);
    assert_eq!(PrimitiveKind::I32.size(), 4);
    assert_eq!(PrimitiveKind::F32.size(), 4);
    assert_eq!(PrimitiveKind::U64.size(), 8);
    assert_eq!(PrimitiveKind::F64.size(), 8);
}

#[test]
fn test_primitive_kind_checks() {
    assert!(PrimitiveKind::I32.is_integral());
    assert!(PrimitiveKind::U8.is_integral());
    assert!(!PrimitiveKind::Bool.is_integral());
    assert!(PrimitiveKind::F64.is_float());
    assert!(!PrimitiveKind::I64.is_float());
}

#[test]
fn test_script_names() {
    assert_eq!(PrimitiveKind::I32.to_string(), "int");
    assert_eq!(PrimitiveKind::U32.to_string(), "uint");
    assert_eq!(PrimitiveKind::F32.to_string(), "float");
    assert_eq!(PrimitiveKind::F64.to_string(), "double");
}

#[test]
fn test_value_kind_and_extract() {
    let v = PrimitiveValue::from(42i32);
    assert_eq!(v.kind(), PrimitiveKind::I32);
    assert_eq!(i32::from_value(v), Some(42));
    assert_eq!(i64::from_value(v), None);
    assert_eq!(2.5f32.into_value(), PrimitiveValue::F32(2.5));
}

#[test]
fn test_convert_truncates_and_extends() {
    assert_eq!(PrimitiveValue::I32(0x1234).convert(PrimitiveKind::U8), PrimitiveValue::U8(0x34));
    assert_eq!(PrimitiveValue::I8(-1).convert(PrimitiveKind::I64), PrimitiveValue::I64(-1));
    assert_eq!(PrimitiveValue::I8(-1).convert(PrimitiveKind::U16), PrimitiveValue::U16(0xFFFF));
    assert_eq!(PrimitiveValue::F64(2.75).convert(PrimitiveKind::I32), PrimitiveValue::I32(2));
    assert_eq!(PrimitiveValue::I32(3).convert(PrimitiveKind::F32), PrimitiveValue::F32(3.0));
}

#[test]
fn test_convert_bool() {
    assert_eq!(PrimitiveValue::Bool(true).convert(PrimitiveKind::I32), PrimitiveValue::I32(1));
    assert_eq!(PrimitiveValue::I16(0).convert(PrimitiveKind::Bool), PrimitiveValue::Bool(false));
    assert_eq!(PrimitiveValue::U64(1 << 40).convert(PrimitiveKind::Bool), PrimitiveValue::Bool(true));
}

#[test]
fn test_zero_has_declared_kind() {
    for kind in [PrimitiveKind::Bool, PrimitiveKind::U16, PrimitiveKind::F64] {
        assert_eq!(PrimitiveValue::zero(kind).kind(), kind);
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Vec3 {
    x: f32,
    y: f32,
    z: f32,
}

#[test]
fn test_value_descriptor_layout() {
    let ty = TypeDescriptor::value::<Vec3>("vec3");
    assert_eq!(ty.category(), TypeCategory::Value);
    assert_eq!(ty.size(), 12);
    assert_eq!(ty.align(), 4);
    assert!(ty.behaviours().construct.is_some());
    assert!(ty.behaviours().copy_construct.is_some());
    assert!(!ty.is_ref_counted());
}

#[test]
fn test_value_descriptor_hooks() {
    let ty = TypeDescriptor::value::<Vec3>("vec3");
    let src = Vec3 { x: 1.0, y: 2.0, z: 3.0 };
    let mut dst = core::mem::MaybeUninit::<Vec3>::uninit();
    unsafe {
        ty.copy_construct(dst.as_mut_ptr().cast(), (&src as *const Vec3).cast())
            .unwrap();
        assert_eq!(dst.assume_init_ref(), &src);
        ty.destruct(dst.as_mut_ptr().cast());
    }
}

#[test]
fn test_missing_behaviour() {
    let ty = TypeDescriptor::value_with("blob", 16, 8, TypeBehaviours::default()).unwrap();
    let mut storage = [0u64; 2];
    let err = unsafe { ty.construct(storage.as_mut_ptr().cast()) }.unwrap_err();
    assert!(matches!(err, crate::MarshalError::MissingBehaviour { behaviour: "default constructor", .. }));
}

#[test]
fn test_slot_kinds() {
    let obj = Arc::new(TypeDescriptor::ref_counted("Obj"));
    let val = Arc::new(TypeDescriptor::value::<Vec3>("vec3"));

    assert_eq!(
        ParamDescriptor::primitive(PrimitiveKind::I32).slot_kind(),
        SlotKind::Primitive(PrimitiveKind::I32)
    );
    assert_eq!(ParamDescriptor::handle(obj.clone()).slot_kind(), SlotKind::Handle);
    assert_eq!(ParamDescriptor::value(val.clone()).slot_kind(), SlotKind::Object);
    assert_eq!(
        ParamDescriptor::reference(val, ParamModifier::OutRef).slot_kind(),
        SlotKind::Reference
    );
    assert!(ParamDescriptor::handle(obj).auto_handle().is_auto_handle());
}

#[test]
fn test_signature_display() {
    let obj = Arc::new(TypeDescriptor::ref_counted("MyIntf"));
    let sig = Signature::function("func")
        .param(ParamDescriptor::primitive(PrimitiveKind::I32))
        .param(ParamDescriptor::primitive(PrimitiveKind::F32))
        .param(ParamDescriptor::handle(obj.clone()).auto_handle())
        .returns(ReturnType::handle(obj));

    assert_eq!(sig.to_string(), "MyIntf@ func(int, float, MyIntf@+)");
    assert_eq!(sig.arity(), 3);
    assert!(!sig.is_method());
}

#[test]
fn test_method_qualified_name() {
    let obj = Arc::new(TypeDescriptor::ref_counted("Player"));
    let sig = Signature::method(obj, "damage")
        .param(ParamDescriptor::primitive(PrimitiveKind::I32));
    assert!(sig.is_method());
    assert_eq!(sig.qualified_name(), "Player::damage");
    assert_eq!(sig.to_string(), "void Player::damage(int)");
}

#[test]
fn test_value_with_rejects_bad_layout() {
    let err = TypeDescriptor::value_with("Big", 64, 3, TypeBehaviours::default()).unwrap_err();
    assert_eq!(
        err,
        crate::MarshalError::InvalidLayout {
            type_name: "Big".to_string(),
            size: 64,
            align: 3,
        }
    );
    assert!(TypeDescriptor::value_with("Huge", usize::MAX, 8, TypeBehaviours::default()).is_err());
}

#[test]
fn test_value_with_layout_matches_declaration() {
    let ty = TypeDescriptor::value_with("Big", 64, 16, TypeBehaviours::default()).unwrap();
    assert_eq!(ty.layout().size(), 64);
    assert_eq!(ty.layout().align(), 16);
    assert_eq!(TypeDescriptor::primitive(PrimitiveKind::F64).layout().size(), 8);
}
