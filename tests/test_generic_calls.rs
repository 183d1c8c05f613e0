use gencall::{
    ArgValue, CallOutcome, CoercionPolicy, FunctionCall, FunctionRegistry, GenericCall, MarshalConfig,
    MarshalError, OutRef, ParamDescriptor, ParamModifier, PrimitiveKind, ReturnType, Signature,
    TypeDescriptor,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default, Clone, PartialEq)]
struct Vec3 {
    x: f32,
    y: f32,
    z: f32,
}

static TRACKED_DROPS: AtomicUsize = AtomicUsize::new(0);

/// Value type that counts destructions
#[derive(Debug, Default, Clone)]
struct Tracked(#[allow(dead_code)] u64);

impl Drop for Tracked {
    fn drop(&mut self) {
        TRACKED_DROPS.fetch_add(1, Ordering::SeqCst);
    }
}

fn add(gen: &mut GenericCall<'_>) {
    let a = gen.arg_i32(0).unwrap();
    let b = gen.arg_f32(1).unwrap();
    assert_eq!(a, 3);
    assert_eq!(b, 2.5);
    gen.set_return_i32(5).unwrap();
}

#[test]
fn test_int_float_to_int() {
    let sig = Signature::function("add")
        .param(ParamDescriptor::primitive(PrimitiveKind::I32))
        .param(ParamDescriptor::primitive(PrimitiveKind::F32))
        .returns(ReturnType::Primitive(PrimitiveKind::I32));
    assert_eq!(sig.to_string(), "int add(int, float)");

    let call = FunctionCall::new(sig, add);
    let value = call.call(&[3i32.into(), 2.5f32.into()]).unwrap().into_result().unwrap();
    assert_eq!(value.primitive::<i32>(), Some(5));
}

fn throws_before_return(gen: &mut GenericCall<'_>) {
    gen.set_exception("no vector for you").unwrap();
}

#[test]
fn test_exception_skips_value_return() {
    let ty = Arc::new(TypeDescriptor::value::<Tracked>("tracked"));
    let call = FunctionCall::new(
        Signature::function("make").returns(ReturnType::Value(ty)),
        throws_before_return,
    );

    let before = TRACKED_DROPS.load(Ordering::SeqCst);
    let outcome = call.call(&[]).unwrap();
    match outcome {
        CallOutcome::Exception(e) => {
            assert_eq!(e.message, "no vector for you");
            assert_eq!(e.to_string(), "exception in 'make': no vector for you");
        }
        CallOutcome::Returned(value) => panic!("unexpected return {:?}", value),
    }
    // the unconstructed return slot is never destroyed
    assert_eq!(TRACKED_DROPS.load(Ordering::SeqCst), before);
}

fn forgets_return(_gen: &mut GenericCall<'_>) {}

#[test]
fn test_value_return_must_be_constructed() {
    let ty = Arc::new(TypeDescriptor::value::<Vec3>("vec3"));
    let call = FunctionCall::new(Signature::function("make").returns(ReturnType::Value(ty)), forgets_return);
    assert!(matches!(call.call(&[]), Err(MarshalError::ReturnNotConstructed { .. })));
}

fn cross(gen: &mut GenericCall<'_>) {
    let (a, b) = unsafe {
        (
            (*gen.arg_object(0).unwrap().cast::<Vec3>()).clone(),
            (*gen.arg_object(1).unwrap().cast::<Vec3>()).clone(),
        )
    };
    let result = Vec3 {
        x: a.y * b.z - a.z * b.y,
        y: a.z * b.x - a.x * b.z,
        z: a.x * b.y - a.y * b.x,
    };
    unsafe {
        gen.address_of_return_location().cast::<Vec3>().write(result);
        gen.mark_return_constructed().unwrap();
    }
}

#[test]
fn test_value_arguments_and_return() {
    let ty = Arc::new(TypeDescriptor::value::<Vec3>("vec3"));
    let sig = Signature::function("cross")
        .param(ParamDescriptor::value(Arc::clone(&ty)))
        .param(ParamDescriptor::value(Arc::clone(&ty)))
        .returns(ReturnType::Value(Arc::clone(&ty)));
    let call = FunctionCall::new(sig, cross);

    let x = Vec3 { x: 1.0, y: 0.0, z: 0.0 };
    let y = Vec3 { x: 0.0, y: 1.0, z: 0.0 };
    let value = call
        .call(&[
            ArgValue::Object((&x as *const Vec3).cast()),
            ArgValue::Object((&y as *const Vec3).cast()),
        ])
        .unwrap()
        .into_result()
        .unwrap();

    let z = unsafe { value.as_object().unwrap().get::<Vec3>() };
    assert_eq!(z, &Vec3 { x: 0.0, y: 0.0, z: 1.0 });
}

fn inspects_out(gen: &mut GenericCall<'_>) {
    let before = unsafe { (*gen.arg_address(0).unwrap().cast::<Vec3>()).clone() };
    assert_eq!(before, Vec3::default());
    unsafe { *gen.arg_address(0).unwrap().cast::<Vec3>() = Vec3 { x: 9.0, y: 8.0, z: 7.0 } };
}

#[test]
fn test_out_reference_starts_default() {
    let ty = Arc::new(TypeDescriptor::value::<Vec3>("vec3"));
    let sig = Signature::function("fill").param(ParamDescriptor::reference(Arc::clone(&ty), ParamModifier::OutRef));
    assert_eq!(sig.to_string(), "void fill(vec3 &out)");

    let out = OutRef::new(&ty).unwrap();
    let call = FunctionCall::new(sig, inspects_out);
    call.call(&[out.arg()]).unwrap().into_result().unwrap();
    assert_eq!(unsafe { out.get::<Vec3>() }, &Vec3 { x: 9.0, y: 8.0, z: 7.0 });
}

fn untouched_out(_gen: &mut GenericCall<'_>) {}

#[test]
fn test_out_reference_left_untouched() {
    let ty = Arc::new(TypeDescriptor::primitive(PrimitiveKind::I64));
    let out = OutRef::new(&ty).unwrap();
    let call = FunctionCall::new(
        Signature::function("maybe").param(ParamDescriptor::reference(Arc::clone(&ty), ParamModifier::OutRef)),
        untouched_out,
    );
    call.call(&[out.arg()]).unwrap();
    assert_eq!(out.read::<i64>(), Some(0));
}

fn outer(gen: &mut GenericCall<'_>) {
    let n = gen.arg_i32(0).unwrap();
    let inner = gen.auxiliary::<FunctionCall>().unwrap();
    let doubled = inner
        .call(&[n.into()])
        .unwrap()
        .into_result()
        .unwrap()
        .primitive::<i32>()
        .unwrap();
    gen.set_return_i32(doubled + 1).unwrap();
}

fn double(gen: &mut GenericCall<'_>) {
    let n = gen.arg_i32(0).unwrap();
    gen.set_return_i32(n * 2).unwrap();
}

#[test]
fn test_reentrant_call() {
    let unary = |name: &str| {
        Signature::function(name)
            .param(ParamDescriptor::primitive(PrimitiveKind::I32))
            .returns(ReturnType::Primitive(PrimitiveKind::I32))
    };
    let inner = FunctionCall::new(unary("double"), double);
    let call = FunctionCall::new(unary("outer"), outer).with_auxiliary(inner);

    let value = call.call(&[20i32.into()]).unwrap().into_result().unwrap();
    assert_eq!(value.primitive::<i32>(), Some(41));
}

fn widen(gen: &mut GenericCall<'_>) {
    match gen.arg_i64(0) {
        Ok(v) => gen.set_return_i64(v).unwrap(),
        Err(e) => gen.set_exception(e.to_string()).unwrap(),
    }
}

#[test]
fn test_policy_knob() {
    let sig = || {
        Signature::function("widen")
            .param(ParamDescriptor::primitive(PrimitiveKind::I32))
            .returns(ReturnType::Primitive(PrimitiveKind::I64))
    };

    let strict = FunctionCall::new(sig(), widen);
    let outcome = strict.call(&[(-7i32).into()]).unwrap();
    assert!(outcome.exception().unwrap().message.contains("type mismatch"));

    let converting = FunctionCall::new(sig(), widen).with_policy(CoercionPolicy::Convert);
    let value = converting.call(&[(-7i32).into()]).unwrap().into_result().unwrap();
    assert_eq!(value.primitive::<i64>(), Some(-7));
}

#[test]
fn test_registry_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gencall.toml");
    std::fs::write(&path, "[marshal]\ncoercion = \"convert\"\n").unwrap();

    let registry = FunctionRegistry::new(MarshalConfig::from_file(&path).unwrap());
    let sig = Signature::function("widen")
        .param(ParamDescriptor::primitive(PrimitiveKind::I32))
        .returns(ReturnType::Primitive(PrimitiveKind::I64));
    registry.register_function(sig, widen).unwrap();

    let value = registry
        .call_by_name("widen", None, &[3u8.into()])
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(value.primitive::<i64>(), Some(3));
}
