//! Integration tests for generic method instantiation.
//!
//! These tests drive [`GenericMethodCache`] through its public API only, with the
//! reference collaborators or small custom ones:
//! - Cache identity, concurrency and recursion
//! - Native and interpreted dispatch, including adjustor thunks
//! - Failure recovery, nesting limits and generic virtual dispatch
//! - Runtime generic context data and diagnostic names

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Barrier, OnceLock, Weak,
};

use methodinst::prelude::*;
use parking_lot::Mutex;

// Helper function to create a code address
fn ptr(address: usize) -> MethodPointer {
    MethodPointer::new(address).unwrap()
}

// Helper function to create a non-generic type
fn create_type(row: u32, name: &str, valuetype: bool) -> RuntimeTypeRc {
    Arc::new(RuntimeType::new(Token::type_def(row), "", name, valuetype))
}

// Helper function to create an open generic type
fn create_generic_type(row: u32, name: &str, params: &[&str], valuetype: bool) -> RuntimeTypeRc {
    let params = params
        .iter()
        .zip(0u16..)
        .map(|(name, number)| GenericParameter::new(*name, number))
        .collect();

    Arc::new(RuntimeType::new(Token::type_def(row), "", name, valuetype).with_generic_params(params))
}

// Helper function to create a generic argument list of concrete types
fn create_inst(args: &[&RuntimeTypeRc]) -> GenericInst {
    GenericInst::new(args.iter().map(|ty| TypeSig::Type((*ty).clone())).collect())
}

// Helper function to create `SomeType::Map<T>(T value)`
fn create_map_definition() -> MethodDefinitionRc {
    Arc::new(
        MethodDefinition::new(Token::method_def(1), "Map", create_type(10, "SomeType", false))
            .with_flags(0x0006 | MethodModifiers::STATIC.bits())
            .with_generic_params(vec![GenericParameter::new("T", 0)])
            .with_return_type(TypeSig::MVar(0))
            .with_parameters(vec![Parameter::new("value", 0, TypeSig::MVar(0))]),
    )
}

// Helper function to create the key `SomeType::Map<Int32>`
fn create_map_key() -> GenericMethodRc {
    let int32 = create_type(1, "Int32", true);
    Arc::new(GenericMethod::new(
        create_map_definition(),
        GenericContext::new(None, Some(create_inst(&[&int32]))),
    ))
}

/// Interpreter claiming every method
struct TestInterpreter {
    entry: MethodPointer,
    thunk: Option<MethodPointer>,
    invoker: InvokerPointer,
}

impl TestInterpreter {
    fn new() -> Self {
        TestInterpreter {
            entry: ptr(0xE000),
            thunk: Some(ptr(0xE100)),
            invoker: InvokerPointer::new(0xE200).unwrap(),
        }
    }
}

impl InterpreterModule for TestInterpreter {
    fn is_interpreter_method(&self, _method: &PendingMethod<'_>) -> bool {
        true
    }

    fn is_implemented_by_interpreter(&self, _method: &PendingMethod<'_>) -> bool {
        false
    }

    fn method_invoker(&self, _method: &PendingMethod<'_>) -> Option<InvokerPointer> {
        Some(self.invoker)
    }

    fn method_pointer(&self, _method: &PendingMethod<'_>) -> Option<MethodPointer> {
        Some(self.entry)
    }

    fn adjustor_thunk_pointer(&self, _method: &PendingMethod<'_>) -> Option<MethodPointer> {
        self.thunk
    }
}

/// Inflater that requests the method under construction again from inside the build
#[derive(Default)]
struct ReentrantInflater {
    cache: OnceLock<Weak<GenericMethodCache>>,
    key: OnceLock<GenericMethodRc>,
    observed: Mutex<Option<(MethodState, bool)>>,
}

impl SignatureInflater for ReentrantInflater {
    fn inflate_type(&self, ty: &TypeSig, context: &GenericContext) -> TypeSig {
        ContextInflater::new().inflate_type(ty, context)
    }

    fn inflate_parameters(&self, params: &[Parameter], context: &GenericContext) -> Vec<Parameter> {
        if let (Some(cache), Some(key)) = (
            self.cache.get().and_then(Weak::upgrade),
            self.key.get(),
        ) {
            let nested = cache.get_method(key, false).unwrap();
            *self.observed.lock() = Some((nested.state(), nested.dispatch().is_none()));
        }

        ContextInflater::new().inflate_parameters(params, context)
    }
}

/// Realizer that fails while `failing` is set
struct FlakyRealizer {
    failing: AtomicBool,
    calls: AtomicUsize,
    inner: GenericClassRegistry,
}

impl GenericTypeRealizer for FlakyRealizer {
    fn realize_type(
        &self,
        definition: &RuntimeTypeRc,
        class_inst: &GenericInst,
    ) -> methodinst::Result<RuntimeTypeRc> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::NotGenericInstance(definition.token));
        }
        self.inner.realize_type(definition, class_inst)
    }
}

#[test]
fn test_repeated_requests_return_same_instance() {
    let cache = GenericMethodCache::new(Collaborators::new());
    let key = create_map_key();

    let first = cache.get_method(&key, true).unwrap();
    let second = cache.get_method(&key, true).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.state(), MethodState::Complete);
    assert!(first.is_inflated());
    assert_eq!(first.name(), "Map");
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.pending_len(), 0);

    let int32 = key.context().method_inst.as_ref().unwrap().args()[0].clone();
    assert_eq!(first.return_type(), Some(&int32));
    assert_eq!(first.parameters_count(), 1);
    assert_eq!(first.parameters()[0].ty, int32);
}

#[test]
fn test_concurrent_requests_construct_once() {
    const THREADS: usize = 8;

    let cache = GenericMethodCache::new(Collaborators::new());
    let key = create_map_key();
    let barrier = Barrier::new(THREADS);

    let results: Vec<InflatedMethodRc> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    cache.get_method(&key, true).unwrap()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for method in &results {
        assert!(Arc::ptr_eq(method, &results[0]));
        assert_eq!(method.state(), MethodState::Complete);
    }

    let stats = cache.stats();
    assert_eq!(stats.inflated, 1);
    assert_eq!(
        stats.fast_hits + stats.recheck_hits,
        (THREADS - 1) as u64
    );
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.pending_len(), 0);
}

#[test]
fn test_recursive_request_receives_pending_instance() {
    let inflater = Arc::new(ReentrantInflater::default());
    let cache = Arc::new(GenericMethodCache::new(
        Collaborators::new().with_inflater(inflater.clone()),
    ));
    let key = create_map_key();

    inflater.cache.set(Arc::downgrade(&cache)).unwrap();
    inflater.key.set(key.clone()).unwrap();

    let method = cache.get_method(&key, false).unwrap();

    assert_eq!(*inflater.observed.lock(), Some((MethodState::Pending, true)));
    assert_eq!(method.state(), MethodState::Complete);
    assert_eq!(cache.stats().recursion_hits, 1);
    assert_eq!(cache.stats().inflated, 1);
    assert_eq!(cache.pending_len(), 0);
}

#[test]
fn test_native_value_type_instance_method_uses_adjustor_thunk() {
    let point = create_generic_type(20, "Point", &["T"], true);
    let length = Arc::new(MethodDefinition::new(Token::method_def(5), "Length", point));
    let int32 = create_type(1, "Int32", true);
    let context = GenericContext::new(Some(create_inst(&[&int32])), None);

    let registration = CodeRegistration::new();
    registration.register_instance(
        length.token,
        context.clone(),
        MethodCode::new(ptr(0x1000)).with_adjustor_thunk(ptr(0x1008)),
    );
    registration.register_invoker(length.token, InvokerPointer::new(0x2000).unwrap());

    let cache =
        GenericMethodCache::new(Collaborators::new().with_native_code(Arc::new(registration)));
    let key = Arc::new(GenericMethod::new(length, context));
    let method = cache.get_method(&key, false).unwrap();

    assert!(method.declaring_type().unwrap().valuetype);
    assert_eq!(method.method_pointer(), Some(ptr(0x1008)));
    assert_eq!(method.virtual_method_pointer_call_by_interp(), Some(ptr(0x1008)));
    assert_eq!(method.method_pointer_call_by_interp(), Some(ptr(0x1000)));
    assert_eq!(method.invoker(), InvokerPointer::new(0x2000));
    assert!(!method.is_interpreter_impl());
    assert!(method.init_interp_call_method_pointer());
    assert_eq!(method.entry_point().unwrap(), ptr(0x1008));
    assert_eq!(cache.stats().dispatch_count(DispatchKind::NativeDirect), 1);
}

#[test]
fn test_native_reference_type_method_uses_single_entry() {
    let registration = CodeRegistration::new();
    registration.register_shared(Token::method_def(1), MethodCode::new(ptr(0x3000)));

    let cache =
        GenericMethodCache::new(Collaborators::new().with_native_code(Arc::new(registration)));
    let method = cache.get_method(&create_map_key(), false).unwrap();

    assert_eq!(method.method_pointer(), Some(ptr(0x3000)));
    assert_eq!(method.method_pointer_call_by_interp(), Some(ptr(0x3000)));
    assert_eq!(method.virtual_method_pointer_call_by_interp(), Some(ptr(0x3000)));
}

#[test]
fn test_interpreted_value_type_instance_method() {
    let interpreter = TestInterpreter::new();
    let (entry, thunk, invoker) = (interpreter.entry, interpreter.thunk, interpreter.invoker);

    let point = create_generic_type(20, "Point", &["T"], true);
    let length = Arc::new(MethodDefinition::new(Token::method_def(5), "Length", point));
    let int32 = create_type(1, "Int32", true);
    let key = Arc::new(GenericMethod::new(
        length,
        GenericContext::new(Some(create_inst(&[&int32])), None),
    ));

    let cache =
        GenericMethodCache::new(Collaborators::new().with_interpreter(Arc::new(interpreter)));
    let method = cache.get_method(&key, false).unwrap();

    assert!(method.is_interpreter_impl());
    assert!(method.init_interp_call_method_pointer());
    assert_eq!(method.method_pointer(), thunk);
    assert_eq!(method.virtual_method_pointer_call_by_interp(), thunk);
    assert_eq!(method.method_pointer_call_by_interp(), Some(entry));
    assert_eq!(method.invoker(), Some(invoker));
    assert_eq!(
        cache.stats().dispatch_count(DispatchKind::InterpretedViaThunk),
        1
    );
}

#[test]
fn test_interpreted_static_method_uses_direct_entry() {
    let interpreter = TestInterpreter::new();
    let entry = interpreter.entry;

    let cache =
        GenericMethodCache::new(Collaborators::new().with_interpreter(Arc::new(interpreter)));
    let method = cache.get_method(&create_map_key(), false).unwrap();

    assert_eq!(
        method.dispatch(),
        Some(Dispatch::InterpretedDirect { entry: Some(entry) })
    );
    assert_eq!(method.method_pointer(), Some(entry));
    assert_eq!(method.method_pointer_call_by_interp(), Some(entry));
}

#[test]
fn test_interpreted_value_type_method_without_thunk_keeps_direct_entry() {
    let interpreter = TestInterpreter {
        thunk: None,
        ..TestInterpreter::new()
    };
    let entry = interpreter.entry;

    let point = create_generic_type(20, "Point", &["T"], true);
    let length = Arc::new(MethodDefinition::new(Token::method_def(5), "Length", point));
    let int32 = create_type(1, "Int32", true);
    let key = Arc::new(GenericMethod::new(
        length,
        GenericContext::new(Some(create_inst(&[&int32])), None),
    ));

    let cache =
        GenericMethodCache::new(Collaborators::new().with_interpreter(Arc::new(interpreter)));
    let method = cache.get_method(&key, false).unwrap();

    assert_eq!(
        method.dispatch(),
        Some(Dispatch::InterpretedViaThunk {
            entry: Some(entry),
            thunk: None,
        })
    );
    assert!(method.is_interpreter_impl());
    assert!(method.init_interp_call_method_pointer());
    assert_eq!(method.method_pointer_call_by_interp(), Some(entry));
    assert!(method.method_pointer().is_none());
    assert!(method.virtual_method_pointer_call_by_interp().is_none());
    assert!(matches!(
        method.entry_point(),
        Err(Error::MissingMethodPointer(token)) if token == Token::method_def(5)
    ));
}

#[test]
fn test_full_names() {
    let cache = GenericMethodCache::new(Collaborators::new());
    assert_eq!(cache.format_full_name(&create_map_key()), "SomeType::Map<Int32>");

    let pair = create_generic_type(30, "Pair", &["TFirst", "TSecond"], false);
    let compare = Arc::new(MethodDefinition::new(Token::method_def(7), "Compare", pair));
    let int32 = create_type(1, "Int32", true);
    let string = create_type(2, "String", false);
    let key = GenericMethod::new(
        compare,
        GenericContext::new(Some(create_inst(&[&int32, &string])), None),
    );

    assert_eq!(cache.format_full_name(&key), "Pair<Int32, String>::Compare");
    assert_eq!(cache.context(&key).class_inst.as_ref().unwrap().len(), 2);
    assert!(cache.context(&key).method_inst.is_none());
}

#[test]
fn test_nesting_limit_yields_fresh_placeholder() {
    let cache = GenericMethodCache::new(Collaborators::new())
        .with_config(CacheConfig::default().with_max_generic_nesting(2));

    let list = create_generic_type(40, "List", &["T"], false);
    let int32 = create_type(1, "Int32", true);
    let nested = TypeSig::GenericInst(
        list.clone(),
        GenericInst::new(vec![TypeSig::GenericInst(
            list,
            GenericInst::new(vec![TypeSig::Type(int32)]),
        )]),
    );
    let key = Arc::new(GenericMethod::new(
        create_map_definition(),
        GenericContext::new(None, Some(GenericInst::new(vec![nested]))),
    ));
    assert!(key.nesting_depth() > 2);

    let first = cache.get_method(&key, false).unwrap();
    let second = cache.get_method(&key, false).unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(!first.is_inflated());
    assert_eq!(first.dispatch(), Some(Dispatch::NestingTooDeep));
    assert!(matches!(first.entry_point(), Err(Error::GenericNestingTooDeep)));
    assert!(cache.is_empty());
    assert_eq!(cache.stats().degenerate, 2);
}

#[test]
fn test_failed_construction_leaves_no_trace() {
    let realizer = Arc::new(FlakyRealizer {
        failing: AtomicBool::new(true),
        calls: AtomicUsize::new(0),
        inner: GenericClassRegistry::new(),
    });
    let cache = GenericMethodCache::new(Collaborators::new().with_realizer(realizer.clone()));

    let pair = create_generic_type(30, "Pair", &["TFirst", "TSecond"], false);
    let compare = Arc::new(MethodDefinition::new(Token::method_def(7), "Compare", pair));
    let int32 = create_type(1, "Int32", true);
    let key = Arc::new(GenericMethod::new(
        compare,
        GenericContext::new(Some(create_inst(&[&int32, &int32])), None),
    ));

    match cache.get_method(&key, false) {
        Err(Error::UnresolvableInstantiation { method, .. }) => {
            assert_eq!(method, "Pair<Int32, Int32>::Compare")
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(cache.is_empty());
    assert_eq!(cache.pending_len(), 0);
    assert_eq!(cache.stats().failures, 1);

    realizer.failing.store(false, Ordering::SeqCst);
    let method = cache.get_method(&key, false).unwrap();

    assert_eq!(method.state(), MethodState::Complete);
    assert_eq!(realizer.calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.pending_len(), 0);
}

#[test]
fn test_virtual_dispatch_target_combines_contexts() {
    let cache = GenericMethodCache::new(Collaborators::new());
    let int32 = create_type(1, "Int32", true);
    let string = create_type(2, "String", false);

    let base = create_type(50, "Base", false);
    let base_process = Arc::new(
        MethodDefinition::new(Token::method_def(10), "Process", base)
            .with_generic_params(vec![GenericParameter::new("U", 0)]),
    );
    let called = cache
        .get_method(
            &Arc::new(GenericMethod::new(
                base_process,
                GenericContext::new(None, Some(create_inst(&[&string]))),
            )),
            false,
        )
        .unwrap();

    let derived = create_generic_type(51, "Derived", &["T"], false);
    let derived_process = Arc::new(
        MethodDefinition::new(Token::method_def(11), "Process", derived)
            .with_generic_params(vec![GenericParameter::new("U", 0)]),
    );
    let slot = cache
        .get_method(
            &Arc::new(GenericMethod::new(
                derived_process.clone(),
                GenericContext::new(Some(create_inst(&[&int32])), None),
            )),
            false,
        )
        .unwrap();

    let target = cache
        .get_virtual_dispatch_target(&MethodRef::Inflated(slot), &called)
        .unwrap();

    let key = target.generic_method().unwrap();
    assert!(Arc::ptr_eq(key.definition(), &derived_process));
    assert_eq!(
        *key.context(),
        GenericContext::new(
            Some(create_inst(&[&int32])),
            Some(create_inst(&[&string]))
        )
    );
    assert_eq!(
        cache.format_full_name(key),
        "Derived<Int32>::Process<String>"
    );

    let again = cache
        .get_virtual_dispatch_target(&MethodRef::Inflated(target.clone()), &called)
        .unwrap();
    assert!(Arc::ptr_eq(&target, &again));
}

#[test]
fn test_virtual_dispatch_target_from_plain_definition() {
    let cache = GenericMethodCache::new(Collaborators::new());
    let called = cache.get_method(&create_map_key(), false).unwrap();

    let sealed = create_type(60, "Sealed", false);
    let override_map = Arc::new(
        MethodDefinition::new(Token::method_def(12), "Map", sealed)
            .with_generic_params(vec![GenericParameter::new("T", 0)]),
    );

    let target = cache
        .get_virtual_dispatch_target(&MethodRef::Definition(override_map), &called)
        .unwrap();
    assert_eq!(
        cache.format_full_name(target.generic_method().unwrap()),
        "Sealed::Map<Int32>"
    );

    let placeholder = cache
        .request_method(MethodRequest::TooDeeplyNested, false)
        .unwrap();
    assert!(matches!(
        cache.get_virtual_dispatch_target(&MethodRef::Inflated(called), &placeholder),
        Err(Error::NotGenericInstance(_))
    ));
}

#[test]
fn test_reset_all_forgets_instances() {
    let cache = GenericMethodCache::new(Collaborators::new());
    let key = create_map_key();

    let before = cache.get_method(&key, false).unwrap();
    cache.reset_all();
    assert!(cache.is_empty());
    assert_eq!(cache.pending_len(), 0);

    let after = cache.get_method(&key, false).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_method_level_instance_gets_context_data() {
    let image = Arc::new(MetadataImage::new("Generics.dll"));
    let helpers = Arc::new(
        RuntimeType::new(Token::type_def(70), "", "Helpers", false).with_image(image.clone()),
    );
    let callee = Arc::new(
        MethodDefinition::new(Token::method_def(21), "Wrap", helpers.clone())
            .with_generic_params(vec![GenericParameter::new("T", 0)]),
    );
    let caller = Arc::new(
        MethodDefinition::new(Token::method_def(20), "Run", helpers)
            .with_generic_params(vec![GenericParameter::new("T", 0)]),
    );

    image.add_rgctx(caller.token, RgctxDefinition::Type(TypeSig::MVar(0)));
    image.add_rgctx(
        caller.token,
        RgctxDefinition::Method(
            callee.clone(),
            GenericContext::new(
                None,
                Some(GenericInst::new(vec![TypeSig::SzArray(Box::new(
                    TypeSig::MVar(0),
                ))])),
            ),
        ),
    );

    let int32 = create_type(1, "Int32", true);
    let cache = GenericMethodCache::new(Collaborators::new());
    let method = cache
        .get_method(
            &Arc::new(GenericMethod::new(
                caller,
                GenericContext::new(None, Some(create_inst(&[&int32]))),
            )),
            false,
        )
        .unwrap();

    let data = method.rgctx_data().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data.entries()[0], RgctxEntry::Type(TypeSig::Type(int32.clone())));
    assert_eq!(
        data.entries()[1],
        RgctxEntry::Method(GenericMethod::new(
            callee,
            GenericContext::new(
                None,
                Some(GenericInst::new(vec![TypeSig::SzArray(Box::new(
                    TypeSig::Type(int32)
                ))])),
            ),
        ))
    );

    assert!(!method.is_generic());
    assert!(method.generic_container().is_none());
    assert!(method.metadata_handle().is_none());
}
