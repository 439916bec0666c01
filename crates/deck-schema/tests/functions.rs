//! # Bound Function Tests
//!
//! Calls into document callables through declared signatures: vector
//! marshaling in both directions, vector arithmetic done by the callable,
//! mixed argument lists, verifiers that call the function, struct arrays
//! of functions, and failure handling for faults, panics, and arity
//! mismatches.

use deck_core::{Arity, CallError, DeckError, DeckResult, FunctionType, IndexedMap, Value, Vector3D};
use deck_document::DocumentReader;
use deck_schema::{BoundFunction, Deck, DiagnosticKind, FromDeck, View};

fn doubles(args: &[Value]) -> Vec<f64> {
    args.iter().filter_map(Value::as_double).collect()
}

fn scaled(factor: f64) -> impl Fn(&[Value]) -> Result<Vec<Value>, String> {
    move |args| Ok(doubles(args).into_iter().map(|x| Value::Double(x * factor)).collect())
}

fn vector_at(args: &[Value], offset: usize) -> Vector3D {
    let v = doubles(args);
    Vector3D::new(v[offset], v[offset + 1], v[offset + 2])
}

fn components(v: Vector3D) -> Vec<Value> {
    v.components().into_iter().map(Value::Double).collect()
}

fn reader_with(path: &str, arity: Arity, body: impl Fn(&[Value]) -> Result<Vec<Value>, String> + 'static) -> DocumentReader {
    let mut reader = DocumentReader::parse_str("").expect("empty document parses");
    reader.define_function(path, arity, body).expect("valid path");
    reader
}

// ---------------------------------------------------------------------------
// Marshaling
// ---------------------------------------------------------------------------

#[test]
fn test_vec3_to_double() {
    let reader = reader_with("foo", Arity::Fixed(3), |args| {
        Ok(vec![Value::Double(doubles(args).iter().sum())])
    });
    let mut deck = Deck::new(reader);
    deck.add_function("foo", FunctionType::Double, [FunctionType::Vec3D], "")
        .unwrap()
        .required(true);
    assert!(deck.verify().is_ok());

    let result: f64 = deck.call("foo", Vector3D::new(1.0, 2.0, 3.0)).unwrap();
    assert_eq!(result, 6.0);
}

#[test]
fn test_vec3_to_vec3() {
    let mut deck = Deck::new(reader_with("foo", Arity::Fixed(3), scaled(2.0)));
    deck.add_function("foo", FunctionType::Vec3D, [FunctionType::Vec3D], "")
        .unwrap();
    let result: Vector3D = deck.call("foo", Vector3D::new(1.0, 2.0, 3.0)).unwrap();
    assert_eq!(result, Vector3D::new(2.0, 4.0, 6.0));
}

#[test]
fn test_vec3_and_double_arguments() {
    let reader = reader_with("foo", Arity::Fixed(4), |args| {
        let v = doubles(args);
        Ok(vec![Value::Double((v[0] + v[1] + v[2]) * v[3])])
    });
    let mut deck = Deck::new(reader);
    deck.add_function("foo", FunctionType::Double, [FunctionType::Vec3D, FunctionType::Double], "")
        .unwrap();
    let result: f64 = deck.call("foo", (Vector3D::new(1.0, 2.0, 3.0), 2.0)).unwrap();
    assert_eq!(result, 12.0);
}

#[test]
fn test_two_component_return_fills_z_with_zero() {
    let reader = reader_with("flat", Arity::Fixed(3), |args| {
        let v = doubles(args);
        Ok(vec![Value::Double(v[0]), Value::Double(v[1])])
    });
    let mut deck = Deck::new(reader);
    deck.add_function("flat", FunctionType::Vec3D, [FunctionType::Vec3D], "")
        .unwrap();
    let result: Vector3D = deck.call("flat", Vector3D::new(5.0, 6.0, 7.0)).unwrap();
    assert_eq!(result, Vector3D::new(5.0, 6.0, 0.0));
}

#[test]
fn test_bad_argument_type_is_call_error() {
    let mut deck = Deck::new(reader_with("foo", Arity::Fixed(3), scaled(1.0)));
    deck.add_function("foo", FunctionType::Vec3D, [FunctionType::Vec3D], "")
        .unwrap();
    let err = deck.call::<Vector3D>("foo", 1.0).unwrap_err();
    assert!(matches!(
        err,
        DeckError::Call(CallError::ArgumentType { position: 0, .. })
    ));
}

#[test]
fn test_bad_return_is_call_error() {
    let reader = reader_with("foo", Arity::Fixed(1), |_| Ok(vec![Value::from("nope")]));
    let mut deck = Deck::new(reader);
    deck.add_function("foo", FunctionType::Double, [FunctionType::Double], "")
        .unwrap();
    assert!(matches!(
        deck.call::<f64>("foo", 1.0),
        Err(DeckError::Call(CallError::ReturnType { .. }))
    ));
}

// ---------------------------------------------------------------------------
// Vector arithmetic
// ---------------------------------------------------------------------------

fn vector_deck() -> Deck {
    let mut reader = DocumentReader::parse_str("").unwrap();
    reader
        .define_function("norm", Arity::Fixed(3), |args| {
            Ok(vec![Value::Double(vector_at(args, 0).norm())])
        })
        .unwrap();
    reader
        .define_function("dot", Arity::Fixed(6), |args| {
            Ok(vec![Value::Double(vector_at(args, 0).dot(&vector_at(args, 3)))])
        })
        .unwrap();
    reader
        .define_function("add", Arity::Fixed(6), |args| {
            Ok(components(vector_at(args, 0) + vector_at(args, 3)))
        })
        .unwrap();
    reader
        .define_function("sub", Arity::Fixed(6), |args| {
            Ok(components(vector_at(args, 0) - vector_at(args, 3)))
        })
        .unwrap();
    reader
        .define_function("cross", Arity::Fixed(6), |args| {
            Ok(components(vector_at(args, 0).cross(&vector_at(args, 3))))
        })
        .unwrap();
    reader
        .define_function("negate", Arity::Fixed(3), |args| Ok(components(-vector_at(args, 0))))
        .unwrap();
    reader
        .define_function("scale", Arity::Fixed(4), |args| {
            Ok(components(vector_at(args, 0) * doubles(args)[3]))
        })
        .unwrap();
    reader
        .define_function("direction", Arity::Fixed(3), |args| {
            Ok(components(vector_at(args, 0).unit_vector()))
        })
        .unwrap();

    let mut deck = Deck::new(reader);
    let v3 = FunctionType::Vec3D;
    let d = FunctionType::Double;
    deck.add_function("norm", d, [v3], "").unwrap();
    deck.add_function("dot", d, [v3, v3], "").unwrap();
    deck.add_function("add", v3, [v3, v3], "").unwrap();
    deck.add_function("sub", v3, [v3, v3], "").unwrap();
    deck.add_function("cross", v3, [v3, v3], "").unwrap();
    deck.add_function("negate", v3, [v3], "").unwrap();
    deck.add_function("scale", v3, [v3, d], "").unwrap();
    deck.add_function("direction", v3, [v3], "").unwrap();
    deck
}

#[test]
fn test_vector_arithmetic_round_trips_through_callables() {
    let deck = vector_deck();
    assert!(deck.verify().is_ok());
    let a = Vector3D::new(1.0, 2.0, 3.0);
    let b = Vector3D::new(4.0, 5.0, 6.0);

    assert_eq!(deck.call::<f64>("dot", (a, b)).unwrap(), 32.0);
    assert_eq!(deck.call::<Vector3D>("add", (a, b)).unwrap(), Vector3D::new(5.0, 7.0, 9.0));
    assert_eq!(deck.call::<Vector3D>("sub", (b, a)).unwrap(), Vector3D::new(3.0, 3.0, 3.0));
    assert_eq!(deck.call::<Vector3D>("cross", (a, b)).unwrap(), Vector3D::new(-3.0, 6.0, -3.0));
    assert_eq!(deck.call::<Vector3D>("negate", a).unwrap(), Vector3D::new(-1.0, -2.0, -3.0));
    assert_eq!(deck.call::<Vector3D>("scale", (a, 2.0)).unwrap(), Vector3D::new(2.0, 4.0, 6.0));
}

#[test]
fn test_norm_and_direction_through_callables() {
    let deck = vector_deck();
    let v = Vector3D::new(3.0, 0.0, 4.0);

    let norm: f64 = deck.call("norm", v).unwrap();
    assert_eq!(norm, 5.0);
    assert_eq!(norm * norm, v.squared_norm());

    let direction: Vector3D = deck.call("direction", v).unwrap();
    assert!((direction.norm() - 1.0).abs() < 1e-12);
    let expected = Vector3D::new(0.6, 0.0, 0.8);
    assert!((direction - expected).norm() < 1e-12);
    assert!((direction * norm - v).norm() < 1e-12);
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

fn doubling_deck(input: Vector3D, expected: Vector3D) -> Deck {
    let mut deck = Deck::new(reader_with("foo", Arity::Fixed(3), scaled(2.0)));
    deck.add_function("foo", FunctionType::Vec3D, [FunctionType::Vec3D], "")
        .unwrap()
        .required(true)
        .register_verifier(move |f| f.call::<Vector3D>(input).map(|r| r == expected).unwrap_or(false));
    deck
}

#[test]
fn test_verifier_call_passes() {
    let deck = doubling_deck(Vector3D::new(1.0, 0.0, 0.0), Vector3D::new(2.0, 0.0, 0.0));
    assert!(deck.verify().is_ok());
}

#[test]
fn test_verifier_call_fails() {
    let deck = doubling_deck(Vector3D::new(2.0, 0.0, 0.0), Vector3D::new(2.0, 0.0, 0.0));
    let report = deck.verify();
    assert_eq!(report.len(), 1);
    assert_eq!(report.diagnostics()[0].kind, DiagnosticKind::VerifierFailed);
}

#[test]
fn test_fault_during_verifier_call_is_call_error_diagnostic() {
    let reader = reader_with("foo", Arity::Fixed(1), |_| Err("attempt to index a nil value".to_string()));
    let mut deck = Deck::new(reader);
    deck.add_function("foo", FunctionType::Double, [FunctionType::Double], "")
        .unwrap()
        .register_verifier(|f| f.call::<f64>(1.0).is_ok());
    let report = deck.verify();
    assert_eq!(report.len(), 1);
    let d = &report.diagnostics()[0];
    assert_eq!(d.kind, DiagnosticKind::CallError);
    assert!(d.message.contains("attempt to index a nil value"));
}

#[test]
fn test_panic_inside_callable_is_caught() {
    let reader = reader_with("foo", Arity::Fixed(1), |args| {
        let v = doubles(args);
        if v[0] == 0.0 {
            panic!("singular input");
        }
        Ok(vec![Value::Double(1.0 / v[0])])
    });
    let mut deck = Deck::new(reader);
    deck.add_function("foo", FunctionType::Double, [FunctionType::Double], "")
        .unwrap();
    assert_eq!(deck.call::<f64>("foo", 4.0).unwrap(), 0.25);
    match deck.call::<f64>("foo", 0.0) {
        Err(DeckError::Call(CallError::Fault { message, .. })) => {
            assert!(message.contains("singular input"));
        }
        other => panic!("expected a fault, got {other:?}"),
    }
}

#[test]
fn test_arity_mismatch_is_signature_mismatch() {
    let mut deck = Deck::new(reader_with("foo", Arity::Fixed(2), scaled(1.0)));
    deck.add_function("foo", FunctionType::Vec3D, [FunctionType::Vec3D], "")
        .unwrap()
        .register_verifier(|_| false);
    let report = deck.verify();
    assert_eq!(report.len(), 1, "verifiers are skipped after a signature mismatch");
    assert_eq!(report.diagnostics()[0].kind, DiagnosticKind::SignatureMismatch);

    assert!(matches!(
        deck.get::<BoundFunction>("foo"),
        Err(DeckError::Call(CallError::Arity { expected: 3, actual: 2, .. }))
    ));
}

#[test]
fn test_variadic_callable_fits_any_signature() {
    let mut deck = Deck::new(reader_with("foo", Arity::Variadic, scaled(3.0)));
    deck.add_function("foo", FunctionType::Vec3D, [FunctionType::Vec3D], "")
        .unwrap()
        .required(true);
    assert!(deck.verify().is_ok());
}

#[test]
fn test_missing_required_function() {
    let mut deck = Deck::new(DocumentReader::parse_str("").unwrap());
    deck.add_function("foo", FunctionType::Double, [FunctionType::Double], "")
        .unwrap()
        .required(true);
    let report = deck.verify();
    assert_eq!(report.of_kind(DiagnosticKind::MissingRequired).count(), 1);
    assert_eq!(deck.get::<Option<BoundFunction>>("foo").unwrap().map(|_| ()), None);
}

// ---------------------------------------------------------------------------
// Functions inside aggregates
// ---------------------------------------------------------------------------

struct Foo {
    bar: bool,
    baz: BoundFunction,
}

impl FromDeck for Foo {
    fn from_view(view: &View<'_>) -> DeckResult<Self> {
        Ok(Self {
            bar: view.get("bar")?,
            baz: view.get("baz")?,
        })
    }
}

#[test]
fn test_function_in_struct() {
    let mut reader = DocumentReader::parse_str("foo: {bar: true}").unwrap();
    reader.define_function("foo.baz", Arity::Fixed(3), scaled(2.0)).unwrap();
    let mut deck = Deck::new(reader);
    deck.add_bool("foo.bar", "").unwrap();
    deck.add_function("foo.baz", FunctionType::Vec3D, [FunctionType::Vec3D], "")
        .unwrap()
        .required(true);
    assert!(deck.verify().is_ok());

    let foo: Foo = deck.get("foo").unwrap();
    assert!(foo.bar);
    let result: Vector3D = foo.baz.call(Vector3D::new(4.0, 5.0, 6.0)).unwrap();
    assert_eq!(result, Vector3D::new(8.0, 10.0, 12.0));
}

#[test]
fn test_struct_array_of_functions() {
    let mut reader =
        DocumentReader::parse_str("foo: {7: {bar: true}, 12: {bar: false}}").unwrap();
    reader.define_function("foo.7.baz", Arity::Fixed(3), scaled(2.0)).unwrap();
    reader.define_function("foo.12.baz", Arity::Fixed(3), scaled(3.0)).unwrap();

    let mut deck = Deck::new(reader);
    let foos = deck.add_struct_array("foo", "").unwrap();
    foos.add_bool("bar", "").unwrap();
    foos.add_function("baz", FunctionType::Vec3D, [FunctionType::Vec3D], "")
        .unwrap()
        .required(true);
    assert!(deck.verify().is_ok());

    let foos: IndexedMap<Foo> = deck.get("foo").unwrap();
    assert_eq!(foos.indices().collect::<Vec<_>>(), [7, 12]);
    assert!(foos[7].bar);
    assert!(!foos[12].bar);
    let v = Vector3D::new(4.0, 5.0, 6.0);
    assert_eq!(foos[7].baz.call::<Vector3D>(v).unwrap(), Vector3D::new(8.0, 10.0, 12.0));
    assert_eq!(foos[12].baz.call::<Vector3D>(v).unwrap(), Vector3D::new(12.0, 15.0, 18.0));
}

#[test]
fn test_elements_made_only_of_functions() {
    let mut reader = DocumentReader::parse_str("").unwrap();
    reader.define_function("sources.1.f", Arity::Fixed(1), scaled(1.0)).unwrap();
    reader.define_function("sources.5.f", Arity::Fixed(1), scaled(5.0)).unwrap();
    let mut deck = Deck::new(reader);
    deck.add_struct_array("sources", "")
        .unwrap()
        .required(true)
        .add_function("f", FunctionType::Double, [FunctionType::Double], "")
        .unwrap()
        .required(true);
    assert!(deck.verify().is_ok());
    assert_eq!(deck.call::<f64>("sources.5.f", 2.0).unwrap(), 10.0);
}
