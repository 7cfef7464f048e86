//! Property-based tests: round trips through the serializer and parsers, and
//! equivalence of ascii and binary encodings of the same field.

use foamdict::ser::default_header;
use foamdict::{
    from_slice, parse_data, parse_standalone, serialize_standalone, to_vec, Dict, DimensionSet,
    Field, FileDict, FoamOptions, Format, NumericArray, NumericData, Tensor, TensorKind, Value,
};
use proptest::prelude::*;

fn roundtrip_data(value: &Value) -> bool {
    let rendered = match foamdict::ser::to_string(value) {
        Ok(rendered) => rendered,
        Err(e) => {
            eprintln!("Serialize failed: {e}");
            return false;
        }
    };
    match parse_data(rendered.as_bytes()) {
        Ok(parsed) => {
            if !parsed.nan_eq(value) {
                eprintln!("Rendered was: {rendered}");
                eprintln!("Parsed back as: {parsed:?}");
            }
            parsed.nan_eq(value)
        }
        Err(e) => {
            eprintln!("Parse failed: {e}");
            eprintln!("Rendered was: {rendered}");
            false
        }
    }
}

const RESERVED: [&str; 8] = ["yes", "no", "on", "off", "true", "false", "uniform", "nonuniform"];

fn word() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_.]{0,12}".prop_filter("reserved or numeric word", |w| {
        let lower = w.to_ascii_lowercase();
        !RESERVED.contains(&lower.as_str()) && !lower.starts_with("inf") && !lower.starts_with("nan")
    })
}

fn kind() -> impl Strategy<Value = TensorKind> {
    prop_oneof![
        Just(TensorKind::Scalar),
        Just(TensorKind::Vector),
        Just(TensorKind::SymmTensor),
        Just(TensorKind::Tensor),
    ]
}

fn component() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -1e6..1e6f64,
        4 => any::<f64>(),
        1 => Just(f64::NAN),
        1 => Just(0.0),
    ]
}

fn field_file(array: &NumericArray, format: Format) -> FileDict {
    let mut header = default_header(array.kind().field_class());
    header.insert("format", Value::from(format.as_str()));
    let mut file = FileDict::new();
    file.entries.insert("FoamFile", Value::Dict(header));
    file.entries.insert("dimensions", Value::DimensionSet(DimensionSet::dimensionless()));
    file.entries
        .insert("internalField", Value::Field(Field::NonUniform(array.clone())));
    file
}

fn reparse_field(array: &NumericArray, format: Format) -> NumericArray {
    let bytes = to_vec(&field_file(array, format), false).unwrap();
    let file = from_slice(&bytes).unwrap();
    file.get("internalField")
        .and_then(Value::as_field)
        .and_then(Field::as_nonuniform)
        .cloned()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_integer(n in -1_000_000_000_000i64..1_000_000_000_000) {
        prop_assert!(roundtrip_data(&Value::from(n)));
    }

    #[test]
    fn prop_float(x in any::<f64>()) {
        prop_assert!(roundtrip_data(&Value::from(x)));
    }

    #[test]
    fn prop_switch(b in any::<bool>()) {
        prop_assert!(roundtrip_data(&Value::from(b)));
    }

    #[test]
    fn prop_word(w in word()) {
        prop_assert!(roundtrip_data(&Value::from(w)));
    }

    #[test]
    fn prop_quoted_text(s in "[ -~]{0,20}") {
        let quoted = format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""));
        prop_assert!(roundtrip_data(&Value::Text(quoted)));
    }

    #[test]
    fn prop_dimension_set(exponents in prop::array::uniform7(-4i8..5)) {
        let dims = DimensionSet::new(exponents.map(f64::from));
        prop_assert!(roundtrip_data(&Value::DimensionSet(dims)));
    }

    #[test]
    fn prop_uniform_field(kind in kind(), values in prop::collection::vec(component(), 9)) {
        let tensor = Tensor::from_components(&values[..kind.components()]).unwrap();
        prop_assert!(roundtrip_data(&Value::Field(Field::Uniform(tensor))));
    }

    #[test]
    fn prop_word_tuple(words in prop::collection::vec(word(), 2..5)) {
        let tuple = Value::Tuple(words.into_iter().map(Value::from).collect());
        prop_assert!(roundtrip_data(&tuple));
    }

    #[test]
    fn prop_faces(faces in prop::collection::vec(prop::collection::vec(0i64..100_000, 3..=4), 1..10)) {
        let value = Value::Faces(faces);
        let bytes = serialize_standalone(&value, &FoamOptions::new()).unwrap();
        let parsed = parse_standalone(&bytes, Format::Ascii).unwrap();
        prop_assert_eq!(parsed, value);
    }

    #[test]
    fn prop_binary_matches_ascii(kind in kind(), values in prop::collection::vec(component(), 45)) {
        let data = values[..5 * kind.components()].to_vec();
        let array = NumericArray::new(kind, NumericData::F64(data)).unwrap();

        let ascii = reparse_field(&array, Format::Ascii);
        let binary = reparse_field(&array, Format::Binary);
        prop_assert_eq!(ascii.len(), 5);
        prop_assert!(ascii.nan_eq(&array));
        prop_assert!(binary.nan_eq(&array));
        prop_assert!(ascii.nan_eq(&binary));
    }

    #[test]
    fn prop_reserialization_is_idempotent(
        entries in prop::collection::vec((word(), -1000i64..1000), 1..8),
        nested in prop::collection::vec((word(), word()), 0..4),
    ) {
        let mut file = FileDict::new();
        for (key, n) in entries {
            file.entries.insert(key, Value::from(n));
        }
        if !nested.is_empty() {
            let sub: Dict = nested.into_iter().map(|(k, v)| (k, Value::from(v))).collect();
            file.entries.insert("subDict", Value::Dict(sub));
        }

        let first = to_vec(&file, true).unwrap();
        let second = to_vec(&from_slice(&first).unwrap(), true).unwrap();
        prop_assert_eq!(first, second);
    }
}

#[test]
fn binary_and_ascii_agree_for_every_shape() {
    for kind in TensorKind::ALL {
        let n = 5 * kind.components();
        #[allow(clippy::cast_precision_loss)]
        let mut data: Vec<f64> = (0..n).map(|i| i as f64 * 0.1 - 1.0).collect();
        data[1] = f64::NAN;
        let array = NumericArray::new(kind, NumericData::F64(data)).unwrap();

        let ascii = reparse_field(&array, Format::Ascii);
        let binary = reparse_field(&array, Format::Binary);
        assert_eq!(ascii.kind(), kind);
        assert_eq!(binary.kind(), kind);
        assert!(ascii.nan_eq(&binary), "shape (5, {})", kind.components());
    }
}

#[test]
fn binary_float32_points_round_trip() {
    let points = NumericArray::new(
        TensorKind::Vector,
        NumericData::F32(vec![0.5, 1.25, -2.0, 3.0, 0.0, 1.0]),
    )
    .unwrap();
    let value = Value::Array(points);

    let options = FoamOptions::new().with_format(Format::Binary);
    let bytes = serialize_standalone(&value, &options).unwrap();
    assert_eq!(bytes.len(), 2 + 6 * 4 + 1);
    assert_eq!(parse_standalone(&bytes, Format::Binary).unwrap(), value);
}

#[test]
fn binary_standalone_payloads_are_not_scanned_as_text() {
    let labels = NumericArray::new(
        TensorKind::Scalar,
        NumericData::I32(vec![i32::from_ne_bytes(*b"/*//"), i32::from_ne_bytes(*b"\"\"/*"), 7]),
    )
    .unwrap();
    let points = NumericArray::vectors(&[[f64::from_ne_bytes(*b"//\"/*\0\0\0"), 0.5, -1.0]]);

    let options = FoamOptions::new().with_format(Format::Binary);
    for array in [labels, points] {
        let value = Value::Array(array);
        let mut file = b"FoamFile\n{\n    format binary;\n}\n".to_vec();
        file.extend(serialize_standalone(&value, &options).unwrap());
        file.push(b'\n');
        assert_eq!(from_slice(&file).unwrap().standalone, Some(value));
    }
}
