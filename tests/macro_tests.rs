use foamdict::{foam, from_slice, to_vec, Dict, Document, FileDict, ListItem, Number, Value};

#[test]
fn test_foam_macro_empty_entry() {
    assert_eq!(foam!(;), Value::Empty);
}

#[test]
fn test_foam_macro_numbers() {
    assert_eq!(foam!(42), Value::Number(Number::Integer(42)));
    assert_eq!(foam!(-123), Value::Number(Number::Integer(-123)));
    assert_eq!(foam!(1e-06), Value::Number(Number::Float(1e-06)));
}

#[test]
fn test_foam_macro_words() {
    assert_eq!(foam!("GAMG"), Value::Text("GAMG".to_string()));
    assert_eq!(foam!(false), Value::Switch(false));
}

#[test]
fn test_foam_macro_negative_items_need_parens() {
    let list = foam!([(-1), 0, (-2)]);
    assert_eq!(
        list,
        Value::List(vec![
            ListItem::Value(Value::from(-1)),
            ListItem::Value(Value::from(0)),
            ListItem::Value(Value::from(-2)),
        ])
    );
}

#[test]
fn test_foam_macro_expressions() {
    let tolerance = 1e-5;
    let names = vec!["inlet", "outlet"];
    let dict = foam!({ "tolerance": tolerance, "patches": (names.clone()) });
    let dict = dict.as_dict().unwrap();
    assert_eq!(dict.get("tolerance"), Some(&Value::from(1e-5)));
    assert_eq!(dict.get("patches"), Some(&Value::from(names)));
}

#[test]
fn test_foam_macro_serializes_boundary_conditions() {
    let mut file = FileDict::new();
    file.entries.insert(
        "boundaryField",
        foam!({
            "inlet": { "type": "fixedValue", "value": [1.0, 0.0, 0.0] },
            "outlet": { "type": "zeroGradient" },
        }),
    );

    let text = String::from_utf8(to_vec(&file, false).unwrap()).unwrap();
    assert_eq!(
        text,
        "boundaryField\n{\n    inlet\n    {\n        type fixedValue;\n        value uniform (1 0 0);\n    }\n    outlet\n    {\n        type zeroGradient;\n    }\n}\n\n"
    );

    let reparsed = from_slice(text.as_bytes()).unwrap();
    let outlet = ["boundaryField", "outlet", "type"].map(String::from);
    assert_eq!(reparsed.entries.get_path(&outlet), Some(&Value::from("zeroGradient")));
}

#[test]
fn test_foam_macro_with_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fvSolution");
    std::fs::write(&path, "solvers\n{\n}\n").unwrap();

    let doc = Document::open(&path);
    doc.set(
        ["solvers", "p"],
        foam!({ "solver": "PCG", "preconditioner": "DIC", "tolerance": 1e-06, "relTol": 0.05 }),
    )
    .unwrap();

    let p = doc.get(["solvers", "p"]).unwrap();
    let expected: Dict = [
        ("solver", Value::from("PCG")),
        ("preconditioner", Value::from("DIC")),
        ("tolerance", Value::from(1e-06)),
        ("relTol", Value::from(0.05)),
    ]
    .into_iter()
    .collect();
    assert_eq!(p, Value::Dict(expected));
}
