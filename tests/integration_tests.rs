use foamdict::{
    from_slice, from_value, parse_data, parse_located, parse_standalone, serialize_standalone,
    to_vec, Dict, DimensionSet, Dimensioned, Error, Field, FileDict, FoamOptions, Format,
    KeywordPath, ListItem, NumericArray, ParsedDocument, Tensor, TensorKind, Value,
};
use serde::Deserialize;

const FV_SOLUTION: &str = r#"/*--------------------------------*- C++ -*----------------------------------*\
  =========                 |
  \\      /  F ield         | OpenFOAM: The Open Source CFD Toolbox
\*---------------------------------------------------------------------------*/
FoamFile
{
    version     2.0;
    format      ascii;
    class       dictionary;
    location    "system";
    object      fvSolution;
}
// * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * //

solvers
{
    p
    {
        solver          GAMG;
        tolerance       1e-06;
        relTol          0.1;
        smoother        GaussSeidel;
    }

    "(U|k|epsilon)"
    {
        solver          smoothSolver;
        smoother        symGaussSeidel;
        tolerance       1e-05;
        relTol          0.1;
    }
}

SIMPLE
{
    nNonOrthogonalCorrectors 0;
    consistent      yes;

    residualControl
    {
        p               1e-2;
        U               1e-3;
        "(k|epsilon)"   1e-3;
    }
}

relaxationFactors
{
    equations
    {
        U               0.9;
        ".*"            0.9;
    }
}

// ************************************************************************* //
"#;

#[test]
fn test_scenario_a_single_entry() {
    let file = from_slice(b"a b;").unwrap();
    assert_eq!(file.get("a"), Some(&Value::from("b")));
    assert_eq!(file.entries.len(), 1);
    assert!(file.standalone.is_none());
}

#[test]
fn test_scenario_b_uniform_vector_byte_identical() {
    let input = b"internalField uniform (1 0 0);\n";
    let file = from_slice(input).unwrap();
    assert_eq!(
        file.get("internalField"),
        Some(&Value::Field(Field::Uniform(Tensor::Vector([1.0, 0.0, 0.0]))))
    );
    assert_eq!(to_vec(&file, false).unwrap(), input.to_vec());
}

#[test]
fn test_scenario_c_nonuniform_scalars() {
    let value = parse_data(b"nonuniform List<scalar> 2(1 2)").unwrap();
    let array = value.as_field().and_then(Field::as_nonuniform).unwrap();
    assert_eq!(array.kind(), TensorKind::Scalar);
    assert_eq!(array.data().to_f64(), vec![1.0, 2.0]);
}

#[test]
fn test_scenario_d_dimension_set() {
    let value = parse_data(b"[1 1 -2 0 0 0 0]").unwrap();
    let dims = value.as_dimension_set().unwrap();
    assert_eq!(dims.mass, 1.0);
    assert_eq!(dims.length, 1.0);
    assert_eq!(dims.time, -2.0);
    assert_eq!(dims.temperature, 0.0);
    assert_eq!(dims.to_string(), "DimensionSet(mass=1, length=1, time=-2)");
}

#[test]
fn test_scenario_e_duplicate_key() {
    let err = from_slice(b"solver PCG;\nsolver GAMG;\n").unwrap_err();
    match err {
        Error::Semantic { line, col, msg, .. } => {
            assert_eq!((line, col), (2, 1));
            assert!(msg.contains("solver"));
        }
        other => panic!("expected semantic error, got {other:?}"),
    }
}

#[test]
fn test_full_fv_solution() {
    let file = from_slice(FV_SOLUTION.as_bytes()).unwrap();
    let header = file.header().unwrap();
    assert_eq!(header.get("object"), Some(&Value::from("fvSolution")));
    assert_eq!(header.get("location"), Some(&Value::from("\"system\"")));

    let path = |segments: &[&str]| -> Vec<String> { segments.iter().map(|s| s.to_string()).collect() };
    assert_eq!(
        file.entries.get_path(&path(&["solvers", "p", "tolerance"])),
        Some(&Value::from(1e-06))
    );
    assert_eq!(
        file.entries.get_path(&path(&["solvers", "\"(U|k|epsilon)\"", "solver"])),
        Some(&Value::from("smoothSolver"))
    );
    assert_eq!(
        file.entries.get_path(&path(&["SIMPLE", "consistent"])),
        Some(&Value::Switch(true))
    );
    assert_eq!(
        file.entries.get_path(&path(&["SIMPLE", "nNonOrthogonalCorrectors"])),
        Some(&Value::from(0))
    );
}

#[test]
fn test_spans_cover_entry_text() {
    let index = parse_located(FV_SOLUTION.as_bytes()).unwrap();
    let entry = index
        .get_one(&KeywordPath::from(["SIMPLE", "residualControl", "U"]))
        .unwrap();
    assert_eq!(&FV_SOLUTION[entry.span()], "U               1e-3;");

    let block = index.get_one(&KeywordPath::from("relaxationFactors")).unwrap();
    let text = &FV_SOLUTION[block.span()];
    assert!(text.starts_with("relaxationFactors\n{"));
    assert!(text.ends_with("    }\n}"));
}

#[test]
fn test_edit_leaves_other_spans_intact() {
    let original = parse_located(FV_SOLUTION.as_bytes()).unwrap();
    let mut doc = ParsedDocument::parse(FV_SOLUTION.as_bytes().to_vec()).unwrap();
    let edited = KeywordPath::from(["solvers", "p", "tolerance"]);
    doc.put(&edited, &Value::from(1e-08)).unwrap();

    let before = FV_SOLUTION.as_bytes();
    for entry in original.iter().filter(|e| !edited.starts_with(&e.path)) {
        let now = doc.index().get_one(&entry.path).unwrap();
        assert_eq!(&doc.contents()[now.span()], &before[entry.span()], "{}", entry.path);
        assert_eq!(now.slot, entry.slot);
    }
    assert_eq!(doc.get(&edited), Some(Value::from(1e-08)));
}

#[test]
fn test_reserialize_is_idempotent() {
    let first = to_vec(&from_slice(FV_SOLUTION.as_bytes()).unwrap(), false).unwrap();
    let second = to_vec(&from_slice(&first).unwrap(), false).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_to_vec_synthesizes_header() {
    let mut file = FileDict::new();
    file.entries
        .insert("dimensions", Value::DimensionSet(DimensionSet::new([0.0, 1.0, -1.0, 0.0, 0.0, 0.0, 0.0])));
    file.entries.insert("internalField", Value::from(vec![0.0, 0.0, 0.0]));

    let bytes = to_vec(&file, true).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.starts_with("FoamFile\n{\n    version 2.0;\n    format ascii;\n    class volVectorField;\n}\n\n"));
    assert!(text.contains("dimensions [0 1 -1 0 0 0 0];\n"));
    assert!(text.contains("internalField uniform (0 0 0);\n"));
}

#[test]
fn test_scalar_class_keeps_short_list_nonuniform() {
    let mut header = Dict::new();
    header.insert("class", Value::from("volScalarField"));
    let mut file = FileDict::new();
    file.entries.insert("FoamFile", Value::Dict(header));
    file.entries.insert("internalField", Value::from(vec![1.0, 2.0, 3.0]));

    let text = String::from_utf8(to_vec(&file, false).unwrap()).unwrap();
    assert!(text.contains("internalField nonuniform List<scalar> 3(1 2 3);"));
}

#[test]
fn test_dimensioned_quantity() {
    let value = parse_data(b"nu [0 2 -1 0 0 0 0] 1.5e-05").unwrap();
    let expected = Dimensioned::new(
        1.5e-05,
        DimensionSet::new([0.0, 2.0, -1.0, 0.0, 0.0, 0.0, 0.0]),
        Some("nu".to_string()),
    );
    assert_eq!(value, Value::Dimensioned(expected));
    assert_eq!(value.to_string(), "nu [0 2 -1 0 0 0 0] 1.5e-5");
}

#[test]
fn test_list_with_keyword_entries() {
    let value = parse_data(b"(inlet { type patch; } outlet { type patch; })").unwrap();
    let items = value.as_list().unwrap();
    assert_eq!(items.len(), 2);
    match &items[0] {
        ListItem::Entry(entry) => {
            assert_eq!(entry.keyword, Value::from("inlet"));
            assert!(entry.value.is_dict());
        }
        other => panic!("expected keyword entry, got {other:?}"),
    }
}

#[test]
fn test_points_standalone_ascii_and_binary() {
    let points = Value::Array(NumericArray::vectors(&[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.5],
    ]));

    let ascii = serialize_standalone(&points, &FoamOptions::new()).unwrap();
    assert_eq!(parse_standalone(&ascii, Format::Ascii).unwrap(), points);

    let options = FoamOptions::new().with_format(Format::Binary);
    let binary = serialize_standalone(&points, &options).unwrap();
    let parsed = parse_standalone(&binary, Format::Binary).unwrap();
    assert!(parsed.nan_eq(&points));
}

#[test]
fn test_binary_labels_standalone() {
    let labels = Value::Array(NumericArray::labels(vec![0, 1, 2, 3]));
    let options = FoamOptions::new().with_format(Format::Binary);
    let bytes = serialize_standalone(&labels, &options).unwrap();
    assert_eq!(bytes.len(), "4(".len() + 4 * 4 + ")".len());
    let parsed = parse_standalone(&bytes, Format::Binary).unwrap();
    assert!(parsed.nan_eq(&labels));
}

#[test]
fn test_faces_file() {
    let input = b"FoamFile { class faceList; }\n2(4(0 1 5 4) 3(1 2 5))\n";
    let file = from_slice(input).unwrap();
    assert_eq!(
        file.standalone,
        Some(Value::Faces(vec![vec![0, 1, 5, 4], vec![1, 2, 5]]))
    );
}

#[test]
fn test_wrong_tensor_size_is_semantic() {
    let err = parse_data(b"uniform (1 2 3 4)").unwrap_err();
    assert!(matches!(err, Error::Semantic { .. }));
}

#[test]
fn test_syntax_error_reports_position() {
    let err = from_slice(b"a 1;\nb {\n  c 2;\n").unwrap_err();
    assert!(err.is_parse_error());
    assert!(err.offset().is_some());
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Simple {
    n_non_orthogonal_correctors: u32,
    consistent: bool,
    residual_control: std::collections::BTreeMap<String, f64>,
}

#[test]
fn test_from_value_into_struct() {
    let file = from_slice(FV_SOLUTION.as_bytes()).unwrap();
    let simple: Simple = from_value(file.get("SIMPLE").unwrap()).unwrap();
    assert_eq!(simple.n_non_orthogonal_correctors, 0);
    assert!(simple.consistent);
    assert_eq!(simple.residual_control.get("p"), Some(&1e-2));
    assert_eq!(simple.residual_control.get("\"(k|epsilon)\""), Some(&1e-3));
}
