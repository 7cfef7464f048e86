/// Builds a [`Value`](crate::Value) with dictionary-like syntax.
///
/// - `foam!(;)` is an empty entry
/// - `foam!([a, b, c])` is a list
/// - `foam!({ "key": value, ... })` is a dictionary
/// - anything else goes through `Value::from`
///
/// # Examples
///
/// ```rust
/// use foamdict::{foam, Value};
///
/// let solver = foam!({
///     "solver": "PCG",
///     "preconditioner": "DIC",
///     "tolerance": 1e-06,
///     "relTol": 0.05,
/// });
/// assert_eq!(solver.as_dict().map(|d| d.len()), Some(4));
///
/// let inlet = foam!({ "type": "fixedValue", "value": [1.0, 0.0, 0.0] });
/// assert!(inlet.as_dict().unwrap().get("value").unwrap().as_list().is_some());
/// ```
#[macro_export]
macro_rules! foam {
    (;) => {
        $crate::Value::Empty
    };

    ([]) => {
        $crate::Value::List(::std::vec::Vec::new())
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::List(::std::vec![$($crate::ListItem::Value($crate::foam!($elem))),*])
    };

    ({}) => {
        $crate::Value::Dict($crate::Dict::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut dict = $crate::Dict::new();
        $(
            dict.insert($key, $crate::foam!($value));
        )*
        $crate::Value::Dict(dict)
    }};

    ($other:expr) => {
        $crate::Value::from($other)
    };
}
