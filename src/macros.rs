/// Builds a [`Value`](crate::Value) tree from a JSON-ish literal.
///
/// Arrays and objects become fresh compound nodes; `undefined` and `hole`
/// are available alongside the JSON literals. For shared or cyclic
/// structure, build nodes with the `Value` constructors and clone the
/// handles instead.
///
/// # Examples
///
/// ```rust
/// use revalue::value;
///
/// let data = value!({
///     "name": "Alice",
///     "age": 30,
///     "tags": ["admin", "user"],
///     "nickname": null
/// });
///
/// let object = data.as_object().unwrap();
/// assert_eq!(object.get("name").and_then(|v| v.as_str().map(String::from)), Some("Alice".into()));
/// ```
#[macro_export]
macro_rules! value {
    (null) => {
        $crate::Value::Null
    };

    (undefined) => {
        $crate::Value::Undefined
    };

    (hole) => {
        $crate::Value::Hole
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::array(vec![$($crate::value!($elem)),*])
    };

    ({}) => {
        $crate::Value::object($crate::ValueMap::new())
    };

    ({ $($key:literal : $val:tt),* $(,)? }) => {{
        let mut object = $crate::ValueMap::new();
        $(
            object.insert($key.to_string(), $crate::value!($val));
        )*
        $crate::Value::object(object)
    }};

    // Fallback: anything `Value: From` accepts.
    ($other:expr) => {
        $crate::Value::from($other)
    };
}
