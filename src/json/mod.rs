pub use serde_json::Value;

pub mod errors;
pub mod scalar;
pub mod selector;

pub use errors::{NotScalarError, SelectionError};
pub use scalar::stringify;
pub use selector::{select, Selector};

/// Defines string representations of the serde JSON [`Value`] types
pub trait ValueType {
    fn value_type(&self) -> &'static str;
}

impl ValueType for Value {
    fn value_type(&self) -> &'static str {
        match self {
            Value::Object(_) => "Object",
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn value_type_names() {
        assert_eq!(json!({}).value_type(), "Object");
        assert_eq!(json!([]).value_type(), "Array");
        assert_eq!(json!(null).value_type(), "Null");
        assert_eq!(json!(1.5).value_type(), "Number");
        assert_eq!(json!("x").value_type(), "String");
        assert_eq!(json!(false).value_type(), "Bool");
    }
}
