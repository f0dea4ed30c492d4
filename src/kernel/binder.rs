//! Argument binding: raw flag/prompt values → typed, defaulted arguments.

use std::collections::HashMap;

use super::error::DispatchError;
use crate::tools::{BoundArguments, ParamSchema, ParamType, ToolDescriptor, Value};

/// Raw arguments for one request. A present key mapped to `None` is the
/// explicit "unset" marker and behaves like an absent key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawArguments {
    values: HashMap<String, Option<Value>>,
}

impl RawArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Option<Value>) {
        self.values.insert(name.into(), value);
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.set(name, Some(value.into()));
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// The value for `name`, unless absent or unset.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).and_then(Option::as_ref)
    }

    pub fn is_empty(&self) -> bool {
        self.values.values().all(Option::is_none)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RawArguments {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut raw = Self::new();
        for (k, v) in iter {
            raw.insert(k, v);
        }
        raw
    }
}

/// Bind every declared parameter of `descriptor`, in declared order.
/// Raw values for names the tool does not declare are ignored.
pub fn bind(descriptor: &ToolDescriptor, raw: &RawArguments) -> Result<BoundArguments, DispatchError> {
    let mut bound = BoundArguments::new();
    for param in &descriptor.parameters {
        let value = bind_one(&descriptor.id, param, raw.get(&param.name))?;
        bound.insert(param.name.clone(), value);
    }
    Ok(bound)
}

/// Bind one parameter: coerce a supplied value, else use the default, else fail.
pub fn bind_one(task: &str, param: &ParamSchema, raw: Option<&Value>) -> Result<Value, DispatchError> {
    match (raw, &param.default) {
        (Some(value), _) => coerce(task, param, value),
        (None, Some(default)) => Ok(default.clone()),
        (None, None) => Err(DispatchError::MissingArgument {
            task: task.to_string(),
            param: param.name.clone(),
        }),
    }
}

/// Coerce `value` to the parameter's declared type. Values already of that
/// type are returned unchanged.
pub fn coerce(task: &str, param: &ParamSchema, value: &Value) -> Result<Value, DispatchError> {
    let invalid = || DispatchError::InvalidArgument {
        task: task.to_string(),
        param: param.name.clone(),
        expected: param.param_type,
        value: value.to_string(),
    };

    match (param.param_type, value) {
        (ParamType::String, Value::String(_))
        | (ParamType::Integer, Value::Int(_))
        | (ParamType::Float, Value::Float(_))
        | (ParamType::Boolean, Value::Bool(_)) => Ok(value.clone()),

        (ParamType::String, other) => Ok(Value::String(other.to_string())),

        (ParamType::Boolean, other) => Ok(Value::Bool(is_truthy(&other.to_string()))),

        (ParamType::Integer, Value::String(s)) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| invalid()),
        (ParamType::Integer, Value::Float(x)) if x.fract() == 0.0 && x.abs() < i64::MAX as f64 => {
            Ok(Value::Int(*x as i64))
        }
        (ParamType::Integer, _) => Err(invalid()),

        (ParamType::Float, Value::Int(i)) => Ok(Value::Float(*i as f64)),
        (ParamType::Float, Value::String(s)) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| invalid()),
        (ParamType::Float, _) => Err(invalid()),
    }
}

/// `yes`, `y`, `true` and `1` (any case) are true; anything else is false.
pub fn is_truthy(text: &str) -> bool {
    matches!(text.trim().to_ascii_lowercase().as_str(), "yes" | "y" | "true" | "1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Tool, ToolContext, ToolError, ToolOutput, ToolRegistry};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Schema(Vec<ParamSchema>);

    #[async_trait]
    impl Tool for Schema {
        fn name(&self) -> &str {
            "schema_tool"
        }

        fn parameters(&self) -> Vec<ParamSchema> {
            self.0.clone()
        }

        async fn execute(&self, _args: BoundArguments, _ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::new("ok"))
        }
    }

    fn descriptor(params: Vec<ParamSchema>) -> ToolDescriptor {
        let registry = ToolRegistry::new().with_tool(Arc::new(Schema(params))).unwrap();
        registry.lookup("schema-tool").unwrap().clone()
    }

    fn password_like() -> ToolDescriptor {
        descriptor(vec![
            ParamSchema::optional("length", ParamType::Integer, 12_i64, "Length"),
            ParamSchema::optional("specials", ParamType::Boolean, false, "Specials"),
        ])
    }

    #[test]
    fn test_boolean_coercion_table() {
        for text in ["y", "Y", "yes", "YES", "true", "True", "1", " y "] {
            assert!(is_truthy(text), "{text:?} should be true");
        }
        for text in ["n", "", "no", "false", "0", "maybe", "yess"] {
            assert!(!is_truthy(text), "{text:?} should be false");
        }
    }

    #[test]
    fn test_defaults_fill_unset_parameters() {
        let bound = bind(&password_like(), &RawArguments::new()).unwrap();
        assert_eq!(bound.get("length"), Some(&Value::Int(12)));
        assert_eq!(bound.get("specials"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_string_values_are_coerced() {
        let raw = RawArguments::new().with("length", "20").with("specials", "y");
        let bound = bind(&password_like(), &raw).unwrap();
        assert_eq!(bound.get("length"), Some(&Value::Int(20)));
        assert_eq!(bound.get("specials"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_unset_marker_behaves_like_absent() {
        let mut raw = RawArguments::new();
        raw.set("length", None);
        assert!(raw.is_empty());
        let bound = bind(&password_like(), &raw).unwrap();
        assert_eq!(bound.get("length"), Some(&Value::Int(12)));
    }

    #[test]
    fn test_missing_required_parameter() {
        let desc = descriptor(vec![
            ParamSchema::required("url", ParamType::String, "URL"),
            ParamSchema::optional("output", ParamType::String, "downloaded_page.html", "File"),
        ]);
        let err = bind(&desc, &RawArguments::new()).unwrap_err();
        match err {
            DispatchError::MissingArgument { task, param } => {
                assert_eq!(task, "schema-tool");
                assert_eq!(param, "url");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_integer() {
        let raw = RawArguments::new().with("length", "twelve");
        let err = bind(&password_like(), &raw).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InvalidArgument { ref param, expected: ParamType::Integer, .. } if param == "length"
        ));
    }

    #[test]
    fn test_well_typed_values_bind_unchanged() {
        let desc = descriptor(vec![
            ParamSchema::required("name", ParamType::String, ""),
            ParamSchema::required("count", ParamType::Integer, ""),
            ParamSchema::required("ratio", ParamType::Float, ""),
            ParamSchema::required("force", ParamType::Boolean, ""),
        ]);
        let raw = RawArguments::new()
            .with("name", " spaced ")
            .with("count", 7_i64)
            .with("ratio", 0.25)
            .with("force", true);

        let bound = bind(&desc, &raw).unwrap();
        assert_eq!(bound.get("name"), Some(&Value::from(" spaced ")));
        assert_eq!(bound.get("count"), Some(&Value::Int(7)));
        assert_eq!(bound.get("ratio"), Some(&Value::Float(0.25)));
        assert_eq!(bound.get("force"), Some(&Value::Bool(true)));

        // Binding the bound result again changes nothing
        let again: RawArguments = bound.iter().map(|(n, v)| (n.to_string(), v.clone())).collect();
        assert_eq!(bind(&desc, &again).unwrap(), bound);
    }

    #[test]
    fn test_cross_type_coercions() {
        let int = ParamSchema::required("n", ParamType::Integer, "");
        let float = ParamSchema::required("x", ParamType::Float, "");
        let text = ParamSchema::required("s", ParamType::String, "");
        let flag = ParamSchema::required("b", ParamType::Boolean, "");

        assert_eq!(coerce("t", &int, &Value::Float(3.0)).unwrap(), Value::Int(3));
        assert!(coerce("t", &int, &Value::Float(3.5)).is_err());
        assert!(coerce("t", &int, &Value::Bool(true)).is_err());
        assert_eq!(coerce("t", &float, &Value::Int(2)).unwrap(), Value::Float(2.0));
        assert_eq!(coerce("t", &float, &Value::from(" 1.5 ")).unwrap(), Value::Float(1.5));
        assert!(coerce("t", &float, &Value::from("abc")).is_err());
        assert_eq!(coerce("t", &text, &Value::Int(5)).unwrap(), Value::from("5"));
        assert_eq!(coerce("t", &flag, &Value::Int(1)).unwrap(), Value::Bool(true));
        assert_eq!(coerce("t", &flag, &Value::Int(0)).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_undeclared_arguments_are_ignored() {
        let raw = RawArguments::new().with("coin", "ethereum").with("url", "https://example.com");
        let bound = bind(&password_like(), &raw).unwrap();
        assert_eq!(bound.len(), 2);
        assert!(bound.get("coin").is_none());
    }
}
