use graphql_parser::query::Directive;
use indexmap::IndexMap;

use crate::{
    ast::{FromInputValue, InputValue, Variables},
    executor::FieldError,
    schema::meta::Argument,
    value::{Object, Value},
};

/// Field argument container
///
/// Holds the arguments of a single field invocation, with variables already
/// substituted and default values filled in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    args: IndexMap<String, InputValue>,
}

impl Arguments {
    /// Matches the `provided` arguments against the declared `meta_args`.
    ///
    /// Missing or `null` arguments take their declared default value. Absent
    /// that, they are `null`.
    ///
    /// # Errors
    ///
    /// If an argument is not declared, or a non-null argument ends up `null`.
    pub fn new(
        mut args: IndexMap<String, InputValue>,
        meta_args: &[Argument],
    ) -> Result<Self, FieldError> {
        if let Some(unknown) = args
            .keys()
            .find(|k| !meta_args.iter().any(|a| a.name == k.as_str()))
        {
            return Err(format!("Unknown argument \"{unknown}\"").into());
        }

        for arg in meta_args {
            if args.get(arg.name.as_str()).is_none_or(InputValue::is_null) {
                let value = arg.default_value.clone().unwrap_or_else(InputValue::null);
                if value.is_null() && !arg.arg_type.is_nullable() {
                    return Err(format!("Missing required argument \"{}\"", arg.name).into());
                }
                args.insert(arg.name.to_string(), value);
            }
        }

        Ok(Self { args })
    }

    /// Get and convert an argument into the desired type.
    ///
    /// If the argument is found, or a default argument has been provided,
    /// the [`InputValue`] will be converted into the type `T`.
    ///
    /// Returns [`Some`] if the argument is present _and_ type conversion
    /// succeeds.
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: FromInputValue,
    {
        self.args.get(key).and_then(InputValue::convert)
    }

    /// Access the raw value of an argument.
    pub fn get_input_value(&self, key: &str) -> Option<&InputValue> {
        self.args.get(key)
    }

    /// Iterates over all arguments, in the order they were provided.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InputValue)> {
        self.args.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Whether a selection is dropped by its `@skip` or `@include` directive.
///
/// A directive whose `if` condition can't be read as a boolean is ignored.
pub(crate) fn is_excluded(directives: &[Directive<'static, String>], vars: &Variables) -> bool {
    directives.iter().any(|directive| {
        let condition = directive
            .arguments
            .iter()
            .find(|(name, _)| name == "if")
            .and_then(|(_, v)| InputValue::from_query_value(v, vars).convert::<bool>());

        match (directive.name.as_str(), condition) {
            ("skip", Some(condition)) => condition,
            ("include", Some(condition)) => !condition,
            _ => false,
        }
    })
}

/// Stores `value` under `response_name`, merging it into an already resolved
/// value of the same name.
pub(crate) fn merge_key_into(result: &mut Object, response_name: &str, value: Value) {
    if let Some(existing) = result.get_mut_field_value(response_name) {
        match existing {
            Value::Object(dest_obj) => {
                if let Value::Object(src_obj) = value {
                    merge_maps(dest_obj, src_obj);
                }
            }
            Value::List(dest_list) => {
                if let Value::List(src_list) = value {
                    for (d, s) in dest_list.iter_mut().zip(src_list) {
                        if let (Value::Object(d_obj), Value::Object(s_obj)) = (d, s) {
                            merge_maps(d_obj, s_obj);
                        }
                    }
                }
            }
            _ => {}
        }
        return;
    }
    result.add_field(response_name, value);
}

fn merge_maps(dest: &mut Object, src: Object) {
    for (key, value) in src {
        if dest.contains_field(&key) {
            merge_key_into(dest, &key, value);
        } else {
            dest.add_field(key, value);
        }
    }
}
