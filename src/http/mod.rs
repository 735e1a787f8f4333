//! Utilities for building HTTP endpoints in a library-agnostic manner

use serde::{
    Deserialize, Serialize,
    ser::{self, SerializeMap as _},
};

use crate::{
    GraphQLError, RootNode,
    ast::{InputValue, Variables},
    executor::{ExecutionError, FieldError, Request},
    value::Value,
};

/// The expected structure of the decoded JSON document for either POST or GET requests.
///
/// For POST, you can use Serde to deserialize the incoming JSON data directly
/// into this struct - it derives Deserialize for exactly this reason.
///
/// For GET, you will need to parse the query string and extract "query",
/// "operationName", and "variables" manually.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GraphQLRequest {
    /// GraphQL query representing this request.
    pub query: String,

    /// Optional name of the operation associated with this request.
    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,

    /// Optional variables to execute the GraphQL operation with.
    pub variables: Option<InputValue>,
}

impl GraphQLRequest {
    /// Construct a new GraphQL request from parts
    pub fn new(
        query: String,
        operation_name: Option<String>,
        variables: Option<InputValue>,
    ) -> Self {
        Self {
            query,
            operation_name,
            variables,
        }
    }

    /// Returns operation [`Variables`] defined withing this request.
    pub fn variables(&self) -> Variables {
        self.variables
            .as_ref()
            .and_then(|iv| {
                iv.to_object_value()
                    .map(|o| o.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            })
            .unwrap_or_default()
    }

    /// Execute a GraphQL request using the specified schema and request
    /// context
    ///
    /// This is a simple wrapper around the `execute` function exposed at the
    /// top level of this crate.
    ///
    /// # Errors
    ///
    /// If the query can't be parsed or holds no operation to execute.
    pub async fn execute(
        &self,
        root_node: &RootNode,
        request: Option<Request>,
    ) -> Result<GraphQLResponse, GraphQLError> {
        let op = self.operation_name.as_deref();
        let vars = &self.variables();
        crate::execute(&self.query, op, root_node, vars, request).await
    }
}

/// Simple wrapper around the result from executing a GraphQL query
///
/// This struct implements Serialize, so you can simply serialize this
/// to JSON and send it over the wire. Use the `is_ok` method to determine
/// whether resolution went through without any error.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphQLResponse {
    data: Value,
    errors: Vec<ExecutionError>,
}

impl GraphQLResponse {
    /// Constructs new `GraphQLResponse` from resolved `data` and the errors
    /// collected while resolving it
    pub fn from_result(data: Value, errors: Vec<ExecutionError>) -> Self {
        Self { data, errors }
    }

    /// Constructs an error response outside of the normal execution flow
    pub fn error(error: FieldError) -> Self {
        Self::from_result(Value::null(), vec![ExecutionError::at_origin(error)])
    }

    /// Was the request successful or not?
    ///
    /// Note that `data` may still hold partial results even though the
    /// response isn't OK. This is by design in GraphQL.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Resolved data, `null` where resolution failed.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Errors collected while resolving, in query order.
    pub fn errors(&self) -> &[ExecutionError] {
        &self.errors
    }

    /// Serializes this response to JSON, along with [`GraphQLResponse::is_ok()`].
    ///
    /// # Errors
    ///
    /// If `serde_json` fails to serialize the response.
    pub fn to_json(&self) -> serde_json::Result<(String, bool)> {
        serde_json::to_string(self).map(|json| (json, self.is_ok()))
    }
}

impl Serialize for GraphQLResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;

        map.serialize_key("errors")?;
        if self.errors.is_empty() {
            map.serialize_value(&())?;
        } else {
            map.serialize_value(&self.errors)?;
        }

        map.serialize_key("data")?;
        map.serialize_value(&self.data)?;

        map.end()
    }
}
