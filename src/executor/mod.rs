//! Resolve the document to values

use std::{
    any::Any,
    cmp::Ordering,
    collections::{HashMap, HashSet},
    fmt::Display,
    panic::AssertUnwindSafe,
    sync::{Arc, PoisonError, RwLock},
};

use futures::{FutureExt as _, future::join_all};
use graphql_parser::query::{
    Definition, Directive, FragmentDefinition, OperationDefinition, Selection, SelectionSet,
    VariableDefinition,
};
use indexmap::IndexMap;

use crate::{
    GraphQLError,
    ast::{InputValue, OperationType, Variables},
    http::GraphQLResponse,
    parser::{Document, SourcePosition},
    schema::model::{RootNode, SchemaType},
    types::async_await::{GraphQLObject, resolve_selection_set_into_async},
    value::Value,
};

mod context;

pub use self::context::{Context, Request};

type Fragment = FragmentDefinition<'static, String>;

/// Query execution engine
///
/// The executor helps drive the query execution in a schema. It keeps track
/// of the current field stack, context, variables, and errors.
pub struct Executor<'a> {
    fragments: &'a HashMap<&'a str, &'a Fragment>,
    variables: &'a Variables,
    current_selection_set: Option<&'a [Selection<'static, String>]>,
    schema: &'a SchemaType,
    context: &'a Arc<Context>,
    errors: &'a RwLock<Vec<ExecutionError>>,
    field_path: Arc<FieldPath<'a>>,
}

#[derive(Clone, Debug)]
enum FieldPath<'a> {
    Root(SourcePosition),
    Field(&'a str, SourcePosition, Arc<FieldPath<'a>>),
}

/// Error type for errors that occur during query execution
///
/// All execution errors contain the source position in the query of the field
/// that failed to resolve. It also contains the field stack.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionError {
    location: SourcePosition,
    path: Vec<String>,
    error: FieldError,
}

impl Eq for ExecutionError {}

impl PartialOrd for ExecutionError {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ExecutionError {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.location, &self.path, &self.error.message).cmp(&(
            &other.location,
            &other.path,
            &other.error.message,
        ))
    }
}

/// Error type for errors that occur during field resolution
///
/// Field errors are represented by a human-readable error message and an
/// optional `Value` structure containing additional information.
///
/// They can be converted to from any type that implements `std::fmt::Display`,
/// which makes error chaining with the `?` operator a breeze:
///
/// ```rust
/// # use juniper_dynamic::FieldError;
/// fn get_string(data: Vec<u8>) -> Result<String, FieldError> {
///     let s = String::from_utf8(data)?;
///     Ok(s)
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FieldError {
    message: String,
    extensions: Value,
}

impl<T: Display> From<T> for FieldError {
    fn from(e: T) -> Self {
        Self {
            message: e.to_string(),
            extensions: Value::null(),
        }
    }
}

impl FieldError {
    /// Construct a new error with additional data
    ///
    /// The `extensions` parameter will be added to the `"extensions"` field of
    /// the error object in the JSON response:
    ///
    /// ```json
    /// {
    ///   "errors": [
    ///     "message": "Could not open connection to the database",
    ///     "locations": [{"line": 2, "column": 4}],
    ///     "extensions": {
    ///       "internal_error": "Connection refused"
    ///     }
    ///   ]
    /// }
    /// ```
    ///
    /// If the argument is `Value::null()`, no extra data will be included.
    pub fn new<T: Display>(e: T, extensions: Value) -> Self {
        Self {
            message: e.to_string(),
            extensions,
        }
    }

    /// Returns the `"message"` field of this [`FieldError`].
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the `"extensions"` field of this [`FieldError`].
    ///
    /// If there is no `"extensions"`, then [`Value::Null`] will be returned.
    pub fn extensions(&self) -> &Value {
        &self.extensions
    }
}

/// The result of resolving the value of a field of type `T`
pub type FieldResult<T> = Result<T, FieldError>;

/// The result of resolving an unspecified field
pub type ExecutionResult = Result<Value, FieldError>;

impl<'a> Executor<'a> {
    /// Resolve the current selection set on an arbitrary object value.
    ///
    /// # Errors
    ///
    /// If the value isn't of a registered object type, or the field being
    /// resolved has no sub-selection.
    pub async fn resolve(&self, value: &dyn GraphQLObject) -> ExecutionResult {
        let Some((type_id, meta)) = self.schema.concrete_type_by_name(value.type_name()) else {
            return Err(format!("Unknown object type \"{}\"", value.type_name()).into());
        };
        let Some(selection_set) = self.current_selection_set else {
            return Err(format!(
                "Field of type \"{}\" must have a selection of subfields",
                meta.name,
            )
            .into());
        };
        Ok(resolve_selection_set_into_async(value, type_id, meta, selection_set, self, false).await)
    }

    /// Resolve a single arbitrary value into a return value
    ///
    /// If the field fails to resolve, `null` will be returned.
    pub async fn resolve_into_value(&self, value: &dyn GraphQLObject) -> Value {
        match self.resolve(value).await {
            Ok(v) => v,
            Err(e) => {
                self.push_error(e);
                Value::null()
            }
        }
    }

    /// Resolve a list of object values, concurrently.
    ///
    /// An item failing to resolve becomes `null`, leaving the others intact.
    pub async fn resolve_list<T: GraphQLObject>(&self, items: &[T]) -> ExecutionResult {
        let values = join_all(items.iter().map(|item| self.resolve_into_value(item))).await;
        Ok(Value::list(values))
    }

    #[doc(hidden)]
    pub fn field_sub_executor(
        &self,
        field_alias: &'a str,
        location: SourcePosition,
        selection_set: Option<&'a [Selection<'static, String>]>,
    ) -> Executor<'a> {
        Executor {
            fragments: self.fragments,
            variables: self.variables,
            current_selection_set: selection_set,
            schema: self.schema,
            context: self.context,
            errors: self.errors,
            field_path: Arc::new(FieldPath::Field(
                field_alias,
                location,
                Arc::clone(&self.field_path),
            )),
        }
    }

    /// Access the current context
    ///
    /// The same value is bound as [`Context::current()`] while the operation
    /// is resolved.
    pub fn context(&self) -> &'a Context {
        self.context
    }

    /// The currently executing schema
    pub fn schema(&self) -> &'a SchemaType {
        self.schema
    }

    /// Variables of the executing operation, including their default values.
    pub fn variables(&self) -> &'a Variables {
        self.variables
    }

    #[doc(hidden)]
    pub fn fragment_by_name(&self, name: &str) -> Option<&'a Fragment> {
        self.fragments.get(name).copied()
    }

    /// The current location of the executor
    pub fn location(&self) -> &SourcePosition {
        self.field_path.location()
    }

    /// Add an error to the execution engine at the current executor location
    pub fn push_error(&self, error: FieldError) {
        let location = *self.location();
        self.push_error_at(error, location);
    }

    /// Add an error to the execution engine at a specific location
    pub fn push_error_at(&self, error: FieldError, location: SourcePosition) {
        let mut path = Vec::new();
        self.field_path.construct_path(&mut path);

        tracing::debug!(
            error = error.message(),
            path = ?path,
            "field resolution failed"
        );

        let mut errors = self.errors.write().unwrap_or_else(PoisonError::into_inner);

        errors.push(ExecutionError {
            location,
            path,
            error,
        });
    }
}

impl FieldPath<'_> {
    fn construct_path(&self, acc: &mut Vec<String>) {
        match self {
            FieldPath::Root(_) => (),
            FieldPath::Field(name, _, parent) => {
                parent.construct_path(acc);
                acc.push((*name).to_owned());
            }
        }
    }

    fn location(&self) -> &SourcePosition {
        match self {
            FieldPath::Root(pos) | FieldPath::Field(_, pos, _) => pos,
        }
    }
}

impl ExecutionError {
    #[doc(hidden)]
    pub fn new(location: SourcePosition, path: &[&str], error: FieldError) -> Self {
        Self {
            location,
            path: path.iter().map(|s| (*s).to_owned()).collect(),
            error,
        }
    }

    /// Construct a new execution error occuring at the beginning of the query
    pub fn at_origin(error: FieldError) -> Self {
        Self {
            location: SourcePosition::new_origin(),
            path: Vec::new(),
            error,
        }
    }

    /// The error message
    pub fn error(&self) -> &FieldError {
        &self.error
    }

    /// The source location _in the query_ of the field that failed to resolve
    pub fn location(&self) -> &SourcePosition {
        &self.location
    }

    /// The path of fields leading to the field that generated this error
    pub fn path(&self) -> &[String] {
        &self.path
    }
}

/// An executable operation of a query document.
#[derive(Clone, Copy, Debug)]
pub struct Operation<'a> {
    /// Name of the operation, absent for anonymous ones.
    pub name: Option<&'a str>,
    /// Kind of the operation.
    pub operation_type: OperationType,
    /// Where the operation starts in the query.
    pub position: SourcePosition,
    /// Variables declared by the operation.
    pub variable_definitions: &'a [VariableDefinition<'static, String>],
    /// Directives of the operation.
    pub directives: &'a [Directive<'static, String>],
    /// Root selection set of the operation.
    pub selection_set: &'a SelectionSet<'static, String>,
}

impl<'a> Operation<'a> {
    /// Views a definition as an executable operation.
    ///
    /// Subscriptions aren't executable.
    fn from_definition(op: &'a OperationDefinition<'static, String>) -> Option<Self> {
        Some(match op {
            OperationDefinition::SelectionSet(set) => Self {
                name: None,
                operation_type: OperationType::Query,
                position: set.span.0.into(),
                variable_definitions: &[],
                directives: &[],
                selection_set: set,
            },
            OperationDefinition::Query(q) => Self {
                name: q.name.as_deref(),
                operation_type: OperationType::Query,
                position: q.position.into(),
                variable_definitions: &q.variable_definitions,
                directives: &q.directives,
                selection_set: &q.selection_set,
            },
            OperationDefinition::Mutation(m) => Self {
                name: m.name.as_deref(),
                operation_type: OperationType::Mutation,
                position: m.position.into(),
                variable_definitions: &m.variable_definitions,
                directives: &m.directives,
                selection_set: &m.selection_set,
            },
            OperationDefinition::Subscription(_) => return None,
        })
    }
}

/// Picks the operation of `document` to execute.
///
/// Without an `operation_name`, the first query or mutation of the document
/// is picked and the following ones are never executed. Otherwise the
/// operation of that name is picked.
///
/// # Errors
///
/// - [`GraphQLError::NoOperationProvided`] if the document holds no query or
///   mutation;
/// - [`GraphQLError::UnknownOperationName`] if no operation has the given
///   `operation_name`.
pub fn get_operation<'a>(
    document: &'a Document,
    operation_name: Option<&str>,
) -> Result<Operation<'a>, GraphQLError> {
    let mut operations = document
        .definitions
        .iter()
        .filter_map(|def| match def {
            Definition::Operation(op) => Operation::from_definition(op),
            Definition::Fragment(_) => None,
        })
        .peekable();

    if operations.peek().is_none() {
        return Err(GraphQLError::NoOperationProvided);
    }

    match operation_name {
        None => operations.next(),
        Some(name) => operations.find(|op| op.name == Some(name)),
    }
    .ok_or(GraphQLError::UnknownOperationName)
}

/// Executes an operation of a parsed `document` on the given `root_node`.
///
/// Resolution errors, including panics of resolvers, end up in the returned
/// response rather than failing the whole execution.
pub async fn execute_validated_query_async(
    document: Arc<Document>,
    operation_name: Option<&str>,
    root_node: &RootNode,
    variables: &Variables,
    request: Option<Request>,
) -> Result<GraphQLResponse, GraphQLError> {
    let op = get_operation(&document, operation_name)?;
    check_fragment_cycles(&document)?;

    tracing::debug!(
        operation = op.name.unwrap_or("<anonymous>"),
        kind = %op.operation_type,
        "operation selected"
    );

    let schema = root_node.schema();
    let (root_id, root_meta) = schema
        .root_type(op.operation_type)
        .ok_or(GraphQLError::NoRootType(op.operation_type))?;
    let constructor = root_meta
        .constructor
        .as_ref()
        .ok_or(GraphQLError::NoRootType(op.operation_type))?;
    let root = constructor();

    let mut all_vars = variables.clone();
    for def in op.variable_definitions {
        if let Some(default) = &def.default_value {
            all_vars
                .entry(def.name.clone())
                .or_insert_with(|| InputValue::from_query_value(default, variables));
        }
    }

    let fragments = document
        .definitions
        .iter()
        .filter_map(|def| match def {
            Definition::Fragment(f) => Some((f.name.as_str(), f)),
            Definition::Operation(_) => None,
        })
        .collect::<HashMap<_, _>>();

    let context = Arc::new(Context::new(
        Arc::clone(schema),
        Arc::clone(&document),
        request,
        all_vars,
    ));
    let errors = RwLock::new(Vec::new());

    let value = {
        let executor = Executor {
            fragments: &fragments,
            variables: context.variables(),
            current_selection_set: Some(&op.selection_set.items),
            schema,
            context: &context,
            errors: &errors,
            field_path: Arc::new(FieldPath::Root(op.position)),
        };

        let resolution = resolve_selection_set_into_async(
            &*root,
            root_id,
            root_meta,
            &op.selection_set.items,
            &executor,
            op.operation_type == OperationType::Mutation,
        );

        match Arc::clone(&context)
            .scope(AssertUnwindSafe(resolution).catch_unwind())
            .await
        {
            Ok(value) => value,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(panic = %message, "operation resolution panicked");
                errors
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(ExecutionError::at_origin(FieldError::from(message)));
                Value::null()
            }
        }
    };

    let mut errors = errors.into_inner().unwrap_or_else(PoisonError::into_inner);
    errors.sort();

    Ok(GraphQLResponse::from_result(value, errors))
}

/// Ensures no fragment of `document` spreads itself, directly or through
/// other fragments, so that expanding fragments always terminates.
fn check_fragment_cycles(document: &Document) -> Result<(), GraphQLError> {
    let spreads = document
        .definitions
        .iter()
        .filter_map(|def| match def {
            Definition::Fragment(f) => {
                let mut names = Vec::new();
                collect_spreads(&f.selection_set.items, &mut names);
                Some((f.name.as_str(), names))
            }
            Definition::Operation(_) => None,
        })
        .collect::<IndexMap<_, _>>();

    let mut detector = CycleDetector {
        visited: HashSet::new(),
        spreads: &spreads,
        path: Vec::new(),
    };
    for name in spreads.keys() {
        if !detector.visited.contains(name) {
            detector.detect_from(*name)?;
        }
    }
    Ok(())
}

fn collect_spreads<'a>(
    selection_set: &'a [Selection<'static, String>],
    acc: &mut Vec<&'a str>,
) {
    for selection in selection_set {
        match selection {
            Selection::Field(f) => collect_spreads(&f.selection_set.items, acc),
            Selection::FragmentSpread(spread) => acc.push(&spread.fragment_name),
            Selection::InlineFragment(fragment) => {
                collect_spreads(&fragment.selection_set.items, acc);
            }
        }
    }
}

struct CycleDetector<'a> {
    visited: HashSet<&'a str>,
    spreads: &'a IndexMap<&'a str, Vec<&'a str>>,
    path: Vec<&'a str>,
}

impl<'a> CycleDetector<'a> {
    fn detect_from(&mut self, from: &'a str) -> Result<(), GraphQLError> {
        self.visited.insert(from);

        let spreads = self.spreads;
        let Some(spreads) = spreads.get(from) else {
            return Ok(());
        };

        self.path.push(from);
        for &name in spreads {
            if self.path.contains(&name) {
                return Err(GraphQLError::FragmentCycle(name.to_owned()));
            }
            if !self.visited.contains(name) {
                self.detect_from(name)?;
            }
        }
        self.path.pop();

        Ok(())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "Resolver panicked".to_owned())
}
