use std::{any::Any, fmt, future::Future, sync::Arc};

use graphql_parser::query::{Definition, OperationDefinition};

use crate::{ast::Variables, parser::Document, schema::model::SchemaType};

/// Opaque, caller-provided value describing the request being executed.
///
/// Typically an HTTP request or the authenticated user; resolvers get it back
/// with [`Context::request()`].
pub type Request = Arc<dyn Any + Send + Sync>;

tokio::task_local! {
    static CURRENT: Arc<Context>;
}

/// Per-execution context
///
/// Created right before a single operation is resolved and dropped once it
/// is, never shared between executions and never mutated.
///
/// Resolvers receive it explicitly through [`Executor::context()`], and may
/// also reach it from anywhere in the task resolving the operation with
/// [`Context::current()`].
///
/// [`Executor::context()`]: crate::Executor::context
pub struct Context {
    schema: Arc<SchemaType>,
    document: Arc<Document>,
    request: Option<Request>,
    variables: Variables,
}

impl Context {
    pub(crate) fn new(
        schema: Arc<SchemaType>,
        document: Arc<Document>,
        request: Option<Request>,
        variables: Variables,
    ) -> Self {
        Self {
            schema,
            document,
            request,
            variables,
        }
    }

    /// The schema the operation executes against.
    pub fn schema(&self) -> &SchemaType {
        &self.schema
    }

    /// The whole parsed query document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The operation definitions of the query document.
    pub fn operations(&self) -> impl Iterator<Item = &OperationDefinition<'static, String>> {
        self.document.definitions.iter().filter_map(|d| match d {
            Definition::Operation(op) => Some(op),
            Definition::Fragment(_) => None,
        })
    }

    /// The caller-provided request, if any.
    pub fn request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    /// The caller-provided request, if it is of type `T`.
    pub fn request_as<T: Any>(&self) -> Option<&T> {
        self.request.as_deref().and_then(|r| r.downcast_ref())
    }

    /// Variables of the operation, including their default values.
    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// The context of the operation being resolved by the current task, if
    /// any.
    pub fn current() -> Option<Arc<Self>> {
        CURRENT.try_with(Arc::clone).ok()
    }

    /// Calls `f` with the context of the operation being resolved by the
    /// current task, if any.
    pub fn with_current<R>(f: impl FnOnce(Option<&Self>) -> R) -> R {
        f(Self::current().as_deref())
    }

    /// Makes this context the current one while `fut` runs.
    ///
    /// The previous binding, if any, is restored once `fut` completes, fails
    /// or unwinds.
    pub(crate) async fn scope<F: Future>(self: Arc<Self>, fut: F) -> F::Output {
        CURRENT.scope(self, fut).await
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("document", &self.document)
            .field("request", &self.request.as_ref().map(|_| "<request>"))
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}
