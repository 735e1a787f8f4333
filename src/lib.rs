#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

#[doc(inline)]
pub use async_trait::async_trait;
#[doc(inline)]
pub use futures::future::BoxFuture;

mod ast;
pub mod executor;
pub mod parser;
pub mod schema;
mod types;
mod value;
// This needs to be public until docs have support for private modules:
// https://github.com/rust-lang/cargo/issues/1520
pub mod http;
pub mod integrations;

#[cfg(test)]
mod tests;


use std::sync::Arc;

use derive_more::with_trait::{Display, Error};

use crate::parser::parse_document_source;

pub use crate::{
    ast::{FromInputValue, InputValue, OperationType, Variables},
    executor::{
        Context, ExecutionError, ExecutionResult, Executor, FieldError, FieldResult, Request,
    },
    http::{GraphQLRequest, GraphQLResponse},
    parser::{Document, ParseError, SourcePosition},
    schema::{
        meta::{
            self, Argument, EnumMeta, EnumValue, Field, InputObjectMeta, InterfaceMeta, MetaType,
            ObjectMeta, Registry, Scalar, TypeId, TypeRef, UnionMeta,
        },
        model::{RootNode, SchemaBuilder, SchemaType},
        validation::SchemaError,
    },
    types::{async_await::GraphQLObject, base::Arguments},
    value::{Object, Value},
};

/// An error that prevented query execution
///
/// None of these ever end up in a [`GraphQLResponse`]: errors raised while
/// resolving fields are collected into the response instead.
#[derive(Clone, Debug, Display, Error, PartialEq)]
pub enum GraphQLError {
    /// The query document couldn't be parsed.
    #[display("{_0}")]
    ParseError(ParseError),

    /// The query document holds no query or mutation.
    #[display("Must provide an operation")]
    NoOperationProvided,

    /// No operation of the query document has the requested name.
    #[display("Unknown operation")]
    UnknownOperationName,

    /// A fragment of the query document spreads itself, directly or through
    /// other fragments.
    #[display("Cannot spread fragment \"{_0}\" within itself")]
    FragmentCycle(#[error(not(source))] String),

    /// The schema has no root object for operations of this kind.
    #[display("Schema is not configured for {_0}s")]
    NoRootType(#[error(not(source))] OperationType),

    /// The response couldn't be serialized.
    #[display("Failed to serialize response: {_0}")]
    Serialization(#[error(not(source))] String),
}

impl From<ParseError> for GraphQLError {
    fn from(err: ParseError) -> Self {
        Self::ParseError(err)
    }
}

/// Execute a query in a provided schema
///
/// The query document is parsed and the operation named `operation_name`,
/// or the first one if there is no name, is resolved against a freshly
/// constructed root object. The `request`, if any, is exposed to resolvers
/// through the execution [`Context`].
///
/// # Errors
///
/// If the document can't be parsed or holds no operation to execute. Errors
/// raised while resolving fields end up in the returned [`GraphQLResponse`]
/// instead, alongside the data resolved despite them.
pub async fn execute(
    document_source: &str,
    operation_name: Option<&str>,
    root_node: &RootNode,
    variables: &Variables,
    request: Option<Request>,
) -> Result<GraphQLResponse, GraphQLError> {
    let document = Arc::new(parse_document_source(document_source)?);

    executor::execute_validated_query_async(document, operation_name, root_node, variables, request)
        .await
}
