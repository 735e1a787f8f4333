//! Smallest possible schema: a single `hello` field on the query root.

use crate::{
    Arguments, ExecutionResult, Executor, GraphQLObject, async_trait,
    schema::{
        meta::{Field, ObjectMeta, Registry, Scalar},
        model::RootNode,
    },
};

#[derive(Default)]
pub struct RootQuery;

#[async_trait]
impl GraphQLObject for RootQuery {
    fn type_name(&self) -> &str {
        "RootQuery"
    }

    async fn resolve_field(
        &self,
        field_name: &str,
        _: &Arguments,
        _: &Executor<'_>,
    ) -> ExecutionResult {
        match field_name {
            "hello" => Ok("world".into()),
            _ => Err(format!("Field \"{field_name}\" is not implemented").into()),
        }
    }
}

pub fn schema() -> RootNode {
    let mut registry = Registry::new();
    let query = registry.register(
        ObjectMeta::new("RootQuery", &[Field::new("hello", Scalar::String)])
            .constructor(RootQuery::default),
    );

    RootNode::build(registry)
        .query(query)
        .finish()
        .expect("hello schema is valid")
}
