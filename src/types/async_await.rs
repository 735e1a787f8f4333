use async_trait::async_trait;
use futures::{
    future::{self, BoxFuture},
    stream::{FuturesOrdered, StreamExt as _},
};
use graphql_parser::query::{Selection, TypeCondition};

use crate::{
    ast::InputValue,
    executor::{ExecutionResult, Executor, FieldError},
    parser::SourcePosition,
    schema::meta::{ObjectMeta, TypeId},
    value::{Object, Value},
};

use super::base::{Arguments, is_excluded, merge_key_into};

/**
Object-resolution protocol of the execution engine.

Any value exposed as an object type of a schema implements this trait. The
engine walks the selection set of the object and asks it for the value of each
selected field; everything else (aliases, fragments, directives, `__typename`)
is taken care of by the engine.

Fields of an object type resolve their value through the provided
[`Executor`], which carries on with the sub-selection of the field:

```rust
use juniper_dynamic::{Arguments, ExecutionResult, Executor, GraphQLObject, async_trait};

struct Droid {
    name: String,
    friends: Vec<Droid>,
}

#[async_trait]
impl GraphQLObject for Droid {
    fn type_name(&self) -> &str {
        "Droid"
    }

    async fn resolve_field(
        &self,
        field_name: &str,
        _: &Arguments,
        executor: &Executor<'_>,
    ) -> ExecutionResult {
        match field_name {
            "name" => Ok(self.name.as_str().into()),
            "friends" => executor.resolve_list(&self.friends).await,
            _ => Err(format!("Field \"{field_name}\" is not implemented").into()),
        }
    }
}
```
*/
#[async_trait]
pub trait GraphQLObject: Send + Sync {
    /// Name of the registered object type this value is an instance of.
    fn type_name(&self) -> &str;

    /// Resolves the value of a single field.
    ///
    /// The `executor` is positioned at the field: its selection set is the
    /// sub-selection of the field, and errors pushed to it are reported at
    /// the field location.
    async fn resolve_field(
        &self,
        field_name: &str,
        arguments: &Arguments,
        executor: &Executor<'_>,
    ) -> ExecutionResult;
}

#[async_trait]
impl<T> GraphQLObject for Box<T>
where
    T: GraphQLObject + ?Sized,
{
    fn type_name(&self) -> &str {
        (**self).type_name()
    }

    async fn resolve_field(
        &self,
        field_name: &str,
        arguments: &Arguments,
        executor: &Executor<'_>,
    ) -> ExecutionResult {
        (**self).resolve_field(field_name, arguments, executor).await
    }
}

enum AsyncValue {
    Field(AsyncField),
    Nested(Value),
}

struct AsyncField {
    name: String,
    value: Value,
}

/// A field whose value is known without calling its resolver.
fn resolved<'a>(name: &str, value: Value) -> BoxFuture<'a, AsyncValue> {
    Box::pin(future::ready(AsyncValue::Field(AsyncField {
        name: name.to_owned(),
        value,
    })))
}

/// Resolves the `selection_set` of an `instance` of the object type `meta`.
///
/// Fields are resolved concurrently, unless `serial` is set, in which case
/// each field is resolved to completion before the next one starts.
pub(crate) fn resolve_selection_set_into_async<'a>(
    instance: &'a dyn GraphQLObject,
    type_id: TypeId,
    meta: &'a ObjectMeta,
    selection_set: &'a [Selection<'static, String>],
    executor: &'a Executor<'a>,
    serial: bool,
) -> BoxFuture<'a, Value> {
    Box::pin(resolve_selection_set_into_async_recursive(
        instance,
        type_id,
        meta,
        selection_set,
        executor,
        serial,
    ))
}

async fn resolve_selection_set_into_async_recursive<'a>(
    instance: &'a dyn GraphQLObject,
    type_id: TypeId,
    meta: &'a ObjectMeta,
    selection_set: &'a [Selection<'static, String>],
    executor: &'a Executor<'a>,
    serial: bool,
) -> Value {
    let mut object = Object::with_capacity(selection_set.len());

    let mut pending = Vec::<BoxFuture<'a, AsyncValue>>::new();

    for selection in selection_set {
        match selection {
            Selection::Field(f) => {
                if is_excluded(&f.directives, executor.variables()) {
                    continue;
                }

                let response_name = f.alias.as_deref().unwrap_or(&f.name);

                if f.name == "__typename" {
                    pending.push(resolved(response_name, Value::scalar(&*meta.name)));
                    continue;
                }

                let pos = SourcePosition::from(f.position);
                let sub_exec = executor.field_sub_executor(
                    response_name,
                    pos,
                    Some(&f.selection_set.items[..]).filter(|s| !s.is_empty()),
                );

                let Some(meta_field) = meta.field_by_name(&f.name) else {
                    sub_exec.push_error(FieldError::from(format!(
                        "Unknown field \"{}\" on type \"{}\"",
                        f.name, meta.name,
                    )));
                    pending.push(resolved(response_name, Value::null()));
                    continue;
                };

                let args = Arguments::new(
                    f.arguments
                        .iter()
                        .map(|(k, v)| {
                            (k.clone(), InputValue::from_query_value(v, executor.variables()))
                        })
                        .collect(),
                    &meta_field.arguments,
                );
                let args = match args {
                    Ok(args) => args,
                    Err(e) => {
                        sub_exec.push_error(e);
                        pending.push(resolved(response_name, Value::null()));
                        continue;
                    }
                };

                let is_non_null = !meta_field.field_type.is_nullable();
                let response_name = response_name.to_owned();
                let field_name = f.name.as_str();
                let field_future = async move {
                    let res = instance.resolve_field(field_name, &args, &sub_exec).await;

                    let value = match res {
                        Ok(Value::Null) if is_non_null => {
                            sub_exec.push_error(FieldError::from(format!(
                                "Cannot return null for non-nullable field \"{field_name}\"",
                            )));
                            Value::null()
                        }
                        Ok(v) => v,
                        Err(e) => {
                            sub_exec.push_error(e);
                            Value::null()
                        }
                    };
                    AsyncValue::Field(AsyncField {
                        name: response_name,
                        value,
                    })
                };
                pending.push(Box::pin(field_future));
            }
            Selection::FragmentSpread(spread) => {
                if is_excluded(&spread.directives, executor.variables()) {
                    continue;
                }

                let Some(fragment) = executor.fragment_by_name(&spread.fragment_name) else {
                    executor.push_error_at(
                        FieldError::from(format!("Unknown fragment \"{}\"", spread.fragment_name)),
                        spread.position.into(),
                    );
                    continue;
                };
                let TypeCondition::On(condition) = &fragment.type_condition;
                if !executor.schema().is_possible_type(condition, type_id) {
                    continue;
                }

                pending.push(Box::pin(async move {
                    AsyncValue::Nested(
                        resolve_selection_set_into_async(
                            instance,
                            type_id,
                            meta,
                            &fragment.selection_set.items,
                            executor,
                            serial,
                        )
                        .await,
                    )
                }));
            }
            Selection::InlineFragment(fragment) => {
                if is_excluded(&fragment.directives, executor.variables()) {
                    continue;
                }

                if let Some(TypeCondition::On(condition)) = &fragment.type_condition {
                    if !executor.schema().is_possible_type(condition, type_id) {
                        continue;
                    }
                }

                pending.push(Box::pin(async move {
                    AsyncValue::Nested(
                        resolve_selection_set_into_async(
                            instance,
                            type_id,
                            meta,
                            &fragment.selection_set.items,
                            executor,
                            serial,
                        )
                        .await,
                    )
                }));
            }
        }
    }

    let mut merge = |item: AsyncValue| match item {
        AsyncValue::Field(AsyncField { name, value }) => {
            merge_key_into(&mut object, &name, value);
        }
        AsyncValue::Nested(Value::Object(obj)) => {
            for (k, v) in obj {
                merge_key_into(&mut object, &k, v);
            }
        }
        AsyncValue::Nested(_) => {}
    };

    if serial {
        for f in pending {
            merge(f.await);
        }
    } else {
        let mut async_values = pending.into_iter().collect::<FuturesOrdered<_>>();
        while let Some(item) = async_values.next().await {
            merge(item);
        }
    }

    Value::Object(object)
}
