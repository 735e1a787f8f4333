//! Printing of a schema in the GraphQL schema definition language.
//!
//! The schema is translated into a [`graphql_parser`] schema document, whose
//! formatter renders the text.

use std::collections::BTreeMap;

use graphql_parser::{
    Pos,
    query::{Directive as ExternalDirective, Number as ExternalNumber, Type as ExternalType},
    schema::{
        Definition, Document, EnumType as ExternalEnum, EnumValue as ExternalEnumValue,
        Field as ExternalField, InputObjectType as ExternalInputObjectType,
        InputValue as ExternalInputValue, InterfaceType as ExternalInterfaceType,
        ObjectType as ExternalObjectType, SchemaDefinition,
        TypeDefinition as ExternalTypeDefinition,
        UnionType as ExternalUnionType, Value as ExternalValue,
    },
};

use crate::{
    ast::InputValue,
    schema::{
        meta::{
            Argument, DeprecationStatus, EnumValue, Field, MetaType, Registry, TypeId, TypeRef,
        },
        model::SchemaType,
    },
};

type ExternalDocument = Document<'static, String>;

/// Renders every registered type, in registration order, followed by the
/// `schema` definition.
pub fn print_schema(schema: &SchemaType) -> String {
    let registry = schema.registry();

    let mut types = ExternalDocument {
        definitions: vec![],
    };
    types.definitions.extend(
        schema
            .type_list()
            .filter_map(|(_, meta)| translate_meta(registry, meta))
            .map(Definition::TypeDefinition),
    );

    let root = ExternalDocument {
        definitions: vec![Definition::SchemaDefinition(SchemaDefinition {
            position: Pos::default(),
            directives: vec![],
            query: Some(type_name(registry, schema.query_type())),
            mutation: schema.mutation_type().map(|id| type_name(registry, id)),
            subscription: None,
        })],
    };

    let mut out = types.to_string();
    if !out.is_empty() && !out.ends_with("\n\n") {
        out.push('\n');
    }
    if let Some(description) = schema.description() {
        out.push_str(&format!("\"\"\"\n{description}\n\"\"\"\n"));
    }
    out.push_str(&root.to_string());
    out
}

fn type_name(registry: &Registry, id: TypeId) -> String {
    registry
        .get(id)
        .map_or_else(|| id.to_string(), |m| m.name().to_owned())
}

fn translate_meta(
    registry: &Registry,
    input: &MetaType,
) -> Option<ExternalTypeDefinition<'static, String>> {
    Some(match input {
        MetaType::Enum(x) => {
            let mut t = ExternalEnum::new(x.name.to_string());
            t.description = x.description.as_ref().map(ToString::to_string);
            t.values = x.values.iter().map(translate_enum_value).collect();
            ExternalTypeDefinition::Enum(t)
        }
        MetaType::Union(x) => {
            let mut t = ExternalUnionType::new(x.name.to_string());
            t.description = x.description.as_ref().map(ToString::to_string);
            t.types = x.members.iter().map(|id| type_name(registry, *id)).collect();
            ExternalTypeDefinition::Union(t)
        }
        MetaType::Interface(x) => {
            let mut t = ExternalInterfaceType::new(x.name.to_string());
            t.description = x.description.as_ref().map(ToString::to_string);
            t.fields = translate_fields(registry, &x.fields);
            ExternalTypeDefinition::Interface(t)
        }
        MetaType::InputObject(x) => {
            let mut t = ExternalInputObjectType::new(x.name.to_string());
            t.description = x.description.as_ref().map(ToString::to_string);
            t.fields = x
                .input_fields
                .iter()
                .map(|a| translate_argument(registry, a))
                .collect();
            ExternalTypeDefinition::InputObject(t)
        }
        MetaType::Object(x) => {
            let mut t = ExternalObjectType::new(x.name.to_string());
            t.description = x.description.as_ref().map(ToString::to_string);
            t.implements_interfaces = x
                .interfaces
                .iter()
                .map(|id| type_name(registry, *id))
                .collect();
            t.fields = translate_fields(registry, &x.fields);
            ExternalTypeDefinition::Object(t)
        }
        MetaType::Placeholder(_) => return None,
    })
}

fn translate_fields(registry: &Registry, fields: &[Field]) -> Vec<ExternalField<'static, String>> {
    fields
        .iter()
        .filter(|f| !f.is_builtin())
        .map(|f| ExternalField {
            position: Pos::default(),
            description: f.description.as_ref().map(ToString::to_string),
            name: f.name.to_string(),
            arguments: f
                .arguments
                .iter()
                .map(|a| translate_argument(registry, a))
                .collect(),
            field_type: translate_type(registry, &f.field_type, true),
            directives: generate_directives(&f.deprecation_status),
        })
        .collect()
}

fn translate_argument(
    registry: &Registry,
    input: &Argument,
) -> ExternalInputValue<'static, String> {
    ExternalInputValue {
        position: Pos::default(),
        description: input.description.as_ref().map(ToString::to_string),
        name: input.name.to_string(),
        value_type: translate_type(registry, &input.arg_type, true),
        default_value: input.default_value.as_ref().map(translate_value),
        directives: vec![],
    }
}

fn translate_value(input: &InputValue) -> ExternalValue<'static, String> {
    match input {
        InputValue::Null => ExternalValue::Null,
        InputValue::Int(i) => ExternalValue::Int(ExternalNumber::from(*i)),
        InputValue::Float(f) => ExternalValue::Float(*f),
        InputValue::String(s) => ExternalValue::String(s.clone()),
        InputValue::Boolean(b) => ExternalValue::Boolean(*b),
        InputValue::Enum(e) => ExternalValue::Enum(e.clone()),
        InputValue::List(l) => ExternalValue::List(l.iter().map(translate_value).collect()),
        InputValue::Object(o) => ExternalValue::Object(
            o.iter()
                .map(|(k, v)| (k.clone(), translate_value(v)))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}

/// Bare annotations are non-null, so the non-null marker is dropped only
/// under the optional wrapper.
fn translate_type(
    registry: &Registry,
    input: &TypeRef,
    non_null: bool,
) -> ExternalType<'static, String> {
    let t = match input {
        TypeRef::Scalar(s) => ExternalType::NamedType(s.to_string()),
        TypeRef::Named(id) => ExternalType::NamedType(type_name(registry, *id)),
        TypeRef::Nullable(inner) => return translate_type(registry, inner, false),
        TypeRef::List(inner) => {
            ExternalType::ListType(Box::new(translate_type(registry, inner, true)))
        }
    };
    if non_null {
        ExternalType::NonNullType(Box::new(t))
    } else {
        t
    }
}

fn translate_enum_value(input: &EnumValue) -> ExternalEnumValue<'static, String> {
    let mut v = ExternalEnumValue::new(input.name.to_string());
    v.description = input.description.as_ref().map(ToString::to_string);
    v.directives = generate_directives(&input.deprecation_status);
    v
}

// `@deprecated` is the only directive attached to printed definitions.
fn generate_directives(status: &DeprecationStatus) -> Vec<ExternalDirective<'static, String>> {
    match status {
        DeprecationStatus::Current => vec![],
        DeprecationStatus::Deprecated(reason) => vec![ExternalDirective {
            position: Pos::default(),
            name: "deprecated".into(),
            arguments: reason
                .iter()
                .map(|r| ("reason".to_owned(), ExternalValue::String(r.to_string())))
                .collect(),
        }],
    }
}
