//! Structural rules a schema must satisfy before it is registered.

use std::collections::HashSet;

use derive_more::with_trait::{Display, Error};

use crate::schema::meta::{
    Argument, Classified, Field, MetaType, ObjectMeta, Registry, TypeId, TypeRef,
};

/// Name of the root field holding the query type.
pub const QUERY_FIELD: &str = "query";

/// Name of the root field holding the mutation type.
pub const MUTATION_FIELD: &str = "mutation";

/// Error raised when a schema violates a structural rule.
///
/// Any such error aborts the schema construction: there are no partially
/// built schemas.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
pub enum SchemaError {
    /// A root field is named something other than `query` or `mutation`.
    #[display("Invalid root field \"{_0}\": only \"query\" and \"mutation\" are allowed")]
    InvalidRootField(#[error(not(source))] String),

    /// The schema declares no `query` root field.
    #[display("Schema must declare a \"query\" root field")]
    MissingQueryRoot,

    /// A root field type is not wrapped into the optional wrapper.
    #[display("Root field \"{_0}\" must be of a nullable type")]
    RootNotNullable(#[error(not(source))] String),

    /// A root field type is not an object type.
    #[display("Root field \"{_0}\" must be of an object type")]
    RootNotObject(#[error(not(source))] String),

    /// A root object type has no constructor to instantiate it with.
    #[display("Root type \"{_0}\" has no constructor")]
    RootNotConstructible(#[error(not(source))] String),

    /// A type reference points outside of the registry.
    #[display("Unknown type {_0}")]
    UnknownType(#[error(not(source))] TypeId),

    /// A placeholder type was never defined.
    #[display("Type \"{_0}\" was declared but never defined")]
    UndefinedType(#[error(not(source))] String),

    /// A type was defined twice.
    #[display("Type \"{_0}\" is already defined")]
    AlreadyDefined(#[error(not(source))] String),

    /// A name is not a valid GraphQL name.
    #[display("\"{_0}\" is not a valid name")]
    InvalidName(#[error(not(source))] String),

    /// Two distinct types share the same name.
    #[display("Type name \"{_0}\" is used more than once")]
    DuplicateTypeName(#[error(not(source))] String),

    /// A field name is used more than once on a type.
    #[display("Field \"{field}\" is declared more than once on \"{owner}\"")]
    DuplicateField {
        /// Type declaring the fields.
        owner: String,
        /// Repeated field name.
        field: String,
    },

    /// An argument name is used more than once on a field.
    #[display("Argument \"{argument}\" is declared more than once on \"{owner}\"")]
    DuplicateArgument {
        /// Field declaring the arguments, as `Type.field`.
        owner: String,
        /// Repeated argument name.
        argument: String,
    },

    /// An object or interface type has no fields.
    #[display("Type \"{_0}\" must define one or more fields")]
    EmptyFields(#[error(not(source))] String),

    /// An argument or input field has a type that is not an input type.
    #[display("\"{owner}\" must be of an input type, found \"{found}\"")]
    NotAnInputType {
        /// Argument or input field, as `Type.field(argument)` or `Type.field`.
        owner: String,
        /// Name of the offending type.
        found: String,
    },

    /// A field has a type that is not an output type.
    #[display("\"{owner}\" must be of an output type, found \"{found}\"")]
    NotAnOutputType {
        /// Field, as `Type.field`.
        owner: String,
        /// Name of the offending type.
        found: String,
    },

    /// A union member is not an object type.
    #[display("Union \"{union}\" can only include object types, found \"{member}\"")]
    InvalidUnionMember {
        /// Union name.
        union: String,
        /// Name of the offending member.
        member: String,
    },

    /// A union has no members.
    #[display("Union \"{_0}\" must include one or more member types")]
    EmptyUnion(#[error(not(source))] String),

    /// A union includes the same member twice.
    #[display("Union \"{union}\" includes \"{member}\" more than once")]
    DuplicateUnionMember {
        /// Union name.
        union: String,
        /// Repeated member name.
        member: String,
    },

    /// An enum has no values.
    #[display("Enum \"{_0}\" must define one or more values")]
    EmptyEnum(#[error(not(source))] String),

    /// An enum value name is used more than once.
    #[display("Enum \"{enum_name}\" declares value \"{value}\" more than once")]
    DuplicateEnumValue {
        /// Enum name.
        enum_name: String,
        /// Repeated value name.
        value: String,
    },

    /// An object claims to implement something that is not an interface.
    #[display("Type \"{object}\" can only implement interfaces, found \"{found}\"")]
    NotAnInterface {
        /// Object name.
        object: String,
        /// Name of the offending type.
        found: String,
    },

    /// An object lacks a field of an interface it implements.
    #[display("Type \"{object}\" must declare field \"{field}\" of interface \"{interface}\"")]
    MissingInterfaceField {
        /// Object name.
        object: String,
        /// Interface name.
        interface: String,
        /// Missing field name.
        field: String,
    },
}

/// Checks the root fields of a schema and every type declared in `registry`.
///
/// Root fields are checked first, in declaration order, then the declared
/// types. The first violation found is returned.
pub fn validate_schema(registry: &Registry, root_fields: &[Field]) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for field in root_fields {
        validate_root_field(registry, field)?;
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField {
                owner: "schema".into(),
                field: field.name.to_string(),
            });
        }
    }
    if !seen.contains(QUERY_FIELD) {
        return Err(SchemaError::MissingQueryRoot);
    }

    validate_types(registry)
}

fn validate_root_field(registry: &Registry, field: &Field) -> Result<(), SchemaError> {
    if field.name != QUERY_FIELD && field.name != MUTATION_FIELD {
        return Err(SchemaError::InvalidRootField(field.name.to_string()));
    }
    validate_field(registry, "schema", field)?;

    let Classified::Nullable(inner) = registry.classify(&field.field_type)? else {
        return Err(SchemaError::RootNotNullable(field.name.to_string()));
    };
    let Classified::Object(_, object) = registry.classify(inner)? else {
        return Err(SchemaError::RootNotObject(field.name.to_string()));
    };
    if object.constructor.is_none() {
        return Err(SchemaError::RootNotConstructible(object.name.to_string()));
    }
    Ok(())
}

/// Checks every type declared in `registry` on its own.
pub fn validate_types(registry: &Registry) -> Result<(), SchemaError> {
    let mut names = HashSet::new();
    for (_, meta) in registry.iter() {
        if let MetaType::Placeholder(p) = meta {
            return Err(SchemaError::UndefinedType(p.name.to_string()));
        }
        validate_name(meta.name())?;
        if !names.insert(meta.name()) {
            return Err(SchemaError::DuplicateTypeName(meta.name().into()));
        }

        match meta {
            MetaType::Object(o) => validate_object(registry, o)?,
            MetaType::Interface(i) => validate_fields(registry, &i.name, &i.fields)?,
            MetaType::InputObject(i) => {
                let mut seen = HashSet::new();
                for f in &i.input_fields {
                    validate_argument(registry, &format!("{}.{}", i.name, f.name), f)?;
                    if !seen.insert(f.name.as_str()) {
                        return Err(SchemaError::DuplicateField {
                            owner: i.name.to_string(),
                            field: f.name.to_string(),
                        });
                    }
                }
            }
            MetaType::Union(u) => {
                if u.members.is_empty() {
                    return Err(SchemaError::EmptyUnion(u.name.to_string()));
                }
                let mut seen = HashSet::new();
                for member in &u.members {
                    let member_ref = TypeRef::Named(*member);
                    let Classified::Object(_, o) = registry.classify(&member_ref)? else {
                        return Err(SchemaError::InvalidUnionMember {
                            union: u.name.to_string(),
                            member: registry.type_name(&member_ref),
                        });
                    };
                    if !seen.insert(*member) {
                        return Err(SchemaError::DuplicateUnionMember {
                            union: u.name.to_string(),
                            member: o.name.to_string(),
                        });
                    }
                }
            }
            MetaType::Enum(e) => {
                if e.values.is_empty() {
                    return Err(SchemaError::EmptyEnum(e.name.to_string()));
                }
                let mut seen = HashSet::new();
                for v in &e.values {
                    validate_name(&v.name)?;
                    if !seen.insert(v.name.as_str()) {
                        return Err(SchemaError::DuplicateEnumValue {
                            enum_name: e.name.to_string(),
                            value: v.name.to_string(),
                        });
                    }
                }
            }
            MetaType::Placeholder(_) => {}
        }
    }
    Ok(())
}

fn validate_object(registry: &Registry, object: &ObjectMeta) -> Result<(), SchemaError> {
    validate_fields(registry, &object.name, &object.fields)?;

    for iface in &object.interfaces {
        let iface_ref = TypeRef::Named(*iface);
        let Classified::Interface(_, meta) = registry.classify(&iface_ref)? else {
            return Err(SchemaError::NotAnInterface {
                object: object.name.to_string(),
                found: registry.type_name(&iface_ref),
            });
        };
        if let Some(missing) = meta
            .fields
            .iter()
            .find(|f| !object.fields.iter().any(|of| of.name == f.name))
        {
            return Err(SchemaError::MissingInterfaceField {
                object: object.name.to_string(),
                interface: meta.name.to_string(),
                field: missing.name.to_string(),
            });
        }
    }
    Ok(())
}

fn validate_fields(registry: &Registry, owner: &str, fields: &[Field]) -> Result<(), SchemaError> {
    if fields.is_empty() {
        return Err(SchemaError::EmptyFields(owner.into()));
    }
    let mut seen = HashSet::new();
    for field in fields {
        validate_field(registry, owner, field)?;
        if !is_output_type(registry, &field.field_type)? {
            return Err(SchemaError::NotAnOutputType {
                owner: format!("{owner}.{}", field.name),
                found: registry.type_name(&field.field_type),
            });
        }
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField {
                owner: owner.into(),
                field: field.name.to_string(),
            });
        }
    }
    Ok(())
}

/// Checks the name and arguments of a single field.
fn validate_field(registry: &Registry, owner: &str, field: &Field) -> Result<(), SchemaError> {
    validate_name(&field.name)?;

    let mut seen = HashSet::new();
    for arg in &field.arguments {
        validate_argument(registry, &format!("{owner}.{}({})", field.name, arg.name), arg)?;
        if !seen.insert(arg.name.as_str()) {
            return Err(SchemaError::DuplicateArgument {
                owner: format!("{owner}.{}", field.name),
                argument: arg.name.to_string(),
            });
        }
    }
    Ok(())
}

fn validate_argument(registry: &Registry, owner: &str, arg: &Argument) -> Result<(), SchemaError> {
    validate_name(&arg.name)?;
    if !is_input_type(registry, &arg.arg_type)? {
        return Err(SchemaError::NotAnInputType {
            owner: owner.into(),
            found: registry.type_name(&arg.arg_type),
        });
    }
    Ok(())
}

fn is_input_type(registry: &Registry, t: &TypeRef) -> Result<bool, SchemaError> {
    Ok(match registry.classify(t)? {
        Classified::Scalar(_) | Classified::Enum(..) | Classified::InputObject(..) => true,
        Classified::Nullable(inner) | Classified::List(inner) => is_input_type(registry, inner)?,
        Classified::Object(..) | Classified::Interface(..) | Classified::Union(..) => false,
    })
}

fn is_output_type(registry: &Registry, t: &TypeRef) -> Result<bool, SchemaError> {
    Ok(match registry.classify(t)? {
        Classified::Scalar(_)
        | Classified::Enum(..)
        | Classified::Object(..)
        | Classified::Interface(..)
        | Classified::Union(..) => true,
        Classified::Nullable(inner) | Classified::List(inner) => is_output_type(registry, inner)?,
        Classified::InputObject(..) => false,
    })
}

/// Checks `name` against `/^[_A-Za-z][_0-9A-Za-z]*$/`, rejecting the `__`
/// prefix reserved for introspection.
fn validate_name(name: &str) -> Result<(), SchemaError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        && !name.starts_with("__");
    if valid {
        Ok(())
    } else {
        Err(SchemaError::InvalidName(name.into()))
    }
}
