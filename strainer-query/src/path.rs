//! Field path resolution.
//!
//! A path such as `Henchman["Weapons"]["Name"]` is resolved against a
//! [`TypeShape`] into segments, each marked as a plain member access or as a
//! projection over a collection.

use std::fmt;

use strainer_syntax::parse_field_path;

use crate::error::{QueryError, QueryResult};
use crate::shape::{FieldType, FieldValue, Filterable, TypeShape};

/// How a segment is reached from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// Single-valued member.
    Member,
    /// Collection member; later segments apply to every element.
    Projection,
}

/// One resolved segment of a path.
#[derive(Debug, Clone)]
pub struct PathSegment {
    pub name: String,
    pub access: Access,
    pub field_type: FieldType,
}

/// Unresolved field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Split a path written as `A.B.C` or `A["B"]["C"]`.
    pub fn parse(path: &str) -> QueryResult<Self> {
        let segments = parse_field_path(path).map_err(|e| QueryError::from(e).with_field(path))?;
        Ok(Self { segments })
    }

    /// Segment names in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolve every segment against `shape`.
    pub fn resolve(&self, shape: &TypeShape) -> QueryResult<ResolvedPath> {
        let mut current = shape.clone();
        let mut resolved = Vec::with_capacity(self.segments.len());

        for (i, name) in self.segments.iter().enumerate() {
            let field = current
                .field(name)
                .ok_or_else(|| unknown_member(&current, name))?;

            let access = if field.field_type.is_collection() {
                Access::Projection
            } else {
                Access::Member
            };
            resolved.push(PathSegment {
                name: name.clone(),
                access,
                field_type: field.field_type.clone(),
            });

            if let Some(next) = self.segments.get(i + 1) {
                current = field.field_type.object_shape().ok_or_else(|| {
                    QueryError::member_resolution(field.field_type.type_name(), next.as_str())
                        .with_help(format!("`{name}` is not an object and has no members"))
                })?;
            }
        }

        Ok(ResolvedPath { segments: resolved })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

fn unknown_member(shape: &TypeShape, name: &str) -> QueryError {
    let mut err = QueryError::member_resolution(shape.name, name);
    if let Some(close) = shape
        .field_names()
        .find(|candidate| candidate.eq_ignore_ascii_case(name))
    {
        err = err.with_suggestion(format!("did you mean `{close}`?"));
    }
    err
}

/// A path whose segments are known members.
#[derive(Debug, Clone)]
pub struct ResolvedPath {
    pub segments: Vec<PathSegment>,
}

impl ResolvedPath {
    /// The final segment.
    pub fn leaf(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Whether any segment projects over a collection.
    pub fn has_projection(&self) -> bool {
        self.segments.iter().any(|s| s.access == Access::Projection)
    }

    /// Segment names, in order.
    pub fn names(&self) -> Vec<String> {
        self.segments.iter().map(|s| s.name.clone()).collect()
    }
}

/// Walk `names` from `root` and apply `leaf` to the value reached.
///
/// Collections met before the last segment are quantified existentially.
/// Absent intermediate objects reach `leaf` as [`FieldValue::Null`].
pub(crate) fn any_value(
    root: &dyn Filterable,
    names: &[String],
    leaf: &dyn Fn(&FieldValue<'_>) -> bool,
) -> bool {
    let Some((name, rest)) = names.split_first() else {
        return false;
    };
    let value = root.field(name);
    if rest.is_empty() {
        return leaf(&value);
    }
    descend(&value, rest, leaf)
}

fn descend(value: &FieldValue<'_>, rest: &[String], leaf: &dyn Fn(&FieldValue<'_>) -> bool) -> bool {
    match value {
        FieldValue::Object(object) => any_value(*object, rest, leaf),
        FieldValue::List(items) => items.iter().any(|item| descend(item, rest, leaf)),
        _ => leaf(&FieldValue::Null),
    }
}

/// Walk `names` from `root` through single-valued members only.
pub(crate) fn single_value<'a>(root: &'a dyn Filterable, names: &[String]) -> FieldValue<'a> {
    let Some((name, rest)) = names.split_first() else {
        return FieldValue::Null;
    };
    let value = root.field(name);
    if rest.is_empty() {
        return value;
    }
    match value {
        FieldValue::Object(object) => single_value(object, rest),
        _ => FieldValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use crate::shape::fixtures::*;
    use crate::shape::{Filterable, ScalarType};

    fn resolve(path: &str) -> QueryResult<ResolvedPath> {
        FieldPath::parse(path)?.resolve(&Hero::shape())
    }

    #[test]
    fn test_resolve_member() {
        let path = resolve("Firstname").unwrap();
        assert_eq!(path.segments.len(), 1);
        assert_eq!(path.segments[0].access, Access::Member);
        assert_eq!(path.segments[0].field_type.scalar(), Some(ScalarType::String));
    }

    #[test]
    fn test_resolve_projection() {
        let path = resolve(r#"Henchman["Weapons"]["Name"]"#).unwrap();
        let access: Vec<_> = path.segments.iter().map(|s| s.access).collect();
        assert_eq!(access, vec![Access::Member, Access::Projection, Access::Member]);
        assert!(path.has_projection());
        assert_eq!(path.names(), vec!["Henchman", "Weapons", "Name"]);
    }

    #[test]
    fn test_collection_leaf_is_a_projection() {
        let path = resolve("Powers").unwrap();
        assert_eq!(path.leaf().map(|s| s.access), Some(Access::Projection));
    }

    #[test]
    fn test_dotted_and_bracketed_paths_agree() {
        let dotted = FieldPath::parse("Henchman.Weapons.Name").unwrap();
        let bracketed = FieldPath::parse(r#"Henchman["Weapons"]["Name"]"#).unwrap();
        assert_eq!(dotted, bracketed);
        assert_eq!(dotted.to_string(), "Henchman.Weapons.Name");
    }

    #[test]
    fn test_unknown_member() {
        let err = resolve("firstname").unwrap_err();
        assert_eq!(err.code, ErrorCode::MemberResolution);
        assert_eq!(err.context.type_name.as_deref(), Some("Hero"));
        assert_eq!(err.context.field.as_deref(), Some("firstname"));
        assert_eq!(err.context.suggestions, vec!["did you mean `Firstname`?".to_string()]);

        let err = resolve(r#"Henchman["Weapons"]["Power"]"#).unwrap_err();
        assert_eq!(err.context.type_name.as_deref(), Some("Weapon"));
    }

    #[test]
    fn test_walking_into_a_scalar() {
        let err = resolve("Height.Value").unwrap_err();
        assert_eq!(err.code, ErrorCode::MemberResolution);
        assert_eq!(err.context.field.as_deref(), Some("Value"));
    }

    #[test]
    fn test_malformed_path() {
        let err = FieldPath::parse("Henchman[").unwrap_err();
        assert_eq!(err.code, ErrorCode::Parse);
    }

    #[test]
    fn test_any_value_projects_over_collections() {
        let mut henchman = hero("Alfred", 180);
        henchman.weapons = vec![Weapon {
            name: "stick".into(),
            level: 1,
        }];
        let mut bruce = hero("Bruce", 190);
        bruce.henchman = Some(Box::new(henchman));

        let names: Vec<String> = ["Henchman", "Weapons", "Name"].map(String::from).to_vec();
        assert!(any_value(&bruce, &names, &|v| matches!(v, FieldValue::Str("stick"))));
        assert!(!any_value(&bruce, &names, &|v| matches!(v, FieldValue::Str("sword"))));

        let nobody = hero("Clark", 190);
        assert!(any_value(&nobody, &names[..2], &|v| v.is_null()));
    }
}
