use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Name of the unit type. Unbound generic parameters resolve to it.
pub const UNIT: &str = "()";

/// Module path separator used in qualified type names.
pub const PATH_SEPARATOR: &str = "::";

/// Identity of a resolved type: its qualified name plus generic arguments.
///
/// Two instantiations of the same generic type with different arguments are
/// different keys. Parsed from and displayed as `Name<Arg1, Arg2>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeRef {
    pub name: String,
    pub args: Vec<TypeRef>,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: impl IntoIterator<Item = TypeRef>) -> Self {
        Self {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    pub fn unit() -> Self {
        Self::named(UNIT)
    }

    pub fn parse(input: &str) -> Result<Self, ModelError> {
        let mut parser = RefParser { input, pos: 0 };
        let parsed = parser.parse_ref()?;
        parser.skip_ws();
        if parser.pos != input.len() {
            return Err(ModelError::InvalidTypeRef(input.to_string()));
        }
        Ok(parsed)
    }

    /// The last path segment of the name (`shapes::Circle` → `Circle`).
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    pub fn is_generic(&self) -> bool {
        !self.args.is_empty()
    }

    /// Replace occurrences of the given type parameters by the matching
    /// arguments. A parameter with no matching argument becomes `()`.
    pub fn substitute(&self, params: &[String], args: &[TypeRef]) -> TypeRef {
        if self.args.is_empty() {
            if let Some(index) = params.iter().position(|p| *p == self.name) {
                return args.get(index).cloned().unwrap_or_else(TypeRef::unit);
            }
        }
        TypeRef {
            name: self.name.clone(),
            args: self
                .args
                .iter()
                .map(|a| a.substitute(params, args))
                .collect(),
        }
    }
}

/// The last `::`-separated segment of a qualified name.
pub fn simple_name(name: &str) -> &str {
    name.rsplit(PATH_SEPARATOR).next().unwrap_or(name)
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl FromStr for TypeRef {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeRef::parse(s)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TypeRef::parse(&value)
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

struct RefParser<'a> {
    input: &'a str,
    pos: usize,
}

impl RefParser<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn error(&self) -> ModelError {
        ModelError::InvalidTypeRef(self.input.to_string())
    }

    fn parse_ref(&mut self) -> Result<TypeRef, ModelError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '<' | '>' | ',') || c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
        let name = &self.input[start..self.pos];
        if name.is_empty() {
            return Err(self.error());
        }

        self.skip_ws();
        let mut args = Vec::new();
        if self.peek() == Some('<') {
            self.pos += 1;
            loop {
                args.push(self.parse_ref()?);
                self.skip_ws();
                match self.peek() {
                    Some(',') => self.pos += 1,
                    Some('>') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(self.error()),
                }
            }
        }

        Ok(TypeRef {
            name: name.to_string(),
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_name() {
        let t = TypeRef::parse("shapes::Circle").unwrap();
        assert_eq!(t.name, "shapes::Circle");
        assert!(t.args.is_empty());
        assert_eq!(t.simple_name(), "Circle");
    }

    #[test]
    fn test_parse_nested_generics() {
        let t = TypeRef::parse("HashMap<String, Vec<Pet>>").unwrap();
        assert_eq!(t.name, "HashMap");
        assert_eq!(t.args.len(), 2);
        assert_eq!(t.args[1], TypeRef::generic("Vec", [TypeRef::named("Pet")]));
        assert_eq!(t.to_string(), "HashMap<String, Vec<Pet>>");
    }

    #[test]
    fn test_parse_unit() {
        assert_eq!(TypeRef::parse(" () ").unwrap(), TypeRef::unit());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(TypeRef::parse("Box<String").is_err());
        assert!(TypeRef::parse("Box<>").is_err());
        assert!(TypeRef::parse("A B").is_err());
        assert!(TypeRef::parse("").is_err());
    }

    #[test]
    fn test_substitute_params() {
        let t = TypeRef::parse("Vec<T>").unwrap();
        let params = vec!["T".to_string(), "U".to_string()];
        let bound = t.substitute(&params, &[TypeRef::named("String")]);
        assert_eq!(bound.to_string(), "Vec<String>");

        let unbound = TypeRef::named("U").substitute(&params, &[TypeRef::named("String")]);
        assert_eq!(unbound, TypeRef::unit());
    }
}
