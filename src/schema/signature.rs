//! Method signature parsing.
//!
//! Traces identify callees with signatures of the form
//! `type;.method(arg1,arg2)returnType`, e.g.
//! `com.example.Foo;.bar(int,java.lang.String)void`.

use std::fmt;

/// Name, parameter types and return type of a method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodKey {
    pub name: String,
    pub params: Vec<String>,
    pub return_type: String,
}

impl MethodKey {
    /// Parse `name(params)returnType`. A missing return type means `void`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let open = text.find('(')?;
        let close = open + text[open..].find(')')?;

        let name = text[..open].trim();
        if name.is_empty() {
            return None;
        }

        let params = text[open + 1..close]
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        let return_type = match text[close + 1..].trim() {
            "" => "void".to_string(),
            ret => ret.to_string(),
        };

        Some(Self {
            name: name.to_string(),
            params,
            return_type,
        })
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}){}", self.name, self.params.join(","), self.return_type)
    }
}

/// A fully qualified method signature: declaring type plus method key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub type_key: String,
    pub method: MethodKey,
}

impl MethodSignature {
    /// Parse `type;.method(args)returnType`
    ///
    /// Returns `None` when the `;.` separator, the type or the method key is
    /// missing.
    pub fn parse(text: &str) -> Option<Self> {
        let (type_key, method) = text.trim().split_once(";.")?;
        let type_key = type_key.trim();
        if type_key.is_empty() {
            return None;
        }

        Some(Self {
            type_key: type_key.to_string(),
            method: MethodKey::parse(method)?,
        })
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};.{}", self.type_key, self.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_signature() {
        let sig = MethodSignature::parse("com.example.Foo;.bar(int, java.lang.String)void").unwrap();
        assert_eq!(sig.type_key, "com.example.Foo");
        assert_eq!(sig.method.name, "bar");
        assert_eq!(sig.method.params, vec!["int", "java.lang.String"]);
        assert_eq!(sig.method.return_type, "void");
        assert_eq!(sig.to_string(), "com.example.Foo;.bar(int,java.lang.String)void");
    }

    #[test]
    fn test_parse_no_args_no_return() {
        let key = MethodKey::parse("run()").unwrap();
        assert!(key.params.is_empty());
        assert_eq!(key.return_type, "void");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(MethodSignature::parse("Foo.bar()").is_none());
        assert!(MethodSignature::parse(";.bar()void").is_none());
        assert!(MethodSignature::parse("Foo;.()void").is_none());
        assert!(MethodKey::parse("bar").is_none());
    }
}
