// Datalog Query Builder - conjunctive graph patterns over (subject, property, object)
// No planning: constraints are emitted exactly in the order they were added.

use std::collections::HashMap;
use std::fmt;

const TYPE_OF: &str = "typeOf";

/// A position in a constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// `?name`
    Var(String),
    Const(String),
    /// Matches any of the listed constants.
    List(Vec<String>),
}

impl Term {
    pub fn var(name: &str) -> Self {
        Term::Var(normalize_var(name))
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Term::List(values.into_iter().map(Into::into).collect())
    }

    pub fn as_var(&self) -> Option<&str> {
        match self {
            Term::Var(name) => Some(name),
            _ => None,
        }
    }
}

/// Strings starting with `?` are variables, anything else a constant.
impl From<&str> for Term {
    fn from(s: &str) -> Self {
        if s.starts_with('?') {
            Term::Var(s.to_string())
        } else {
            Term::Const(s.to_string())
        }
    }
}

impl From<String> for Term {
    fn from(s: String) -> Self {
        Term::from(s.as_str())
    }
}

impl From<Vec<String>> for Term {
    fn from(values: Vec<String>) -> Self {
        Term::List(values)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(name) => write!(f, "{}", name),
            Term::Const(value) => write!(f, "{}", render_const(value)),
            Term::List(values) => {
                let rendered: Vec<String> = values.iter().map(|v| render_const(v)).collect();
                write!(f, "{}", rendered.join(" "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub subject: Term,
    pub property: Term,
    pub object: Term,
}

/// Conjunctive query: result variables, constraints, and optional per-variable types.
#[derive(Debug, Clone, Default)]
pub struct DatalogQuery {
    variables: Vec<String>,
    constraints: Vec<Constraint>,
    type_hints: HashMap<String, String>,
}

impl DatalogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a result variable. A missing `?` prefix is supplied; repeats are ignored.
    pub fn select(mut self, var: &str) -> Self {
        let var = normalize_var(var);
        if !self.variables.contains(&var) {
            self.variables.push(var);
        }
        self
    }

    pub fn constraint(
        mut self,
        subject: impl Into<Term>,
        property: impl Into<Term>,
        object: impl Into<Term>,
    ) -> Self {
        self.constraints.push(Constraint {
            subject: subject.into(),
            property: property.into(),
            object: object.into(),
        });
        self
    }

    pub fn type_hint(mut self, var: &str, value_type: impl Into<String>) -> Self {
        self.type_hints.insert(normalize_var(var), value_type.into());
        self
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Types known for variables: `typeOf ?v <Type>` constraints, overridden
    /// by explicit hints.
    pub fn var_types(&self) -> HashMap<String, String> {
        let mut types = HashMap::new();
        for c in &self.constraints {
            if let (Term::Var(var), Term::Const(prop), Term::Const(ty)) = (&c.subject, &c.property, &c.object) {
                if prop == TYPE_OF {
                    types.insert(var.clone(), ty.clone());
                }
            }
        }
        types.extend(self.type_hints.iter().map(|(k, v)| (k.clone(), v.clone())));
        types
    }
}

/// `SELECT ?a ?b,\n<property> <subject> <object>,\n...`
impl fmt::Display for DatalogQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT {}", self.variables.join(" "))?;
        for c in &self.constraints {
            write!(f, ",\n{} {} {}", c.property, c.subject, c.object)?;
        }
        Ok(())
    }
}

fn normalize_var(name: &str) -> String {
    if name.starts_with('?') {
        name.to_string()
    } else {
        format!("?{}", name)
    }
}

/// Bare identifiers go out verbatim; anything else is double-quoted.
fn render_const(value: &str) -> String {
    let bare = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '/' | '_' | '.' | ':' | '-'));
    if bare {
        value.to_string()
    } else {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_text_in_insertion_order() {
        let query = DatalogQuery::new()
            .select("?city")
            .select("country")
            .constraint("?node", "typeOf", "City")
            .constraint("?node", "dcid", Term::list(["cityA", "cityB"]))
            .constraint("?node", "dcid", "?city")
            .constraint("?node", "containedInPlace", "?country");

        assert_eq!(
            query.to_string(),
            "SELECT ?city ?country,\n\
             typeOf ?node City,\n\
             dcid ?node cityA cityB,\n\
             dcid ?node ?city,\n\
             containedInPlace ?node ?country"
        );
    }

    #[test]
    fn test_constants_quoted_when_needed() {
        let query = DatalogQuery::new()
            .select("?x")
            .constraint("?x", "name", "Santa Clara \"County\"");
        assert!(query.to_string().ends_with(r#"name ?x "Santa Clara \"County\"""#));
    }

    #[test]
    fn test_var_types_from_type_of_and_hints() {
        let query = DatalogQuery::new()
            .select("?a")
            .select("?b")
            .constraint("?a", "typeOf", "City")
            .constraint("?b", "typeOf", "County")
            .type_hint("b", "AdministrativeArea");

        let types = query.var_types();
        assert_eq!(types.get("?a").map(String::as_str), Some("City"));
        assert_eq!(types.get("?b").map(String::as_str), Some("AdministrativeArea"));
        assert_eq!(types.len(), 2);
    }

    #[test]
    fn test_select_dedupes_variables() {
        let query = DatalogQuery::new().select("?a").select("a").select("?b");
        assert_eq!(query.variables(), ["?a".to_string(), "?b".to_string()]);
        assert_eq!(Term::from("?a").as_var(), Some("?a"));
        assert_eq!(Term::var("a"), Term::Var("?a".into()));
        assert!(Term::from("City").as_var().is_none());
    }
}
