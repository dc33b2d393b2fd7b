//! Context, label and dbms filters.
//!
//! Context and label expressions share one boolean grammar:
//!
//! ```text
//! or   := and (("or" | ",") and)*
//! and  := unary ("and" unary)*
//! unary:= ("not" | "!") unary | "(" or ")" | NAME
//! ```
//!
//! A change set carries a [`ContextExpression`] checked against the run's
//! [`Contexts`]. For labels it is the other way round: the run supplies a
//! [`LabelExpression`] that is checked against each change set's [`Labels`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::database::{Database, DatabaseKind};
use crate::error::{MigrateError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Name(String),
    Not(Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
}

impl Node {
    fn eval(&self, names: &BTreeSet<String>) -> bool {
        match self {
            Node::Name(name) => names.contains(name),
            Node::Not(inner) => !inner.eval(names),
            Node::And(left, right) => left.eval(names) && right.eval(names),
            Node::Or(left, right) => left.eval(names) || right.eval(names),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Name(String),
    And,
    Or,
    Not,
    Open,
    Close,
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    let flush = |word: &mut String, tokens: &mut Vec<Token>| {
        if word.is_empty() {
            return;
        }
        let token = match word.to_lowercase().as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            lower => Token::Name(lower.to_string()),
        };
        tokens.push(token);
        word.clear();
    };

    for c in text.chars() {
        match c {
            '(' | ')' | ',' | '!' => {
                flush(&mut word, &mut tokens);
                tokens.push(match c {
                    '(' => Token::Open,
                    ')' => Token::Close,
                    ',' => Token::Or,
                    _ => Token::Not,
                });
            }
            c if c.is_whitespace() => flush(&mut word, &mut tokens),
            c => word.push(c),
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, detail: &str) -> MigrateError {
        MigrateError::ChangeLog(format!("Invalid expression '{}': {}", self.source, detail))
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn or(&mut self) -> Result<Node> {
        let mut node = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            node = Node::Or(Box::new(node), Box::new(self.and()?));
        }
        Ok(node)
    }

    fn and(&mut self) -> Result<Node> {
        let mut node = self.unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            node = Node::And(Box::new(node), Box::new(self.unary()?));
        }
        Ok(node)
    }

    fn unary(&mut self) -> Result<Node> {
        match self.next() {
            Some(Token::Not) => Ok(Node::Not(Box::new(self.unary()?))),
            Some(Token::Open) => {
                let node = self.or()?;
                match self.next() {
                    Some(Token::Close) => Ok(node),
                    _ => Err(self.error("missing ')'")),
                }
            }
            Some(Token::Name(name)) => Ok(Node::Name(name)),
            Some(other) => Err(self.error(&format!("unexpected {:?}", other))),
            None => Err(self.error("unexpected end")),
        }
    }
}

/// A parsed boolean expression over lower-cased names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expression {
    source: String,
    root: Option<Node>,
}

impl Expression {
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Ok(Self::default());
        }
        let mut parser = Parser {
            source: text,
            tokens,
            pos: 0,
        };
        let root = parser.or()?;
        if parser.pos < parser.tokens.len() {
            return Err(parser.error("trailing input"));
        }
        Ok(Self {
            source: text.trim().to_string(),
            root: Some(root),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Evaluate against a set of names; an empty expression is true.
    pub fn matches(&self, names: &BTreeSet<String>) -> bool {
        self.root.as_ref().map_or(true, |root| root.eval(names))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn name_set(text: &str) -> BTreeSet<String> {
    text.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().cloned().collect::<Vec<_>>().join(",")
}

macro_rules! string_serde {
    ($ty:ident, $parse:expr) => {
        impl TryFrom<String> for $ty {
            type Error = MigrateError;

            fn try_from(text: String) -> Result<Self> {
                $parse(&text)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> String {
                value.to_string()
            }
        }
    };
}

/// Contexts a change set applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContextExpression(Expression);

impl ContextExpression {
    pub fn parse(text: &str) -> Result<Self> {
        Expression::parse(text).map(Self)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the change set has no contexts or the run selected none.
    pub fn matches(&self, contexts: &Contexts) -> bool {
        contexts.is_empty() || self.0.matches(&contexts.0)
    }
}

impl fmt::Display for ContextExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

string_serde!(ContextExpression, ContextExpression::parse);

/// Contexts selected for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contexts(BTreeSet<String>);

impl Contexts {
    pub fn parse(text: &str) -> Self {
        Self(name_set(text))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Contexts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join(&self.0))
    }
}

/// Labels attached to a change set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Labels(BTreeSet<String>);

impl Labels {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self(name_set(text)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join(&self.0))
    }
}

string_serde!(Labels, Labels::parse);

/// Label selection for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelExpression(Expression);

impl LabelExpression {
    pub fn parse(text: &str) -> Result<Self> {
        Expression::parse(text).map(Self)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unlabelled change sets match every expression.
    pub fn matches(&self, labels: &Labels) -> bool {
        labels.is_empty() || self.0.matches(&labels.0)
    }
}

impl fmt::Display for LabelExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A `dbms` attribute: short names, `!name` exclusions, `all` or `none`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DbmsSet {
    source: String,
    include: Vec<DatabaseKind>,
    exclude: Vec<DatabaseKind>,
    all: bool,
    none: bool,
}

impl DbmsSet {
    pub fn parse(text: &str) -> Result<Self> {
        let mut set = Self {
            source: text.trim().to_string(),
            ..Self::default()
        };
        for entry in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match entry.to_lowercase().as_str() {
                "all" => set.all = true,
                "none" => set.none = true,
                lower => match lower.strip_prefix('!') {
                    Some(excluded) => set.exclude.push(DatabaseKind::from_short_name(excluded)?),
                    None => set.include.push(DatabaseKind::from_short_name(lower)?),
                },
            }
        }
        Ok(set)
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn matches(&self, database: &Database) -> bool {
        let kind = database.kind();
        if self.none || self.exclude.contains(&kind) {
            return false;
        }
        self.all || self.include.is_empty() || self.include.contains(&kind)
    }
}

impl fmt::Display for DbmsSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

string_serde!(DbmsSet, DbmsSet::parse);

#[cfg(test)]
mod tests {
    use super::*;

    fn contexts(text: &str) -> Contexts {
        Contexts::parse(text)
    }

    #[test]
    fn test_precedence_and_negation() {
        let expr = ContextExpression::parse("test and !prod or qa").unwrap();
        assert!(expr.matches(&contexts("test")));
        assert!(!expr.matches(&contexts("test,prod")));
        assert!(expr.matches(&contexts("qa,prod")));
        assert!(!expr.matches(&contexts("dev")));
    }

    #[test]
    fn test_parentheses_and_comma() {
        let expr = ContextExpression::parse("(test, qa) and not prod").unwrap();
        assert!(expr.matches(&contexts("QA")));
        assert!(!expr.matches(&contexts("qa,prod")));
    }

    #[test]
    fn test_empty_sides_match_everything() {
        assert!(ContextExpression::default().matches(&contexts("prod")));
        let expr = ContextExpression::parse("test").unwrap();
        assert!(expr.matches(&Contexts::default()));
    }

    #[test]
    fn test_invalid_expression() {
        assert!(ContextExpression::parse("(test").is_err());
        assert!(ContextExpression::parse("test and").is_err());
        assert!(ContextExpression::parse("a b").is_err());
    }

    #[test]
    fn test_labels() {
        let labels = Labels::parse("jira-1, feature").unwrap();
        assert!(LabelExpression::parse("feature and !hotfix").unwrap().matches(&labels));
        assert!(!LabelExpression::parse("hotfix").unwrap().matches(&labels));
        assert!(LabelExpression::parse("hotfix").unwrap().matches(&Labels::default()));
    }

    #[test]
    fn test_dbms_set() {
        let pg = Database::new(DatabaseKind::Postgres);
        let mysql = Database::new(DatabaseKind::MySql);
        assert!(DbmsSet::default().matches(&pg));
        assert!(DbmsSet::parse("postgresql, h2").unwrap().matches(&pg));
        assert!(!DbmsSet::parse("postgresql").unwrap().matches(&mysql));
        assert!(!DbmsSet::parse("!mysql").unwrap().matches(&mysql));
        assert!(DbmsSet::parse("!mysql").unwrap().matches(&pg));
        assert!(!DbmsSet::parse("none").unwrap().matches(&pg));
        assert!(DbmsSet::parse("all").unwrap().matches(&mysql));
        assert!(DbmsSet::parse("nosuchdb").is_err());
    }

    #[test]
    fn test_yaml_roundtrip_as_string() {
        let expr: ContextExpression = serde_yaml::from_str("\"test and !prod\"").unwrap();
        assert!(expr.matches(&contexts("test")));
        let text = serde_yaml::to_string(&expr).unwrap();
        let back: ContextExpression = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back.to_string(), "test and !prod");
    }
}
