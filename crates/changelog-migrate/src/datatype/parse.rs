//! Type descriptor syntax: `name`, `name(p1, p2)`, `name(p) extra`,
//! `name[]` and `name UNSIGNED`.

const JDBC_PREFIX: &str = "java.sql.types.";

/// A descriptor split into its parts, before any unit has claimed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Lower-case name with whitespace runs collapsed.
    pub name: String,
    /// Name as written, case preserved.
    pub written_name: String,
    pub parameters: Vec<String>,
    pub additional_info: Option<String>,
    pub unsigned: bool,
    pub array: bool,
    /// Input text, trimmed.
    pub raw: String,
}

impl TypeDescriptor {
    pub fn parse(descriptor: &str) -> Result<Self, String> {
        let raw = descriptor.trim().to_string();
        if raw.is_empty() {
            return Err("Type descriptor is empty".to_string());
        }

        let mut text = raw.as_str();
        if text.len() > JDBC_PREFIX.len()
            && text[..JDBC_PREFIX.len()].eq_ignore_ascii_case(JDBC_PREFIX)
        {
            text = &text[JDBC_PREFIX.len()..];
        }

        let mut array = false;
        if let Some(stripped) = text.strip_suffix("[]") {
            array = true;
            text = stripped.trim_end();
        }

        let (name, parameters, rest) = match text.find('(') {
            Some(open) => {
                let close = text[open..]
                    .find(')')
                    .map(|i| i + open)
                    .ok_or_else(|| format!("Unbalanced parentheses in type '{}'", raw))?;
                let parameters = text[open + 1..close]
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect();
                (&text[..open], parameters, text[close + 1..].trim())
            }
            None => (text, Vec::new(), ""),
        };

        let mut words: Vec<&str> = name.split_whitespace().collect();
        let mut info_words: Vec<&str> = rest.split_whitespace().collect();
        let unsigned = words
            .iter()
            .chain(info_words.iter())
            .any(|w| w.eq_ignore_ascii_case("unsigned"));
        words.retain(|w| !w.eq_ignore_ascii_case("unsigned"));
        info_words.retain(|w| !w.eq_ignore_ascii_case("unsigned"));

        if words.is_empty() {
            return Err(format!("Type '{}' has no name", raw));
        }
        if parameters.iter().any(|p: &String| p.contains('(')) {
            return Err(format!("Nested parentheses in type '{}'", raw));
        }

        let additional_info = if info_words.is_empty() {
            None
        } else {
            Some(info_words.join(" "))
        };

        let written_name = words.join(" ");
        Ok(Self {
            name: written_name.to_lowercase(),
            written_name,
            parameters,
            additional_info,
            unsigned,
            array,
            raw,
        })
    }

    /// Candidate `(name, moved words)` splits, longest name first.
    ///
    /// `timestamp with time zone` yields the full phrase first, then
    /// `timestamp with time` + `ZONE`, and so on down to `timestamp` +
    /// `WITH TIME ZONE`.
    pub fn name_candidates(&self) -> Vec<(String, Option<String>)> {
        let words: Vec<&str> = self.name.split(' ').collect();
        (1..=words.len())
            .rev()
            .map(|n| {
                let moved = if n == words.len() {
                    None
                } else {
                    Some(words[n..].join(" ").to_uppercase())
                };
                (words[..n].join(" "), moved)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_name() {
        let d = TypeDescriptor::parse("  INT ").unwrap();
        assert_eq!(d.name, "int");
        assert!(d.parameters.is_empty());
        assert_eq!(d.additional_info, None);
    }

    #[test]
    fn test_parse_parameters_and_info() {
        let d = TypeDescriptor::parse("decimal(10, 2)").unwrap();
        assert_eq!(d.parameters, vec!["10", "2"]);
        let d = TypeDescriptor::parse("varchar(20) CHARACTER SET utf8").unwrap();
        assert_eq!(d.name, "varchar");
        assert_eq!(d.additional_info.as_deref(), Some("CHARACTER SET utf8"));
    }

    #[test]
    fn test_parse_jdbc_prefix_array_and_unsigned() {
        let d = TypeDescriptor::parse("java.sql.Types.VARCHAR(40)").unwrap();
        assert_eq!(d.name, "varchar");
        assert_eq!(d.parameters, vec!["40"]);
        assert!(TypeDescriptor::parse("int[]").unwrap().array);
        let d = TypeDescriptor::parse("int UNSIGNED").unwrap();
        assert!(d.unsigned);
        assert_eq!(d.name, "int");
    }

    #[test]
    fn test_parse_errors() {
        assert!(TypeDescriptor::parse("").is_err());
        assert!(TypeDescriptor::parse("varchar(10").is_err());
    }

    #[test]
    fn test_name_candidates_longest_first() {
        let d = TypeDescriptor::parse("timestamp with time zone").unwrap();
        let candidates = d.name_candidates();
        assert_eq!(candidates[0], ("timestamp with time zone".to_string(), None));
        assert_eq!(
            candidates.last().unwrap(),
            &("timestamp".to_string(), Some("WITH TIME ZONE".to_string()))
        );
    }
}
