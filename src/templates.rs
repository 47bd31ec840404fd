use std::collections::HashMap;
use std::fs;

use crate::Config;

#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    #[error("no value supplied for placeholder `{0}`")]
    MissingValue(String),
    #[error("unterminated `${{` placeholder")]
    UnterminatedPlaceholder,
    #[error("failed to read template file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// The body and subject templates for a run, loaded once and reused for
/// every notification.
pub struct Templates {
    pub body: String,
    pub subject: String,
}

impl Templates {
    pub fn load(config: &Config) -> Result<Templates, TemplateError> {
        let body = fs::read_to_string(&config.message_template_path).map_err(|source| {
            TemplateError::Io {
                path: config.message_template_path.clone(),
                source,
            }
        })?;

        Ok(Templates {
            body,
            subject: config.subject_template.clone(),
        })
    }
}

/// Substitutes `$name` and `${name}` placeholders with the supplied values.
/// `$$` escapes to a literal `$`; a `$` not starting a placeholder is kept
/// as-is. A referenced placeholder with no supplied value is an error.
pub fn render(template: &str, values: &HashMap<&str, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                chars.next();
                out.push('$');
            }
            Some('{') => {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => name.push(ch),
                        None => return Err(TemplateError::UnterminatedPlaceholder),
                    }
                }
                out.push_str(lookup(values, &name)?);
            }
            Some(&ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                let mut name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_alphanumeric() || ch == '_' {
                        name.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(lookup(values, &name)?);
            }
            _ => out.push('$'),
        }
    }

    Ok(out)
}

fn lookup<'a>(
    values: &'a HashMap<&str, String>,
    name: &str,
) -> Result<&'a str, TemplateError> {
    values
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| TemplateError::MissingValue(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> HashMap<&'static str, String> {
        let mut map = HashMap::new();
        map.insert("name", "Ada".to_string());
        map.insert("date", "Friday, March 01".to_string());
        map
    }

    #[test]
    fn test_render_plain_placeholder() {
        let out = render("Hi $name, see you $date!", &values()).unwrap();
        assert_eq!(out, "Hi Ada, see you Friday, March 01!");
    }

    #[test]
    fn test_render_braced_placeholder() {
        let out = render("Hi ${name}2, see you soon.", &values()).unwrap();
        assert_eq!(out, "Hi Ada2, see you soon.");
    }

    #[test]
    fn test_render_dollar_escape() {
        let out = render("Rate: $$40/hr for $name", &values()).unwrap();
        assert_eq!(out, "Rate: $40/hr for Ada");
    }

    #[test]
    fn test_render_bare_dollar_kept_literal() {
        let out = render("Total: $ 40", &values()).unwrap();
        assert_eq!(out, "Total: $ 40");
    }

    #[test]
    fn test_render_missing_value_is_error() {
        let err = render("Hi $name, join at $meetinglink", &values()).unwrap_err();
        match err {
            TemplateError::MissingValue(name) => assert_eq!(name, "meetinglink"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_render_unterminated_brace_is_error() {
        let err = render("Hi ${name", &values()).unwrap_err();
        assert!(matches!(err, TemplateError::UnterminatedPlaceholder));
    }

    #[test]
    fn test_render_no_placeholders_is_identity() {
        let out = render("Nothing to see here.", &values()).unwrap();
        assert_eq!(out, "Nothing to see here.");
    }
}
