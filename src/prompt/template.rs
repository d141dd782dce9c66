// Prompt template implementation
use std::collections::HashMap;

use anyhow::Error;

// F-string style prompt template: `{variable}` placeholders, `{{`/`}}` escapes.
#[derive(Clone, Debug)]
pub struct PromptTemplate {
    template: String,
    input_variables: Vec<String>,
    partial_variables: HashMap<String, String>,
}

impl PromptTemplate {
    /// Create a template with an explicit variable list. Only the declared
    /// variables are substituted, everything else in the template is literal.
    pub fn new(template: impl Into<String>, input_variables: Vec<String>) -> Self {
        Self {
            template: template.into(),
            input_variables,
            partial_variables: HashMap::new(),
        }
    }

    /// Create a template, inferring the variable list from `{name}` markers.
    pub fn from_template(template: impl Into<String>) -> Self {
        let template = template.into();
        let input_variables = infer_variables(&template);
        Self {
            template,
            input_variables,
            partial_variables: HashMap::new(),
        }
    }

    /// Pre-bind one variable so callers no longer have to supply it.
    pub fn partial(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.input_variables.retain(|v| v != &key);
        self.partial_variables.insert(key, value.into());
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    /// Render the template. Fails when a declared variable is missing from
    /// both the inputs and the partials; extra input keys are ignored.
    pub fn format(&self, inputs: &HashMap<String, String>) -> Result<String, Error> {
        let mut rendered = self.template.clone();

        for variable in &self.input_variables {
            let value = inputs.get(variable).ok_or_else(|| {
                Error::msg(format!("Missing value for template variable '{}'", variable))
            })?;
            rendered = rendered.replace(&format!("{{{}}}", variable), value);
        }

        for (variable, value) in &self.partial_variables {
            rendered = rendered.replace(&format!("{{{}}}", variable), value);
        }

        Ok(rendered.replace("{{", "{").replace("}}", "}"))
    }
}

// Scan for `{name}` markers, skipping `{{` escapes
fn infer_variables(template: &str) -> Vec<String> {
    let mut variables = Vec::new();
    let bytes = template.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'{' {
            if i + 1 < bytes.len() && bytes[i + 1] == b'{' {
                i += 2;
                continue;
            }
            if let Some(close) = template[i + 1..].find('}') {
                let name = &template[i + 1..i + 1 + close];
                if !name.is_empty()
                    && name
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_')
                    && !variables.iter().any(|v| v == name)
                {
                    variables.push(name.to_string());
                }
                i += close + 2;
                continue;
            }
        }
        i += 1;
    }

    variables
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_infer_variables() {
        let template = PromptTemplate::from_template("Hello {name}, today is {day}. {name}!");
        assert_eq!(template.input_variables(), ["name", "day"]);
    }

    #[test]
    fn test_format() {
        let template = PromptTemplate::from_template("Hello {name}, today is {day}.");
        let rendered = template
            .format(&inputs(&[("name", "Ada"), ("day", "Tuesday")]))
            .unwrap();
        assert_eq!(rendered, "Hello Ada, today is Tuesday.");
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let template = PromptTemplate::from_template("Hello {name}.");
        let err = template.format(&inputs(&[])).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_extra_inputs_are_ignored() {
        let template = PromptTemplate::from_template("Hello {name}.");
        let rendered = template
            .format(&inputs(&[("name", "Ada"), ("unused", "x")]))
            .unwrap();
        assert_eq!(rendered, "Hello Ada.");
    }

    #[test]
    fn test_escaped_braces() {
        let template = PromptTemplate::from_template("Literal {{braces}} and {value}.");
        assert_eq!(template.input_variables(), ["value"]);
        let rendered = template.format(&inputs(&[("value", "v")])).unwrap();
        assert_eq!(rendered, "Literal {braces} and v.");
    }

    #[test]
    fn test_partial_binding() {
        let template =
            PromptTemplate::from_template("{greeting}, {name}.").partial("greeting", "Hi");
        assert_eq!(template.input_variables(), ["name"]);
        let rendered = template.format(&inputs(&[("name", "Ada")])).unwrap();
        assert_eq!(rendered, "Hi, Ada.");
    }
}
