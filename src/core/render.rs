//! Renderer module
//!
//! Renders ResultSet to different output formats: jsonl, json, md, raw

use colored::Colorize;

use crate::core::model::{Kind, ResultItem, ResultSet};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Json,
    Markdown,
    Raw,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            "raw" => Ok(OutputFormat::Raw),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            pretty: false,
        }
    }

    /// Create a new render config with pretty option
    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

/// Renderer for result sets
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            config: RenderConfig::new(format),
        }
    }

    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render a result set to a string
    pub fn render(&self, result_set: &ResultSet) -> String {
        match self.config.format {
            OutputFormat::Jsonl => self.render_jsonl(result_set),
            OutputFormat::Json => self.render_json(result_set),
            OutputFormat::Markdown => self.render_markdown(result_set),
            OutputFormat::Raw => self.render_raw(result_set),
        }
    }

    /// Render as JSON Lines (one JSON object per line)
    fn render_jsonl(&self, result_set: &ResultSet) -> String {
        result_set
            .items
            .iter()
            .filter_map(|item| {
                if self.config.pretty {
                    serde_json::to_string_pretty(item).ok()
                } else {
                    serde_json::to_string(item).ok()
                }
            })
            .collect::<Vec<_>>()
            .join(if self.config.pretty { "\n\n" } else { "\n" })
    }

    /// Render as a single JSON array
    fn render_json(&self, result_set: &ResultSet) -> String {
        if self.config.pretty {
            serde_json::to_string_pretty(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        } else {
            serde_json::to_string(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        }
    }

    /// Render as Markdown
    fn render_markdown(&self, result_set: &ResultSet) -> String {
        let mut output = String::new();

        let mut pages = Vec::new();
        let mut steps = Vec::new();
        let mut policies = Vec::new();

        for item in &result_set.items {
            match item.kind {
                Kind::Page => pages.push(item),
                Kind::Step => steps.push(item),
                Kind::Policy => policies.push(item),
            }
        }

        if !pages.is_empty() {
            output.push_str("## Pages\n\n");
            for item in pages {
                if let (Some(index), Some(identifier)) = (item.index, &item.identifier) {
                    output.push_str(&format!("{}. `{}`", index, identifier));
                    if let Some(size) = item.meta.size {
                        output.push_str(&format!(" ({} bytes)", size));
                    }
                    output.push('\n');
                }
            }
            output.push('\n');
        }

        if !steps.is_empty() {
            output.push_str("## Steps\n\n");
            output.push_str("| step | index | identifier | bytes | hash |\n");
            output.push_str("|---|---|---|---|---|\n");
            for item in steps {
                self.render_step_md(&mut output, item);
            }
            output.push('\n');
        }

        if !policies.is_empty() {
            output.push_str("## Window Policy\n\n");
            for item in policies {
                if let Some(serde_json::Value::Object(fields)) = &item.data {
                    for (name, value) in fields {
                        output.push_str(&format!("- `{}`: {}\n", name, value));
                    }
                }
            }
            output.push('\n');
        }

        output
    }

    fn render_step_md(&self, output: &mut String, item: &ResultItem) {
        let step = item.step.as_deref().unwrap_or("");
        let index = item.index.map(|i| i.to_string()).unwrap_or_default();
        let identifier = item.identifier.as_deref().unwrap_or("");

        match item.errors.first() {
            Some(error) => output.push_str(&format!(
                "| {} | {} | `{}` | - | {} |\n",
                step, index, identifier, error.code
            )),
            None => output.push_str(&format!(
                "| {} | {} | `{}` | {} | {} |\n",
                step,
                index,
                identifier,
                item.meta.size.unwrap_or(0),
                item.meta.hash.as_deref().unwrap_or("")
            )),
        }
    }

    /// Render as raw output (for humans at a terminal)
    fn render_raw(&self, result_set: &ResultSet) -> String {
        result_set
            .items
            .iter()
            .map(|item| {
                let index = item.index.map(|i| i.to_string()).unwrap_or_default();
                let identifier = item.identifier.as_deref().unwrap_or("");
                let head = match &item.step {
                    Some(step) => format!("{:>6} -> {:>4} {}", step, index.as_str().green(), identifier),
                    None => format!("{:>4} {}", index.as_str().green(), identifier),
                };
                match item.errors.first() {
                    Some(error) => format!("{} {}", head, error.code.as_str().red()),
                    None => match &item.data {
                        Some(data) if item.kind == Kind::Policy => data.to_string(),
                        _ => head,
                    },
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
