use anyhow::{Context, Result};
use handlebars::{handlebars_helper, Handlebars};
use serde::Serialize;

#[derive(Debug, Clone)]
pub enum Output {
    Json,
    Text,
}

impl clap::ValueEnum for Output {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

fn left_pad(width: u64, v: &serde_json::Value) -> String {
    let v = match v {
        serde_json::Value::String(s) => s.to_owned(),
        serde_json::Value::Null => String::new(),
        _ => v.to_string(),
    };
    let width = usize::try_from(width).unwrap_or(0);
    format!("{v:>width$}")
}

/// Render `data` with a handlebars `template`. Templates get an `lpad`
/// helper, `{{ lpad 8 value }}`, and no HTML escaping.
pub fn text<T: Serialize>(template: &str, data: &T) -> Result<String> {
    handlebars_helper!(lpad: |width: u64, v: Json| left_pad(width, v));
    let mut hb = Handlebars::new();
    hb.register_escape_fn(handlebars::no_escape);
    hb.register_helper("lpad", Box::new(lpad));
    hb.register_template_string("text", template)
        .context("compiling template")?;
    hb.render("text", data).context("rendering text")
}
