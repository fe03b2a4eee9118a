use std::io::{stdout, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use marine::section::Section;
use serde::Serialize;

use crate::kind::Kind;
use crate::render::{self, Output};

#[derive(Debug, Clone, Serialize)]
struct Row {
    index: usize,
    title: &'static str,
    #[serde(flatten)]
    section: Section,
}

fn emit<T: Serialize>(output: &Output, template: &str, data: &T) -> Result<()> {
    match output {
        Output::Json => serde_json::to_writer_pretty(stdout(), data).context("serializing to json"),
        Output::Text => {
            let text = render::text(template, data)?;
            stdout()
                .write_all(text.as_bytes())
                .context("writing to stdout")
        }
    }
}

pub fn sections(fpath: &Path, kind: Kind, output: &Output) -> Result<()> {
    let buf = std::fs::read(fpath).with_context(|| format!("reading {fpath:?}"))?;
    let format = kind.format(&buf);
    let rows: Vec<Row> = format
        .split(&buf)
        .into_iter()
        .enumerate()
        .map(|(index, section)| Row {
            index,
            title: format.title(section.kind),
            section,
        })
        .collect();
    emit(output, SECTIONS_TEMPLATE, &rows)
}

#[derive(Debug, Clone, Serialize)]
struct Field {
    name: String,
    value: String,
    #[serde(rename = "type")]
    typ: String,
    size: usize,
}

#[derive(Debug, Clone, Serialize)]
struct Described {
    index: usize,
    title: &'static str,
    section: Section,
    fields: Vec<Field>,
}

pub fn describe(fpath: &Path, kind: Kind, index: usize, output: &Output) -> Result<()> {
    let buf = std::fs::read(fpath).with_context(|| format!("reading {fpath:?}"))?;
    let format = kind.format(&buf);
    let sections = format.split(&buf);
    let Some(section) = sections.get(index).copied() else {
        bail!("section {index} out of range; file has {} sections", sections.len());
    };
    let record = format
        .describe(&buf, &section)
        .with_context(|| format!("describing section {index} at offset {}", section.offset))?;

    if let Output::Json = output {
        return serde_json::to_writer_pretty(stdout(), &record).context("serializing to json");
    }
    let described = Described {
        index,
        title: format.title(section.kind),
        section,
        fields: record
            .iter()
            .map(|(name, d)| Field {
                name: name.to_string(),
                value: d.value.to_string(),
                typ: d.typ.to_string(),
                size: d.size,
            })
            .collect(),
    };
    emit(output, DESCRIBE_TEMPLATE, &described)
}

const SECTIONS_TEMPLATE: &str = r"Index     Offset   Length  Kind    Valid  Title
{{ #each this }}{{ lpad 5 index }} {{ lpad 10 offset }} {{ lpad 8 length }}  {{ lpad 6 kind }}  {{ lpad 5 valid }}  {{ title }}
{{ /each }}";

const DESCRIBE_TEMPLATE: &str = r"{{ title }} #{{ index }} at {{ section.offset }}
===============================================================================================
{{ #each fields }}{{ name }}: {{ value }} ({{ typ }}, {{ size }})
{{ /each }}";
