use std::collections::BTreeMap;
use std::io::{stdout, Write};
use std::path::Path;

use anyhow::{Context, Result};
use marine::section::Section;
use marine::{ctd, em, pd0, segy};
use serde::Serialize;
use tracing::{debug, warn};

use crate::kind::Kind;
use crate::render::{self, Output};

#[derive(Debug, Clone, Default, Serialize)]
struct KindSummary {
    title: &'static str,
    count: usize,
    invalid: usize,
}

#[derive(Debug, Clone, Serialize)]
struct Info {
    filename: String,
    kind: &'static str,
    bytes: usize,
    sections: usize,
    invalid: usize,
    kinds: BTreeMap<String, KindSummary>,
    meta: serde_json::Value,
}

fn meta(kind: Kind, buf: &[u8]) -> Result<serde_json::Value> {
    let value = match kind {
        Kind::Em => serde_json::to_value(em::Context::new(buf).meta()),
        Kind::Pd0 => serde_json::to_value(pd0::Context::new(buf, true).meta()),
        Kind::Segy => serde_json::to_value(segy::Context::new(buf).meta()),
        Kind::Ctd => match ctd::Context::new(buf, ctd::ScanLayout::default()) {
            Ok(ctx) => serde_json::to_value(ctx.meta()),
            Err(err) => {
                warn!(%err, "no ctd meta");
                return Ok(serde_json::Value::Null);
            }
        },
        Kind::Sbd => return Ok(serde_json::Value::Null),
    };
    value.context("serializing meta")
}

fn summarize(fpath: &Path, kind: Kind, buf: &[u8], sections: &[Section]) -> Result<Info> {
    let format = kind.format(buf);
    let mut kinds: BTreeMap<String, KindSummary> = BTreeMap::new();
    for s in sections {
        let summary = kinds.entry(format!("0x{:04x}", s.kind)).or_default();
        summary.title = format.title(s.kind);
        summary.count += 1;
        if !s.valid {
            summary.invalid += 1;
        }
    }
    debug!(kinds = kinds.len(), "summarized sections");

    Ok(Info {
        filename: fpath.to_string_lossy().to_string(),
        kind: kind.name(),
        bytes: buf.len(),
        sections: sections.len(),
        invalid: sections.iter().filter(|s| !s.valid).count(),
        kinds,
        meta: meta(kind, buf)?,
    })
}

pub fn info(fpath: &Path, kind: Kind, output: &Output) -> Result<()> {
    let buf = std::fs::read(fpath).with_context(|| format!("reading {fpath:?}"))?;
    let sections = kind.format(&buf).split(&buf);
    let info = summarize(fpath, kind, &buf, &sections)?;

    match output {
        Output::Json => {
            serde_json::to_writer_pretty(stdout(), &info).context("serializing to json")
        }
        Output::Text => {
            let data = render::text(TEXT_TEMPLATE, &info).context("rendering info")?;
            stdout()
                .write_all(data.as_bytes())
                .context("writing to stdout")
        }
    }
}

const TEXT_TEMPLATE: &str = r"{{ filename }}
===============================================================================================
Kind:     {{ kind }}
Bytes:    {{ bytes }}
Sections: {{ sections }}
Invalid:  {{ invalid }}

Type    Count  Invalid  Title
{{ #each kinds }}{{ @key }} {{ lpad 7 count }} {{ lpad 8 invalid }}  {{ title }}
{{ /each }}{{ #if meta }}
{{ #each meta }}{{ @key }}: {{ this }}
{{ /each }}{{ /if }}";
