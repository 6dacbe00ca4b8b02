use std::io::{stdout, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use handlebars::handlebars_helper;
use navlog::{decode_file, DecodeConfig, Family, Metadata};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
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

#[derive(Debug, Clone, Serialize)]
struct ChannelSummary {
    name: String,
    count: usize,
    first: Option<i64>,
    last: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
struct Info {
    filename: String,
    family: Family,
    samples: usize,
    metadata: Metadata,
    channels: Vec<ChannelSummary>,
}

fn summarize(fpath: &Path, family: Family, config: &DecodeConfig) -> Result<Info> {
    let snapshot = decode_file(fpath, family, config)
        .with_context(|| format!("failed to decode {fpath:?}"))?;
    info!(
        path = %fpath.display(),
        session = snapshot.metadata.get("session").unwrap_or_default(),
        "decoded"
    );

    let channels = snapshot
        .channels
        .iter()
        .map(|c| ChannelSummary {
            name: c.name.clone(),
            count: c.samples.len(),
            first: c.samples.first().map(|s| s.ts),
            last: c.samples.last().map(|s| s.ts),
        })
        .collect();

    Ok(Info {
        filename: fpath.to_string_lossy().to_string(),
        family,
        samples: snapshot.sample_count(),
        metadata: snapshot.metadata,
        channels,
    })
}

pub fn info(
    inputs: &[PathBuf],
    family: Family,
    config: &DecodeConfig,
    format: &Format,
) -> Result<()> {
    let infos = inputs
        .par_iter()
        .map(|fpath| summarize(fpath, family, config))
        .collect::<Result<Vec<Info>>>()?;

    let mut out = stdout().lock();
    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, &infos).context("serializing to json")?;
            writeln!(out).context("writing to stdout")
        }
        Format::Text => {
            for info in &infos {
                let data = render_text(info).context("serializing info")?;
                out.write_all(data.as_bytes())
                    .context("writing to stdout")?;
            }
            Ok(())
        }
    }
}

fn render_text(info: &Info) -> Result<String> {
    fn as_text(v: &serde_json::Value) -> String {
        match v {
            serde_json::Value::String(s) => s.to_owned(),
            serde_json::Value::Null => "-".to_string(),
            _ => v.to_string(),
        }
    }
    handlebars_helper!(left_pad: |num: u64, v: Json| {
        let v = as_text(v);
        let width = usize::try_from(num).unwrap_or_default();
        format!("{v:>width$}")
    });
    handlebars_helper!(right_pad: |num: u64, v: Json| {
        let v = as_text(v);
        let width = usize::try_from(num).unwrap_or_default();
        format!("{v:<width$}")
    });
    let mut hb = handlebars::Handlebars::new();
    hb.register_escape_fn(handlebars::no_escape);
    hb.register_helper("lpad", Box::new(left_pad));
    hb.register_helper("rpad", Box::new(right_pad));
    hb.register_template_string("info", TEXT_TEMPLATE)
        .context("registering template")?;

    hb.render("info", &info).context("rendering text")
}

const TEXT_TEMPLATE: &str = r"{{ filename }}
==========================================================================
Family:    {{ family }}
Session:   {{ metadata.session }}
Start:     {{ metadata.start }}
Stop:      {{ metadata.stop }}
Rebase:    {{ metadata.rebase }}
Frames:    {{ metadata.frames }}
Resyncs:   {{ metadata.resync }}
Bad CRC:   {{ metadata.bad_crc }}
Samples:   {{ samples }}
--------------------------------------------------------------------------
Channel          Count                  First                   Last
--------------------------------------------------------------------------
{{ #each channels }}{{ rpad 12 name }}{{ lpad 10 count }}  {{ lpad 21 first }}  {{ lpad 21 last }}
{{/each }}
";
