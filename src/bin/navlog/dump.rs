use std::io::{stdout, BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use navlog::{decode_file, DecodeConfig, Family};

pub fn dump(
    input: &Path,
    family: Family,
    config: &DecodeConfig,
    channels: &[String],
) -> Result<()> {
    let mut snapshot = decode_file(input, family, config)
        .with_context(|| format!("failed to decode {input:?}"))?;

    if !channels.is_empty() {
        for name in channels {
            if snapshot.get(name).is_none() {
                bail!("{name} is not a {family} channel");
            }
        }
        snapshot.channels.retain(|c| channels.contains(&c.name));
    }

    let mut out = BufWriter::new(stdout().lock());
    serde_json::to_writer(&mut out, &snapshot).context("serializing to json")?;
    writeln!(out).context("writing to stdout")?;
    out.flush().context("writing to stdout")
}
