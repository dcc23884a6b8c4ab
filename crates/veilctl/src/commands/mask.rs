use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use std::io::{self, BufRead, BufWriter, Write};
use tracing::{debug, info};
use veil_core::{decode_copy_row, encode_copy_row, Record};
use veil_transformers::{Pipeline, ValidationCollector};

const END_OF_DATA: &[u8] = b"\\.";

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = super::load(matches)?;

    let mut collector = ValidationCollector::new();
    let mut pipeline = match super::build_pipeline(&config, &mut collector) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            eprintln!("{}", serde_json::to_string_pretty(collector.warnings())?);
            bail!("configuration is invalid: {}", err);
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let rows = mask_rows(&mut pipeline, stdin.lock(), BufWriter::new(stdout.lock()))?;

    info!(table = %config.table.name, rows, "masking finished");
    Ok(())
}

/// Masks COPY text rows until end of input or the `\.` marker. The first
/// failing row aborts the run.
pub fn mask_rows<R: BufRead, W: Write>(
    pipeline: &mut Pipeline,
    input: R,
    mut output: W,
) -> Result<usize> {
    let mut record = Record::new(pipeline.table_driver().clone());
    let mut rows = 0;

    pipeline.init()?;

    for (line_number, line) in input.split(b'\n').enumerate() {
        let mut line = line?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if line == END_OF_DATA {
            debug!(line = line_number + 1, "end of data marker");
            break;
        }

        record
            .set_row(decode_copy_row(&line))
            .with_context(|| format!("row {}", line_number + 1))?;
        pipeline
            .transform(&mut record)
            .with_context(|| format!("row {}", line_number + 1))?;

        output.write_all(&encode_copy_row(record.values()))?;
        output.write_all(b"\n")?;
        rows += 1;
    }

    output.flush()?;
    pipeline.done()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApplicationConfig;

    fn pipeline(config: &str) -> Pipeline {
        let config: ApplicationConfig = toml::from_str(config).unwrap();
        let mut collector = ValidationCollector::new();
        crate::commands::build_pipeline(&config, &mut collector).unwrap()
    }

    const CONFIG: &str = r#"
[table]
name = "users"
columns = [ { name = "id", type = "int4" }, { name = "title", type = "text" } ]

[[transformers]]
name = "Template"
[transformers.params]
column = "title"
template = "{{ .GetValue | upper }}"
keep_null = true
"#;

    #[test]
    fn test_masks_rows() {
        let mut pipeline = pipeline(CONFIG);
        let input = b"1\thello\n2\t\\N\n\\.\n3\tignored\n";
        let mut output = Vec::new();

        let rows = mask_rows(&mut pipeline, &input[..], &mut output).unwrap();

        assert_eq!(rows, 2);
        assert_eq!(String::from_utf8(output).unwrap(), "1\tHELLO\n2\t\\N\n");
    }

    #[test]
    fn test_column_count_mismatch() {
        let mut pipeline = pipeline(CONFIG);
        let mut output = Vec::new();

        let err = mask_rows(&mut pipeline, &b"1\thello\textra\n"[..], &mut output).unwrap_err();

        assert_eq!(err.to_string(), "row 1");
        assert!(output.is_empty());
    }
}
