//! Structured output for command results.

use std::io::Write;

use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// YAML format (default).
    #[default]
    Yaml,
    /// JSON format.
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json { OutputFormat::Json } else { OutputFormat::Yaml }
    }
}

/// Renders values to stdout or another writer.
pub struct Output {
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Serializes `value` in the configured format.
    pub fn render<T: Serialize>(&self, value: &T) -> anyhow::Result<String> {
        Ok(match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
        })
    }

    /// Writes `value` to `w`, newline terminated.
    pub fn write_to<T: Serialize, W: Write>(&self, w: &mut W, value: &T) -> anyhow::Result<()> {
        let rendered = self.render(value)?;
        w.write_all(rendered.as_bytes())?;
        if !rendered.ends_with('\n') {
            w.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Writes `value` to stdout.
    pub fn write<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        self.write_to(&mut std::io::stdout().lock(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        name: &'static str,
        packets: u32,
    }

    #[test]
    fn test_yaml_and_json() {
        let row = Row { name: "a", packets: 3 };

        let mut buf = Vec::new();
        Output::new(OutputFormat::Yaml).write_to(&mut buf, &row).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "name: a\npackets: 3\n");

        let mut buf = Vec::new();
        Output::new(OutputFormat::from_json_flag(true))
            .write_to(&mut buf, &row)
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["packets"], 3);
    }
}
