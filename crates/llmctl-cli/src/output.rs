//! Rendering a decoded document as text or JSON.

use llmctl_gguf::{GgufArray, GgufFile, GgufValue};
use std::io::{self, Write};

/// Output format for the decoded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text (default).
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown format '{other}'. Expected one of: text, json")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub format: OutputFormat,
    /// Array elements shown per metadata value in text mode; 0 hides previews.
    pub max_array_items: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { format: OutputFormat::Text, max_array_items: 8 }
    }
}

pub fn render<W: Write>(w: &mut W, file: &GgufFile, opts: &RenderOptions) -> io::Result<()> {
    match opts.format {
        OutputFormat::Text => render_text(w, file, opts.max_array_items),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *w, file)?;
            writeln!(w)
        }
    }
}

fn render_text<W: Write>(w: &mut W, file: &GgufFile, max_items: usize) -> io::Result<()> {
    writeln!(
        w,
        "Parsed GGUF: version={}, tensor_count={}, metadata_kv_count={}",
        file.header.version, file.header.tensor_count, file.header.metadata_kv_count
    )?;

    for (i, kv) in file.metadata.iter().enumerate() {
        writeln!(w, "Metadata[{i}] Key={:?} => Value: {}", kv.key, kv.value)?;
        match &kv.value {
            GgufValue::Array(a) if max_items > 0 && !a.is_empty() => {
                writeln!(w, "    {}", array_preview(a, max_items))?;
            }
            _ => {}
        }
    }

    for (i, t) in file.tensors.iter().enumerate() {
        writeln!(
            w,
            "Tensor[{i}]: name={:?}, dims={:?}, type={}, offset={}",
            t.name,
            t.dims,
            t.dtype_name(),
            t.offset
        )?;
    }
    Ok(())
}

fn array_preview(a: &GgufArray, max_items: usize) -> String {
    let mut items: Vec<String> = a.iter().take(max_items).map(element_preview).collect();
    if a.len() > max_items {
        items.push(format!("... {} more", a.len() - max_items));
    }
    format!("[{}]", items.join(", "))
}

fn element_preview(v: &GgufValue) -> String {
    match v {
        GgufValue::String(s) => format!("{s:?}"),
        GgufValue::Array(_) => v.to_string(),
        scalar => serde_json::to_string(scalar).unwrap_or_else(|_| scalar.to_string()),
    }
}
