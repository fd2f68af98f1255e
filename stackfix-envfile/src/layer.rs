use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use indexmap::IndexMap;
use std::io;
use thiserror::Error;
use tracing::debug;

/// One parsed environment file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvLayer {
    pub path: Utf8PathBuf,
    /// Variables in declaration order. A repeated key keeps its first position and its last value.
    pub vars: IndexMap<String, String>,
    /// Non-fatal oddities noticed while parsing (duplicate keys).
    pub warnings: Vec<String>,
}

#[derive(Debug, Error)]
pub enum LayerError {
    /// The file does not exist. Callers usually treat this as an empty layer.
    #[error("environment file not found: {path}")]
    NotFound { path: Utf8PathBuf },

    #[error("unable to read environment file {path}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to parse environment file {path} (line {line}): {message}")]
    Parse {
        path: Utf8PathBuf,
        line: usize,
        message: String,
    },
}

impl LayerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LayerError::NotFound { .. })
    }

    pub fn path(&self) -> &Utf8Path {
        match self {
            LayerError::NotFound { path }
            | LayerError::Read { path, .. }
            | LayerError::Parse { path, .. } => path,
        }
    }
}

/// Which services a layer applies to, derived from its base file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerScope {
    /// `.env`
    AllServices,
    /// `.env.<service>`
    Service(String),
    /// Anything else; applies to no service.
    Unscoped,
}

impl LayerScope {
    pub fn from_path(path: &Utf8Path) -> Self {
        match path.file_name() {
            Some(".env") => LayerScope::AllServices,
            Some(name) => match name.strip_prefix(".env.") {
                Some(service) if !service.is_empty() => LayerScope::Service(service.to_string()),
                _ => LayerScope::Unscoped,
            },
            None => LayerScope::Unscoped,
        }
    }

    pub fn applies_to(&self, service: &str) -> bool {
        match self {
            LayerScope::AllServices => true,
            LayerScope::Service(name) => name == service,
            LayerScope::Unscoped => false,
        }
    }
}

/// Read and parse one environment file.
///
/// Values are taken literally: no `$VAR` substitution happens here, so a `$` in a value survives
/// until the compose fixup escapes it.
pub fn read_layer(path: &Utf8Path) -> Result<EnvLayer, LayerError> {
    let contents = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            LayerError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            LayerError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let layer = EnvLayer::parse(path, &contents)?;
    debug!(path = %path, vars = layer.vars.len(), "loaded environment layer");
    for warning in &layer.warnings {
        debug!(path = %path, "{warning}");
    }
    Ok(layer)
}

impl EnvLayer {
    /// Parse `KEY=VALUE` lines.
    ///
    /// Supported: blank lines, `#` comments, an `export ` prefix, single-quoted (literal) and
    /// double-quoted (escape-processing) values that may span lines, and ` #` trailing comments
    /// on unquoted values.
    pub fn parse(path: impl Into<Utf8PathBuf>, contents: &str) -> Result<Self, LayerError> {
        let path = path.into();
        let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);

        let mut vars = IndexMap::new();
        let mut warnings = Vec::new();
        let mut lines = contents.lines().enumerate();

        while let Some((idx, raw)) = lines.next() {
            let line_no = idx + 1;
            let line = raw.trim_start();
            if line.trim_end().is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line
                .strip_prefix("export ")
                .map(str::trim_start)
                .unwrap_or(line);

            let Some((key, rest)) = line.split_once('=') else {
                return Err(parse_error(
                    &path,
                    line_no,
                    format!("expected KEY=VALUE, found `{}`", line.trim_end()),
                ));
            };

            let key = key.trim();
            if !is_valid_key(key) {
                return Err(parse_error(
                    &path,
                    line_no,
                    format!("invalid variable name `{key}`"),
                ));
            }

            let value = parse_value(rest.trim_start(), &mut lines)
                .map_err(|message| parse_error(&path, line_no, message))?;

            if vars.insert(key.to_string(), value).is_some() {
                warnings.push(format!(
                    "{path}:{line_no}: duplicate key {key} overrides an earlier value"
                ));
            }
        }

        Ok(Self {
            path,
            vars,
            warnings,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

fn parse_error(path: &Utf8Path, line: usize, message: String) -> LayerError {
    LayerError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn parse_value<'a>(
    rest: &str,
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
) -> Result<String, String> {
    let Some(quote) = rest.chars().next().filter(|&c| matches!(c, '"' | '\'')) else {
        return Ok(unquoted(rest));
    };

    let mut buf = rest[1..].to_string();
    loop {
        if let Some(end) = closing_quote(&buf, quote) {
            let trailing = buf[end + 1..].trim();
            if !trailing.is_empty() && !trailing.starts_with('#') {
                return Err(format!(
                    "unexpected characters after closing quote: `{trailing}`"
                ));
            }
            let inner = &buf[..end];
            return Ok(if quote == '"' {
                unescape(inner)
            } else {
                inner.to_string()
            });
        }

        match lines.next() {
            Some((_, next)) => {
                buf.push('\n');
                buf.push_str(next);
            }
            None => return Err("unterminated quoted value".to_string()),
        }
    }
}

fn closing_quote(s: &str, quote: char) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' && quote == '"' {
            escaped = true;
        } else if c == quote {
            return Some(i);
        }
    }
    None
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(c @ ('"' | '\\' | '$')) => out.push(c),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn unquoted(rest: &str) -> String {
    // A comment starts at a `#` preceded by whitespace.
    let bytes = rest.as_bytes();
    let end = (1..bytes.len())
        .find(|&i| bytes[i] == b'#' && bytes[i - 1].is_ascii_whitespace())
        .unwrap_or(bytes.len());
    rest[..end].trim_end().to_string()
}
