use gbk_tables::{EmitOptions, OrderPolicy, Source, Visibility};
use linked_hash_map::LinkedHashMap;
use std::io;
use std::path::{Path, PathBuf};
use util::config;
use yaml_rust::{Yaml, YamlLoader};

pub const DEFAULT_CONFIG_FILE: &str = "gen_gbk.yaml";

/// Strict and reserved keywords of the 2021 edition.
const RUST_KEYWORDS: &[&str] = &[
  "abstract", "as", "async", "await", "become", "box", "break", "const",
  "continue", "crate", "do", "dyn", "else", "enum", "extern", "false", "final",
  "fn", "for", "if", "impl", "in", "let", "loop", "macro", "match", "mod",
  "move", "mut", "override", "priv", "pub", "ref", "return", "self", "Self",
  "static", "struct", "super", "trait", "true", "try", "type", "typeof",
  "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
  pub source: Source,
  pub output: EmitOptions,
  pub order: OrderPolicy,
}

#[derive(Debug)]
pub enum ConfigError {
  Io(io::Error),
  Yaml(yaml_rust::ScanError),
  Other(String),
}

impl std::fmt::Display for ConfigError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Io(err) => write!(f, "{}", err),
      Self::Yaml(err) => write!(f, "{}", err),
      Self::Other(msg) => write!(f, "{}", msg),
    }
  }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
  fn from(err: io::Error) -> Self {
    Self::Io(err)
  }
}

impl From<yaml_rust::ScanError> for ConfigError {
  fn from(err: yaml_rust::ScanError) -> Self {
    Self::Yaml(err)
  }
}

impl From<String> for ConfigError {
  fn from(err: String) -> Self {
    Self::Other(err)
  }
}

impl From<&str> for ConfigError {
  fn from(err: &str) -> Self {
    Self::Other(err.to_owned())
  }
}

/// Loads the default config file, falling back to the built-in defaults if
/// there is none.
pub fn load_config() -> Result<Config, ConfigError> {
  match config::load_config_file(DEFAULT_CONFIG_FILE)? {
    Some(content) => parse_config(&content),
    None => {
      log::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
      Ok(Config::default())
    }
  }
}

/// Loads an explicitly named config file, which must exist.
pub fn load_config_from<P>(path: P) -> Result<Config, ConfigError>
where
  P: AsRef<Path>,
{
  let path = path.as_ref();
  match config::load_config_file(path)? {
    Some(content) => parse_config(&content),
    None => Err(format!("config file {} not found", path.display()).into()),
  }
}

pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
  let mut docs = YamlLoader::load_from_str(content)?;
  let mut config = Config::default();
  let Some(doc) = docs.pop() else {
    return Ok(config);
  };
  if doc.is_null() {
    return Ok(config);
  }

  let mut obj = doc.into_hash().ok_or("toplevel is not object")?;

  // source
  if let Some(source) = obj.remove(&Yaml::String("source".to_owned())) {
    if !source.is_null() {
      let source = source.into_hash().ok_or("source is not object")?;
      config.source = load_source_config(source)?;
    }
  }

  // output
  if let Some(output) = obj.remove(&Yaml::String("output".to_owned())) {
    if !output.is_null() {
      let output = output.into_hash().ok_or("output is not object")?;
      config.output = load_output_config(output)?;
    }
  }

  // order
  if let Some(order) = read_string(&mut obj, "", "order")? {
    config.order = match order.as_str() {
      "lenient" => OrderPolicy::Lenient,
      "strict" => OrderPolicy::Strict,
      _ => return Err(format!("order must be lenient or strict, found '{}'", order).into()),
    };
  }

  if let Some((key, _)) = obj.pop_front() {
    return Err(format!("superfluous field {}", yaml_to_string(&key)).into());
  }

  Ok(config)
}

fn load_source_config(
  mut source: LinkedHashMap<Yaml, Yaml>,
) -> Result<Source, ConfigError> {
  let url = read_string(&mut source, "source", "url")?;
  let file = read_string(&mut source, "source", "file")?;

  if let Some((key, _)) = source.pop_front() {
    return Err(
      format!("superfluous field {} in source", yaml_to_string(&key)).into(),
    );
  }

  Ok(match (file, url) {
    (Some(file), url) => {
      if let Some(url) = url {
        log::debug!("source.file overrides source.url {}", url);
      }
      Source::File(PathBuf::from(file))
    }
    (None, Some(url)) => Source::Url(url),
    (None, None) => Source::default(),
  })
}

fn load_output_config(
  mut output: LinkedHashMap<Yaml, Yaml>,
) -> Result<EmitOptions, ConfigError> {
  let mut options = EmitOptions::default();

  if let Some(name) = read_ident(&mut output, "output", "decode-name")? {
    options.decode_name = name;
  }

  if let Some(name) = read_ident(&mut output, "output", "encode-name")? {
    options.encode_name = name;
  }

  if let Some(vis) = read_string(&mut output, "output", "visibility")? {
    options.visibility = match vis.as_str() {
      "pub" => Visibility::Pub,
      "pub(crate)" => Visibility::PubCrate,
      "private" => Visibility::Private,
      _ => {
        return Err(
          format!("output.visibility is invalid visibility '{}'", vis).into(),
        )
      }
    };
  }

  if let Some(url) = read_string(&mut output, "output", "spec-url")? {
    options.spec_url = url;
  }

  if options.decode_name == options.encode_name {
    return Err("output.decode-name and output.encode-name are the same".into());
  }

  if let Some((key, _)) = output.pop_front() {
    return Err(
      format!("superfluous field {} in output", yaml_to_string(&key)).into(),
    );
  }

  Ok(options)
}

fn field_path(ctx: &str, name: &str) -> String {
  if ctx.is_empty() {
    name.to_owned()
  } else {
    format!("{}.{}", ctx, name)
  }
}

fn read_string(
  obj: &mut LinkedHashMap<Yaml, Yaml>,
  ctx: impl AsRef<str>,
  name: impl ToString,
) -> Result<Option<String>, ConfigError> {
  let name = name.to_string();

  if let Some(value) = obj.remove(&Yaml::String(name.clone())) {
    let value = value
      .into_string()
      .ok_or_else(|| format!("{} is not string", field_path(ctx.as_ref(), &name)))?;
    Ok(Some(value))
  } else {
    Ok(None)
  }
}

fn read_ident(
  obj: &mut LinkedHashMap<Yaml, Yaml>,
  ctx: impl AsRef<str>,
  name: impl ToString,
) -> Result<Option<String>, ConfigError> {
  let ctx = ctx.as_ref();
  let name = name.to_string();

  match read_string(obj, ctx, &name)? {
    Some(ident) => {
      let mut chars = ident.chars();
      let valid = chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && ident != "_";
      if RUST_KEYWORDS.contains(&ident.as_str()) {
        return Err(
          format!("{} must not be the keyword '{}'", field_path(ctx, &name), ident)
            .into(),
        );
      }
      if !valid {
        return Err(
          format!("{} is not a valid identifier", field_path(ctx, &name)).into(),
        );
      }
      Ok(Some(ident))
    }
    None => Ok(None),
  }
}

fn yaml_to_string(yaml: &Yaml) -> String {
  match yaml {
    Yaml::Null => "~".to_owned(),
    Yaml::Boolean(true) => "true".to_owned(),
    Yaml::Boolean(false) => "false".to_owned(),
    Yaml::Hash(_) => "<object>".to_owned(),
    Yaml::Array(_) => "<array>".to_owned(),
    Yaml::String(s) => format!("'{}'", s.replace('\'', "\\'")),
    Yaml::Integer(n) => n.to_string(),
    Yaml::Real(n) => n.to_string(),
    _ => "<value>".to_owned(),
  }
}
