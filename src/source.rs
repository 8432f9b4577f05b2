use crate::error::{Error, Result};
use std::fmt::{self, Display, Formatter};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::PathBuf;

pub const DEFAULT_INDEX_URL: &str =
  "http://encoding.spec.whatwg.org/index-gbk.txt";

/// Where the GBK index comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
  Url(String),
  File(PathBuf),
  Text(String),
}

impl Default for Source {
  fn default() -> Self {
    Self::Url(DEFAULT_INDEX_URL.to_owned())
  }
}

impl Display for Source {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Self::Url(url) => write!(f, "{}", url),
      Self::File(path) => write!(f, "{}", path.display()),
      Self::Text(_) => write!(f, "<embedded>"),
    }
  }
}

impl Source {
  pub fn open(&self) -> Result<Lines> {
    let reader: Box<dyn BufRead> = match self {
      Self::Url(url) => {
        log::info!("fetching {}", url);
        let response =
          reqwest::blocking::get(url).map_err(|err| Error::unavailable(self, err))?;
        let status = response.status();
        if !status.is_success() {
          return Err(Error::unavailable(self, format!("HTTP status {}", status)));
        }
        Box::new(BufReader::new(response))
      }
      Self::File(path) => {
        log::info!("reading {}", path.display());
        let file = File::open(path).map_err(|err| Error::unavailable(self, err))?;
        Box::new(BufReader::new(file))
      }
      Self::Text(text) => Box::new(Cursor::new(text.clone().into_bytes())),
    };

    Ok(Lines {
      desc: self.to_string(),
      inner: reader.lines(),
    })
  }
}

/// Raw lines of an opened source. Consumed once; the underlying stream is
/// closed when this is dropped.
pub struct Lines {
  desc: String,
  inner: std::io::Lines<Box<dyn BufRead>>,
}

impl Lines {
  pub fn description(&self) -> &str {
    &self.desc
  }
}

impl Iterator for Lines {
  type Item = Result<String>;

  fn next(&mut self) -> Option<Self::Item> {
    self
      .inner
      .next()
      .map(|line| line.map_err(|err| Error::unavailable(&self.desc, err)))
  }
}
