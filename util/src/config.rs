use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Search order:
/// - working directory
/// - executable path
///
/// Returns `None` if the file exists in neither place.
pub fn locate_config_file<P>(p: P) -> io::Result<Option<PathBuf>>
where
  P: AsRef<Path>,
{
  let p = p.as_ref();
  if p.try_exists()? {
    return Ok(Some(PathBuf::from(p)));
  }

  if p.is_absolute() {
    return Ok(None);
  }

  let exe = env::current_exe()?;
  let Some(dir) = exe.parent() else {
    return Ok(None);
  };
  let path = dir.join(p);
  if path.try_exists()? {
    Ok(Some(path))
  } else {
    Ok(None)
  }
}

pub fn load_config_file<P>(p: P) -> io::Result<Option<String>>
where
  P: AsRef<Path>,
{
  match locate_config_file(p)? {
    Some(path) => fs::read_to_string(path).map(Some),
    None => Ok(None),
  }
}
