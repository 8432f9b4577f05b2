use clap::{crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};
use gbk_tables::{Emitter, OrderPolicy, Source};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process;

fn cli() -> Command<'static> {
  Command::new("gen_gbk")
    .version(crate_version!())
    .about("Generate the GBK decode and encode tables as Rust source")
    .arg(
      Arg::new("url")
        .short('u')
        .long("url")
        .value_name("URL")
        .help("fetch the GBK index from URL")
        .takes_value(true)
        .value_parser(validate_url)
        .conflicts_with("file"),
    )
    .arg(
      Arg::new("file")
        .short('f')
        .long("file")
        .value_name("FILE")
        .help("read the GBK index from a local file")
        .takes_value(true)
        .value_parser(value_parser!(PathBuf)),
    )
    .arg(
      Arg::new("output")
        .short('o')
        .long("output")
        .value_name("OUTPUT")
        .help("file for the generated tables, defaults to stdout")
        .takes_value(true)
        .value_parser(value_parser!(PathBuf)),
    )
    .arg(
      Arg::new("config")
        .short('c')
        .long("config")
        .value_name("CONFIG")
        .help("configuration file, defaults to gen_gbk.yaml if present")
        .takes_value(true)
        .value_parser(value_parser!(PathBuf)),
    )
    .arg(
      Arg::new("strict")
        .long("strict")
        .help("reject index records that are not in ascending pointer order")
        .action(ArgAction::SetTrue),
    )
    .arg(
      Arg::new("verbose")
        .short('v')
        .help("log more, may be repeated")
        .action(ArgAction::Count),
    )
}

fn main() {
  let matches = cli().get_matches();

  init_logging(matches.get_count("verbose"));

  if let Err(err) = run(&matches) {
    eprintln!("error: {}", err);
    process::exit(1);
  }
}

fn init_logging(verbose: u8) {
  let level = match verbose {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
    .init();
}

fn settings(matches: &ArgMatches) -> Result<config::Config, config::ConfigError> {
  let mut settings = match matches.get_one::<PathBuf>("config") {
    Some(path) => config::load_config_from(path)?,
    None => config::load_config()?,
  };

  if let Some(url) = matches.get_one::<String>("url") {
    settings.source = Source::Url(url.clone());
  }
  if let Some(file) = matches.get_one::<PathBuf>("file") {
    settings.source = Source::File(file.clone());
  }
  if matches.get_flag("strict") {
    settings.order = OrderPolicy::Strict;
  }

  Ok(settings)
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
  let settings = settings(matches)?;
  log::debug!("source: {}, order: {:?}", settings.source, settings.order);

  // build before touching the output so a failed run leaves nothing behind
  let tables = gbk_tables::build_tables(&settings.source, settings.order)?;
  let emitter = Emitter::new(&settings.output);

  match matches.get_one::<PathBuf>("output") {
    Some(path) => {
      let output = BufWriter::new(File::create(path)?);
      emitter.emit(&tables, output)?;
      log::info!("wrote {}", path.display());
    }
    None => {
      let stdout = io::stdout();
      emitter.emit(&tables, BufWriter::new(stdout.lock()))?;
    }
  }

  Ok(())
}

fn validate_url(s: &str) -> Result<String, String> {
  if s.starts_with("http://") || s.starts_with("https://") {
    Ok(s.to_owned())
  } else {
    Err("URL must start with http:// or https://".to_owned())
  }
}
