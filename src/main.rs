use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use kvblog::build::build_site;
use kvblog::config::Config;
use kvblog::new_post::new_post;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use std::error::Error;
use std::path::{Path, PathBuf};

fn main() {
    let project_arg = Arg::with_name("project")
        .long("project")
        .short("p")
        .takes_value(true)
        .value_name("DIR")
        .help("The project directory (defaults to the current directory)");

    let matches = App::new("kvblog")
        .version(crate_version!())
        .about("Builds a static blog from Markdown posts")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .help("Enables debug logging"),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site")
                .arg(project_arg.clone())
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("The output directory (defaults to `_site` in the project)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("new")
                .about("Creates a new draft post")
                .arg(project_arg)
                .arg(
                    Arg::with_name("title")
                        .required(true)
                        .index(1)
                        .help("The post title"),
                ),
        )
        .get_matches();

    let level = if matches.is_present("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("failed to initialize logging: {}", e);
    }

    let result = match matches.subcommand() {
        ("build", Some(matches)) => build(matches),
        ("new", Some(matches)) => new(matches),
        _ => Ok(()),
    };

    if let Err(e) = result {
        error!("{}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            error!("  caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn project_directory(matches: &ArgMatches) -> Result<PathBuf, Box<dyn Error>> {
    Ok(match matches.value_of("project") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    })
}

fn build(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let config = Config::from_directory(
        &project_directory(matches)?,
        matches.value_of("output").map(Path::new),
    )?;
    build_site(&config)?;
    Ok(())
}

fn new(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let config = Config::from_directory(&project_directory(matches)?, None)?;
    let title = matches.value_of("title").unwrap_or_default();
    let today = chrono::Local::now().date_naive();
    let path = new_post(&config.posts_source_directory, title, today)?;
    info!("Prepared file: {}", path.display());
    Ok(())
}
