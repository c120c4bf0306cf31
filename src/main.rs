#[macro_use] extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate regex;
extern crate term_grid;
extern crate thiserror;

pub mod assembler;

use clap::{Arg, ArgMatches, App, AppSettings};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use std::fs::File;
use std::io::Write;
use std::path::Path;

fn main() {
    let args = process_arguments();
    initialize_logging(args.occurrences_of("verbose"));

    debug!("Arguments:\n\tVerbosity: {}\n\tOutfile: {}\n\tInfile: {}",
        verbosity(args.occurrences_of("verbose")),
        args.value_of("output").unwrap_or("a.out"),
        args.value_of("INPUT").unwrap_or_default()
    );

    let extra = ignored_arguments(&args);
    if !extra.is_empty() {
        warn!("Ignoring additional arguments: {}", extra.join(" "));
    }

    // Read the specified input file.
    let ipath = Path::new(args.value_of("INPUT").unwrap_or_default());

    let ifile = match File::open(&ipath) {
        Err(err) => {
            error!("fatal: unable to open input file `{}`: {}", ipath.display(), err);
            std::process::exit(1);
        },
        Ok(file) => file,
    };

    let assembly = match assembler::assemble(ifile) {
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        },
        Ok(assembly) => assembly,
    };
    info!("assembled {} word(s) from `{}`", assembly.image.cursor(), ipath.display());

    if args.is_present("print-debug") {
        print_listing(&assembly);
    }

    let opath = Path::new(args.value_of("output").unwrap_or("a.out"));

    let mut ofile = match File::create(&opath) {
        Err(err) => {
            error!("fatal: unable to open output file `{}`: {}", opath.display(), err);
            std::process::exit(1);
        },
        Ok(file) => file,
    };

    if let Err(err) = ofile.write_all(&assembly.image.serialize()) {
        error!("fatal: unable to write to output file `{}`: {}", opath.display(), err);
        std::process::exit(1);
    }
}

/// Prints each emitted word next to the statement it came from.
/// Words show their final value, after forward references were patched.
fn print_listing(assembly: &assembler::Assembly) {
    let mut grid = Grid::new(GridOptions {
        filling:     Filling::Spaces(1),
        direction:   Direction::LeftToRight,
    });

    for entry in &assembly.listing {
        let word = assembly.image.word(entry.offset).unwrap_or_default();
        grid.add(Cell::from(format!("0x{:04X}:", entry.offset)));
        grid.add(Cell::from(format!("{:>4}", entry.line)));
        grid.add(Cell::from(entry.text.clone()));
        grid.add(Cell::from("=>".to_string()));
        grid.add(Cell::from(format!("0x{:04X}", word)));
    }

    println!("{}", grid.fit_into_columns(5));
}

fn process_arguments() -> ArgMatches<'static> {
    cli().get_matches()
}

/// Everything after the source file, which is accepted but unused.
fn ignored_arguments<'a>(args: &'a ArgMatches) -> Vec<&'a str> {
    args.values_of("EXTRA").map(|extra| extra.collect()).unwrap_or_default()
}

fn cli() -> App<'static, 'static> {
    App::new(crate_name!())
        .setting(AppSettings::AllowLeadingHyphen)
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .arg(Arg::with_name("INPUT")
            .help("Sets the source file to assemble")
            .required(true)
            .multiple(false)
            .index(1))
        .arg(Arg::with_name("EXTRA")
            .help("Additional arguments are ignored")
            .multiple(true)
            .allow_hyphen_values(true)
            .hidden(true)
            .index(2))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .takes_value(false)
            .help("Sets the level of verbosity"))
        .arg(Arg::with_name("output")
            .short("o")
            .takes_value(true)
            .default_value("a.out")
            .help("write the image to an outfile"))
        .arg(Arg::with_name("print-debug")
            .short("d")
            .alias("show")
            .alias("s")
            .takes_value(false)
            .help("prints the assembly listing to STDOUT"))
}

fn verbosity(occurrences: u64) -> log::LevelFilter {
    match occurrences {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    }
}

fn initialize_logging(occurrences: u64) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(verbosity(occurrences))
        // Fatal diagnostics stay visible when the listing is redirected.
        .chain(fern::Dispatch::new()
            .filter(|metadata| metadata.level() != log::Level::Error)
            .chain(std::io::stdout()))
        .chain(fern::Dispatch::new()
            .level(log::LevelFilter::Error)
            .chain(std::io::stderr()))
        .apply().ok();
}
