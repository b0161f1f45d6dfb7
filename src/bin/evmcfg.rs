// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use std::error::Error;
use std::fs;
use std::io::{self, Read};

use clap::{arg, Arg, ArgMatches, Command};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use evmcfg::block;
use evmcfg::cfg;
use evmcfg::dot;
use evmcfg::util::FromHexString;

fn main() -> Result<(), Box<dyn Error>> {
    let matches = Command::new("evmcfg")
        .about("Recovers a control-flow graph from EVM bytecode")
        .version("0.1.0")
        .subcommand_required(true)
        .arg(arg!(--verbose "Show verbose output"))
        .subcommand(
            Command::new("graph")
                .about("Recover the control-flow graph for a hex-encoded bytecode sequence and emit it as DOT")
                .arg(Arg::new("code").short('c').long("code").help("Treat <target> as hex bytecode directly, rather than a filename"))
                .arg(Arg::new("target").help("Hex bytecode, or a file/`-` for stdin containing it"))
                .visible_alias("g"),
        )
        .get_matches();

    let verbose = matches.is_present("verbose");
    if verbose {
        init_logging(LevelFilter::Info);
    }

    let ok = match matches.subcommand() {
        Some(("graph", args)) => graph(args),
        _ => unreachable!(),
    }?;
    std::process::exit(if ok { 0 } else { 1 });
}

/// Read the hex-encoded bytecode named by `args`, from a literal
/// `--code` string, a file, or `-`/absent for stdin.
fn read_hex_input(args: &ArgMatches) -> Result<String, Box<dyn Error>> {
    let mut hex = String::new();
    match args.get_one::<String>("target") {
        Some(target) if args.contains_id("code") => hex.push_str(target),
        Some(target) if target != "-" => {
            let context = fs::read_to_string(target)?;
            for l in context.lines() {
                hex.push_str(l.trim());
            }
        }
        _ => {
            io::stdin().read_to_string(&mut hex)?;
        }
    }
    Ok(hex)
}

/// Recover and print the control-flow graph for a bytecode sequence.
fn graph(args: &ArgMatches) -> Result<bool, Box<dyn Error>> {
    let hex = read_hex_input(args)?;
    let bytes = hex.trim().from_hex_string()?;
    log::info!("disassembling {} bytes", bytes.len());
    let blocks = block::segment(&bytes);
    log::info!("segmented into {} blocks", blocks.len());
    let g = cfg::resolve(blocks);
    log::info!(
        "resolved {} edges, {} unresolved jump(s)",
        g.edges.len(),
        g.anywhere_from.len()
    );
    println!("{}", dot::to_dot(&g));
    Ok(true)
}

/// Initialise logging using a suitable pattern.  Only called from the
/// binary entry point; the library itself never touches the logging
/// backend.
pub fn init_logging(level: LevelFilter) {
    let encoder = PatternEncoder::new("[{l}] {m}{n}");
    let stdout = ConsoleAppender::builder().encoder(Box::new(encoder)).build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .unwrap();
    let _handle = log4rs::init_config(config).unwrap();
}
