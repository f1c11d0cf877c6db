use gloci::{GraphStore, KmerIndex};
use gloci::{graph, utils};

use std::time::Instant;
use std::{env, process};

use getopts::Options;
use log::{info, LevelFilter};

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start_time = Instant::now();

    // Parse arguments.
    let config = Config::new()?;
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(config.log_level())
        .init();

    // Check if the index already exists.
    if utils::file_exists(&config.output_file) && !config.overwrite {
        return Err(format!("Index {} already exists", config.output_file));
    }

    // Build the index.
    let graph = graph::load_graph(&config.graph_file)?;
    info!("The graph contains {} nodes with {} loci", graph.max_rank(), graph.total_loci());
    let index = KmerIndex::build(&*graph, config.order, config.both_strands)?;
    index.save_to(&config.output_file)?;

    // Statistics.
    eprintln!(
        "The index contains {} strings with total length {} ({})",
        index.len(), index.total_len(), utils::file_size(&config.output_file).unwrap_or(String::from("unknown size"))
    );
    let seconds = start_time.elapsed().as_secs_f64();
    eprintln!("Used {:.3} seconds", seconds);

    Ok(())
}

//-----------------------------------------------------------------------------

struct Config {
    pub graph_file: String,
    pub output_file: String,
    pub order: usize,
    pub both_strands: bool,
    pub overwrite: bool,
    pub verbosity: usize,
}

impl Config {
    const DEFAULT_ORDER: usize = 32;

    pub fn new() -> Result<Config, String> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optopt("o", "output", "output file name (default: <input>.idx)", "FILE");
        opts.optopt("k", "order", &format!("longest indexed string in bp (default: {})", Self::DEFAULT_ORDER), "INT");
        opts.optflag("", "forward-only", "index only the forward strand");
        opts.optflag("", "overwrite", "overwrite the index file if it exists");
        opts.optflagmulti("v", "verbose", "print more log messages (repeat for more)");
        let matches = opts.parse(&args[1..]).map_err(|x| x.to_string())?;

        let header = format!("Usage: {} [options] graph.(gbz|gfa[.gz])", program);
        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }

        let mut order = Self::DEFAULT_ORDER;
        if let Some(s) = matches.opt_str("k") {
            order = s.parse::<usize>().map_err(|x| format!("--order: {}", x))?;
        }
        if order == 0 {
            return Err(String::from("--order: order must be positive"));
        }

        let graph_file = if let Some(s) = matches.free.first() {
            s.clone()
        } else {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        };
        let output_file = matches.opt_str("o").unwrap_or(format!("{}.idx", graph_file));

        Ok(Config {
            graph_file,
            output_file,
            order,
            both_strands: !matches.opt_present("forward-only"),
            overwrite: matches.opt_present("overwrite"),
            verbosity: matches.opt_count("v"),
        })
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

//-----------------------------------------------------------------------------
