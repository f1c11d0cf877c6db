use gloci::{BranchPolicy, DeadEndPolicy, GraphScan, GraphStore, KmerIndex, ScanParams, ScanSession, SeedIndex};
use gloci::{graph, utils};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;
use std::{env, process};

use getopts::Options;
use log::{info, warn, LevelFilter};

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    // Parse arguments.
    let config = Config::new()?;
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(config.log_level())
        .init();

    // Load the inputs.
    let graph = graph::load_graph(&config.graph_file)?;
    info!("The graph contains {} nodes with {} loci", graph.max_rank(), graph.total_loci());
    if graph.total_loci() == 0 {
        warn!("The graph has no loci to scan");
    }
    let index = KmerIndex::load_from(&config.index_file)?;
    info!(
        "The index contains {} strings of order {} ({})",
        index.len(), index.order(), utils::file_size(&config.index_file).unwrap_or(String::from("unknown size"))
    );

    // Scan the graph.
    let mut scan = GraphScan::new(&*graph, &index, config.params)?;
    let session = Arc::new(ScanSession::new(scan.total_loci()));
    report_progress_on_signal(Arc::clone(&session))?;
    let file = File::create(&config.output_file).map_err(|x| {
        format!("Cannot create {}: {}", config.output_file, x)
    })?;
    let mut output = BufWriter::new(file);
    let report = scan.run(&session, Some(&mut output))?;
    output.flush().map_err(|x| x.to_string())?;
    info!("Wrote the uncovered loci to {}", config.output_file);

    println!("{}", report);
    println!("Done in {:.3} seconds.", report.seconds);

    Ok(())
}

//-----------------------------------------------------------------------------

// Prints the progress of the scan to stdout on SIGUSR1.
#[cfg(unix)]
fn report_progress_on_signal(session: Arc<ScanSession>) -> Result<(), String> {
    use signal_hook::consts::SIGUSR1;
    use signal_hook::iterator::Signals;
    use std::thread;

    let mut signals = Signals::new([SIGUSR1]).map_err(|x| format!("Cannot register SIGUSR1: {}", x))?;
    thread::spawn(move || {
        for _ in signals.forever() {
            println!("{}", session.snapshot());
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn report_progress_on_signal(_: Arc<ScanSession>) -> Result<(), String> {
    Ok(())
}

//-----------------------------------------------------------------------------

struct Config {
    pub graph_file: String,
    pub index_file: String,
    pub output_file: String,
    pub params: ScanParams,
    pub verbosity: usize,
}

impl Config {
    pub fn new() -> Result<Config, String> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optopt("g", "gcsa", "seed index file (required)", "FILE");
        opts.optopt("l", "seed-len", "seed length in bp (required)", "INT");
        opts.optopt("o", "output", "output file for the uncovered loci (required)", "FILE");
        opts.optflag("", "all-paths", "a locus is uncovered only if the seed is absent on every walk");
        opts.optflag("", "dead-end-uncovered", "count truncated seeds at dead ends as uncovered");
        opts.optflagmulti("v", "verbose", "print more log messages (repeat for more)");
        let matches = opts.parse(&args[1..]).map_err(|x| x.to_string())?;

        let header = format!("Usage: {} [options] graph.(gbz|gfa[.gz])", program);
        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }

        let index_file = matches.opt_str("g").ok_or(String::from("Seed index must be provided with --gcsa"))?;
        let output_file = matches.opt_str("o").ok_or(String::from("Output file must be provided with --output"))?;
        let seed_len = matches.opt_str("l").ok_or(String::from("Seed length must be provided with --seed-len"))?;
        let seed_len = seed_len.parse::<usize>().map_err(|x| format!("--seed-len: {}", x))?;
        if seed_len == 0 {
            return Err(String::from("--seed-len: seed length must be positive"));
        }
        let mut params = ScanParams::new(seed_len);
        if matches.opt_present("all-paths") {
            params.branch_policy = BranchPolicy::AllAbsent;
        }
        if matches.opt_present("dead-end-uncovered") {
            params.dead_end_policy = DeadEndPolicy::Uncovered;
        }

        let graph_file = if let Some(s) = matches.free.first() {
            s.clone()
        } else {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        };

        Ok(Config {
            graph_file,
            index_file,
            output_file,
            params,
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
