use chain_hash::ChainedHashTable;
use clap::Parser;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "initial_capacity", default_value_t = 4)]
    initial_capacity: usize,

    #[arg(short = 'n', long = "values", default_value_t = 1000)]
    values: u64,

    #[arg(short = 't', long = "threshold", default_value_t = 0.75)]
    threshold: f64,

    /// Print every bucket after filling the table.
    #[arg(short = 'd', long = "dump")]
    dump: bool,
}

fn main() {
    let args = Args::parse();

    let mut table: ChainedHashTable<u64> = ChainedHashTable::with_capacity_threshold_and_hasher(
        args.initial_capacity,
        args.threshold,
        Default::default(),
    );

    println!(
        "Created table with {} buckets (threshold {:.2})",
        table.capacity(),
        table.load_factor_threshold()
    );
    println!("Filling table with {} u64 values...", args.values);

    let mut grows = 0;
    for value in 0..args.values {
        let before = table.capacity();
        if let Err(err) = table.try_insert(value) {
            eprintln!("Insert of {value} failed: {err}");
            break;
        }
        if table.capacity() != before {
            grows += 1;
        }
    }

    println!(
        "Inserted {} values, bucket array grew {} times to {}",
        table.len(),
        grows,
        table.capacity()
    );

    let missing = (0..args.values).filter(|v| !table.contains(v)).count();
    println!("Values not found after filling: {missing}");

    table.debug_stats().print();

    let hist = table.chain_length_histogram();
    println!("chain length histogram:");
    for (length, &count) in hist.iter().enumerate() {
        println!("{length:>3} | {count}");
    }

    if args.dump {
        println!("{table}");
    }
}
