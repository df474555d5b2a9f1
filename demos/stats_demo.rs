use std::hash::RandomState;

use clap::Parser;
use fixed_capacity::FixedHashSet;

const CAPACITY: usize = 4096;

#[derive(Parser, Debug)]
struct Args {
    /// Share of the slots to fill with live values, in percent.
    #[arg(short = 'l', long = "load-percent", default_value_t = 75)]
    load_percent: usize,

    /// Remove-and-reinsert rounds to run after filling, leaving tombstones.
    #[arg(short = 'c', long = "churn", default_value_t = 0)]
    churn: usize,
}

fn main() {
    let args = Args::parse();

    let mut set: FixedHashSet<u64, CAPACITY, RandomState> =
        FixedHashSet::with_hasher(RandomState::new());
    let target = (CAPACITY * args.load_percent.min(100)) / 100;

    println!(
        "Filling FixedHashSet with {} slots to {}% ({} values)",
        set.capacity(),
        args.load_percent.min(100),
        target
    );

    for value in 0..target as u64 {
        set.insert(value);
    }

    // Slide a window of `target` live values forward: each round removes the
    // oldest value and inserts a new one, leaving a tombstone behind.
    let mut next = target as u64;
    if target > 0 {
        for _ in 0..args.churn {
            set.remove(&(next - target as u64));
            set.insert(next);
            next += 1;
        }
    }

    let window_end = next;
    while set.try_insert(next).is_ok() {
        next += 1;
    }

    let mut rejected = 0;
    for value in next..next + 16 {
        if let Err(err) = set.try_insert(value) {
            if rejected == 0 {
                println!("First rejected insert: {} ({})", err.element(), err);
            }
            rejected += 1;
        }
    }

    // Drop back to the requested load so the statistics describe it rather
    // than the saturated table.
    let surplus = set.erase_if(|&value| value >= window_end);
    println!("Removed {} values used to saturate the set", surplus);

    println!("Rejected {} inserts into the saturated set", rejected);
    println!("Final load factor: {:.2}%", set.load_factor() * 100.0);

    set.probe_histogram().print();
    set.debug_stats().print();
}
