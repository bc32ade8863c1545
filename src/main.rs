//! Demo driver: fill an array with random integers, sort it with one worker
//! thread per partition, and verify the result.

use std::process::ExitCode;

use rand::Rng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use stratalock::{sort_partitioned, worker_count};

const DATA_SIZE: usize = 128;
const VALUE_RANGE_START: i32 = -100;
const VALUE_RANGE_END: i32 = 100;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut rng = rand::thread_rng();
    let mut values: Vec<i32> = (0..DATA_SIZE)
        .map(|_| rng.gen_range(VALUE_RANGE_START..=VALUE_RANGE_END))
        .collect();

    println!("Contents of array before range sorting: {values:?}");
    info!(workers = worker_count(), "detected worker count");

    sort_partitioned(&mut values);

    let mut sorted: bool = true;
    for i in 0..values.len().saturating_sub(1) {
        if values[i + 1] < values[i] {
            error!(
                index = i,
                left = values[i],
                right = values[i + 1],
                "sort failed: adjacent elements out of order"
            );
            sorted = false;
            break;
        }
    }

    println!("Contents of array after range sorting: {values:?}");

    if sorted {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
