//! `cargo run --example lifecycle-demo -- [--json] [--panic] [STATE_FILE]`

use std::env;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use lifecycle_tracker::{init_logging, LifecycleTracker, LogFormat};

fn main() {
    let mut format = LogFormat::Compact;
    let mut fault = false;
    let mut path = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--json" => format = LogFormat::Json,
            "--panic" => fault = true,
            _ => path = Some(PathBuf::from(arg)),
        }
    }
    init_logging(format);

    let tracker = match LifecycleTracker::new(path) {
        Ok(tracker) => tracker,
        Err(error) => {
            eprintln!("lifecycle-demo: {error}");
            std::process::exit(1);
        }
    };

    let record = tracker.record();
    println!(
        "session #{} started, state at {}",
        record.restart_count,
        tracker.path().display()
    );

    if fault {
        panic!("demo fault requested");
    }

    thread::sleep(Duration::from_millis(250));
    println!("uptime: {:?}", tracker.uptime());

    if let Err(error) = tracker.dispose() {
        eprintln!("lifecycle-demo: {error}");
        std::process::exit(1);
    }
}
