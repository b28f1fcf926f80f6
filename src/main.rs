use std::env;

use dbpack::delivery::FsDelivery;
use dbpack::store::CsvStore;
use dbpack::store::csv::read_requests;
use dbpack::{DispatchConfig, Dispatcher, job_channel};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let (data_dir, requests_path) = match (args.next(), args.next()) {
        (Some(dir), Some(path)) => (dir, path),
        _ => {
            eprintln!("usage: dbpack <data-dir> <requests.csv>");
            std::process::exit(2);
        }
    };

    let store = CsvStore::open(&data_dir).expect("failed to open data directory");
    let delivery = FsDelivery::new(format!("{data_dir}/out"));
    let mut dispatcher = Dispatcher::new(store, delivery, DispatchConfig::default());

    // Pass the path by value so the request iterator owns it and can move
    // into the reader task.
    let requests = read_requests(requests_path).expect("failed to open requests file");
    let (sender, stream) = job_channel(16);

    tokio::spawn(async move {
        for result in requests {
            match result {
                Ok(job) => {
                    if !sender.submit(job).await {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    dispatcher.run(stream).await;
}
