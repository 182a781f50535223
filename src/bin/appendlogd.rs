//! A small demonstration binary: initializes a sink from a config file (or
//! defaults), installs it as the global `log` logger, and runs a handful
//! of producer threads emitting records until interrupted.

use std::env;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use appendlog::{Level, LogSink, SinkConfig, SinkLogger};

fn main() -> anyhow::Result<()> {
    appendlog::diagnostics::init_stderr();

    let mut args = env::args().skip(1);
    let log_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./log"));
    let config_path = args.next().map(PathBuf::from);

    let config = SinkConfig::load(config_path.as_deref())?;
    let sink = LogSink::init(log_dir, "appendlogd", Level::Trace, config)?;

    SinkLogger::install(sink.clone()).map_err(|err| anyhow::anyhow!("{err}"))?;

    let producers: Vec<_> = (0..4)
        .map(|id| {
            thread::spawn(move || {
                for i in 0..1000u64 {
                    log::info!("producer {id} tick {i}");
                    thread::sleep(Duration::from_millis(2));
                }
            })
        })
        .collect();

    for handle in producers {
        let _ = handle.join();
    }

    sink.shutdown();
    Ok(())
}
