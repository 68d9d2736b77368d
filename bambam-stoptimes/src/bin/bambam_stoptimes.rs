//! validates or repairs the chronology of a GTFS stop_times.txt file. run with
//! RUST_LOG=info (or debug, for per-trip repair progress) to see log output.
use bambam_stoptimes::app::StopTimesApp;
use clap::Parser;

fn main() {
    env_logger::init();
    let args = StopTimesApp::parse();
    log::info!("starting app at {}", chrono::Local::now().to_rfc3339());
    match args.op.run() {
        Ok(_) => log::info!("finished."),
        Err(e) => {
            log::error!("failed running bambam_stoptimes: {e}");
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
