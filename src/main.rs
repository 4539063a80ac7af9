/// Console entry point for the earthquake feed service.
///
/// Fetches the configured feed once on a worker thread and prints each
/// event the way a list row would render it. Pass a TOML config path as
/// the first argument to override the defaults; pass `--verify` to run a
/// live endpoint verification instead of a normal fetch.

use quakemon_service::config::{self, PipelineConfig};
use quakemon_service::display;
use quakemon_service::ingest::usgs;
use quakemon_service::loader::FeedLoader;
use quakemon_service::logging::{self, DataSource, LogLevel};
use quakemon_service::verify;

fn main() {
    logging::init_logger(LogLevel::Info, None, false);

    let mut verify_mode = false;
    let mut config = PipelineConfig::default();

    for arg in std::env::args().skip(1) {
        if arg == "--verify" {
            verify_mode = true;
        } else {
            config = match config::load_from_file(&arg) {
                Ok(c) => {
                    logging::info(DataSource::Config, Some(&arg), "Configuration loaded");
                    c
                }
                Err(e) => {
                    eprintln!("Failed to load config {}: {}", arg, e);
                    std::process::exit(1);
                }
            };
        }
    }

    if verify_mode {
        run_verification(&config);
        return;
    }

    let url = usgs::build_query_url(usgs::USGS_FDSN_URL, &config.query);
    println!("Fetching {}", url);

    let loader = FeedLoader::spawn(url, config);
    match loader.join() {
        Ok(records) if records.is_empty() => println!("No earthquakes found."),
        Ok(records) => {
            for record in &records {
                let row = display::display_fields(record);
                println!(
                    "{:>5}  {:<10} {:<30} {}  {}",
                    row.magnitude_text,
                    row.offset_text,
                    row.primary_location_text,
                    row.date_text,
                    row.time_text
                );
            }
        }
        Err(e) => {
            eprintln!("Fetch failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_verification(config: &PipelineConfig) {
    let client = match usgs::build_http_client(&config.fetch) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let report = verify::verify_feed(&client, config);
    println!("{}", verify::format_report(&report));
}
