mod cli;

use std::fs::File;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use timbre_audio::{
    AssetDelivery, AudioBackend, Config, DirAssetDelivery, FanoutSink, HostEvent,
    InstrumentSession, LogSink, NoAssets, OscClient, ScBackend, ScServer, SynthContext,
    TestBackend, TestOp,
};
use timbre_types::message::build_quit_message;
use timbre_types::{Diagnostic, DiagnosticSink, Severity};

const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("timbre")
        .join("timbre.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path).or_else(|_| File::create("/tmp/timbre.log")) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("timbre: logging disabled, cannot create log file: {}", e);
            return;
        }
    };

    if WriteLogger::init(log_level, simplelog::Config::default(), log_file).is_err() {
        eprintln!("timbre: logger already initialised");
        return;
    }

    log::info!("timbre starting (log level: {:?})", log_level);
}

/// Prints what a user should see (notices and worse) to stderr.
struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn emit(&self, d: Diagnostic) {
        if d.severity >= Severity::Notice {
            eprintln!("timbre: {:?}: {}", d.code, d.context);
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let opts = match cli::parse(&args) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("timbre: {}", e);
            eprintln!("{}", cli::USAGE);
            return ExitCode::from(2);
        }
    };
    init_logging(opts.verbose);

    let config = Config::load();

    let recorder = opts.dry_run.then(|| Arc::new(TestBackend::new()));
    let backend: Arc<dyn AudioBackend> = match recorder {
        Some(ref recorder) => recorder.clone() as Arc<dyn AudioBackend>,
        None => {
            let address = config.server_address();
            let client = match OscClient::new(&address) {
                Ok(client) => client,
                Err(e) => {
                    log::error!(target: "timbre::osc", "cannot reach server at {}: {}", address, e);
                    eprintln!("timbre: cannot reach server at {}: {}", address, e);
                    return ExitCode::from(2);
                }
            };
            let server = ScServer::new(config.spawn_server(), config.server_port());
            Arc::new(ScBackend::new(client, server)) as Arc<dyn AudioBackend>
        }
    };
    let assets: Box<dyn AssetDelivery> = if opts.dry_run {
        Box::new(NoAssets)
    } else {
        Box::new(DirAssetDelivery::new(config.bundle_dir(), config.install_dir()))
    };
    let sinks: Vec<Arc<dyn DiagnosticSink>> = vec![Arc::new(LogSink), Arc::new(StderrSink)];
    let sink = Arc::new(FanoutSink(sinks));

    let ctx = Arc::new(SynthContext::new(backend, assets, sink));
    let session = InstrumentSession::with_source(ctx.clone(), config.default_source());

    if let Some(ref name) = opts.source {
        session.set_source(name);
    }
    if let Some(ms) = opts.attack {
        session.set_attack(ms);
    }
    if let Some(ms) = opts.decay {
        session.set_decay(ms);
    }
    if let Some(ms) = opts.sustain {
        session.set_sustain(ms);
    }
    if let Some(ms) = opts.release {
        session.set_release(ms);
    }
    if let Some(percent) = opts.reverb {
        session.set_reverb(percent);
    }

    if !opts.play.is_empty() {
        session.play(&opts.play);
    }
    if opts.quit {
        session.handle_event(HostEvent::Stop);
    }
    ctx.flush(FLUSH_TIMEOUT);

    if let Some(recorder) = recorder {
        for op in recorder.operations() {
            match op {
                TestOp::Batch(messages) => {
                    for message in messages {
                        println!("{}", message);
                    }
                }
                TestOp::Quit => println!("{}", build_quit_message()),
                TestOp::Start | TestOp::Sync => {}
            }
        }
    }
    ExitCode::SUCCESS
}
