//! chainwatchd - chain inspection daemon.
//!
//! Wires the capture provider, detector, signal line, and presenter into a
//! `DetectionGate`, then drives it from a fixed-cadence poll timer until
//! interrupted. Without a model or hardware backends built in, stub
//! implementations keep the loop runnable end to end.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chainwatch::{
    ActionController, ChainwatchConfig, DetectionGate, LogPresenter, NoopSignal, PollTimer,
    SignalLine, StubDetector, SysfsGpioSignal, SystemProvider,
};

#[derive(Parser, Debug)]
#[command(name = "chainwatchd", about = "Chain inspection line watcher")]
struct Args {
    /// Run in video-demo mode with this file instead of live cameras.
    #[arg(long)]
    video: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = ChainwatchConfig::load()?;
    if args.video.is_some() {
        cfg.video = args.video;
    }

    log::info!(
        "chainwatchd {} starting (tick={}ms, save_dir={})",
        env!("CARGO_PKG_VERSION"),
        cfg.tick.as_millis(),
        cfg.save_dir.display()
    );
    if let Some(model) = &cfg.model_path {
        // Model loading is the detector integration point; the stub backend
        // ignores it.
        log::warn!(
            "model {} configured but no detector backend is built in; using stub",
            model.display()
        );
    }

    let provider = Box::new(SystemProvider::new(cfg.capture));
    let detector = Box::new(StubDetector::new());
    let signal: Box<dyn SignalLine> = match cfg.gpio_pin {
        Some(pin) => Box::new(SysfsGpioSignal::new(pin)),
        None => Box::new(NoopSignal),
    };
    let presenter = Arc::new(LogPresenter);

    let gate = DetectionGate::new(provider, detector, signal, presenter, cfg.cameras);
    let controller = ActionController::new(Arc::new(Mutex::new(gate)), cfg.save_dir.clone());

    match &cfg.video {
        Some(path) => controller.select_video(path)?,
        None => controller.start()?,
    }

    let tick_controller = controller.clone();
    let mut timer = PollTimer::start(cfg.tick, move || {
        if let Err(e) = tick_controller.tick() {
            log::warn!("tick failed: {e:#}");
        }
    })?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        shutdown_flag.store(true, Ordering::SeqCst);
    })?;

    while !shutdown.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    log::info!("shutting down");
    timer.stop();
    controller.stop()?;
    Ok(())
}
