// SPDX-License-Identifier: MPL-2.0

use calloop::channel::{self, Sender};
use calloop::signals::{Signal, Signals};
use calloop::{EventLoop, LoopSignal};
use eyre::{WrapErr, eyre};
use slideshow_saver::{
    AssetSource, ExitSignal, FallbackSource, FolderSource, OrientationNormalizer, Session,
    SessionError, TraceSurface,
};
use slideshow_saver_config::Config;
use tracing_subscriber::EnvFilter;

struct Host {
    exit: ExitSignal,
    loop_signal: LoopSignal,
    outcome: Option<Result<u64, SessionError>>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(why) => {
            tracing::warn!(?why, "config file error, falling back to defaults");
            Config::fallback()
        }
    };
    config.validate().wrap_err("invalid configuration")?;

    let mut event_loop: EventLoop<Host> =
        EventLoop::try_new().wrap_err("failed to create event loop")?;
    let exit = ExitSignal::new();

    let signals = Signals::new(&[Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP])
        .wrap_err("failed to watch signals")?;
    event_loop
        .handle()
        .insert_source(signals, |event, _, host: &mut Host| {
            tracing::info!(signal = ?event.signal(), "exit requested by signal");
            host.exit.raise();
        })
        .map_err(|err| eyre!("{}", err.error))?;

    let (done_tx, done_rx) = channel::channel();
    event_loop
        .handle()
        .insert_source(done_rx, |event, _, host: &mut Host| {
            if let channel::Event::Msg(outcome) = event {
                host.outcome = Some(outcome);
            }
            host.loop_signal.stop();
        })
        .map_err(|err| eyre!("{}", err.error))?;

    let source = asset_source(&config);
    let session = spawn_session(config, source, exit.clone(), done_tx)?;

    let mut host = Host {
        exit,
        loop_signal: event_loop.get_signal(),
        outcome: None,
    };
    event_loop
        .run(None, &mut host, |_| {})
        .wrap_err("event loop failed")?;

    if session.join().is_err() {
        return Err(eyre!("session thread panicked"));
    }

    match host.outcome {
        Some(Ok(renders)) => {
            tracing::info!(renders, "slideshow finished");
            Ok(())
        }
        Some(Err(why)) => Err(why).wrap_err("slideshow failed"),
        None => Err(eyre!("session ended without reporting")),
    }
}

fn asset_source(config: &Config) -> Box<dyn AssetSource> {
    let source = &config.source;
    let primary = Box::new(FolderSource::new(&source.path, source.recursive));

    match &source.fallback {
        Some(fallback) => Box::new(FallbackSource::new(
            primary,
            Box::new(FolderSource::new(fallback, source.recursive)),
        )),
        None => primary,
    }
}

fn spawn_session(
    config: Config,
    source: Box<dyn AssetSource>,
    exit: ExitSignal,
    done: Sender<Result<u64, SessionError>>,
) -> eyre::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("session".into())
        .spawn(move || {
            let mut session = Session::new(config, TraceSurface::new(), exit);
            let outcome = session
                .start(source.as_ref(), OrientationNormalizer::default())
                .and_then(|()| session.run());
            session.close();

            if done.send(outcome).is_err() {
                tracing::warn!("host is gone, dropping session outcome");
            }
        })
        .wrap_err("failed to spawn session thread")
}
