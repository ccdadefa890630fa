#![warn(clippy::pedantic)]

pub mod preferences;
pub mod scenario;

use anyhow::Result as AnyResult;
use vrgraft_core::{host::Host, sim::SimHost, Session};

fn main() -> AnyResult<()> {
    let has_term = std::io::IsTerminal::is_terminal(&std::io::stdin());
    // Log to a terminal, if available. Else, log to "log.out" in the working directory.
    if has_term {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        let _ = simple_logging::log_to_file("log.out", log::LevelFilter::Debug);
    }

    // Args are the scenario to play, then optionally a context to use instead of the user's.
    let mut args = std::env::args_os().skip(1).map(std::path::PathBuf::from);
    let Some(scenario_path) = args.next() else {
        anyhow::bail!("usage: vrgraft <scenario.toml> [context.toml]");
    };
    let context_path = args.next();

    let context = preferences::load_context(context_path.as_deref())?;
    let scenario = scenario::Scenario::load(&scenario_path)?;
    log::info!(
        "Playing {scenario_path:?}: {} events over {} ticks",
        scenario.events.len(),
        scenario.length()
    );

    let mut host = SimHost::new(scenario.window);
    let mut session = Session::activate(&mut host, context, Box::new(scenario.interpreter.clone()));
    session.on_copied(|event| log::debug!("Copied {}", event.viewpoint));
    session.on_initialized(|event| match event.blueprint {
        Some(blueprint) => log::debug!("{} now follows {blueprint}", event.canonical),
        None => log::debug!("{} has no blueprint", event.canonical),
    });

    let result = scenario.play(&mut host, &mut session);
    summarize(&host, &session);
    session.shutdown(&mut host);

    let applied = result?;
    log::info!("Applied {applied} events");
    Ok(())
}

fn summarize(host: &SimHost, session: &Session) {
    if let Some(canonical) = host.viewpoint(session.canonical()) {
        log::info!(
            "Stereo viewpoint: culling {:#010x}, clip {}..{}, clear {}, {} post effects",
            canonical.culling_mask.bits(),
            canonical.near_clip,
            canonical.far_clip,
            canonical.clear_mode,
            canonical.effects.len(),
        );
    }
    log::info!(
        "Eye buffers at {}x the window, post effects {}",
        session.synthesizer().render_scale(),
        if session.effects_enabled() { "on" } else { "off" },
    );
    match session.blueprint(host) {
        Some(blueprint) => log::info!("Blueprint: {blueprint}"),
        None => log::info!("No blueprint"),
    }
    log::info!(
        "{} registered sub-viewpoints, {} audio listeners, {} capture listeners",
        session.synthesizer().registered().len(),
        host.listener_count(),
        session.capture().listeners(),
    );
}
