use faceplate_controller::*;
use std::{env, path::Path, sync::Arc};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Runs one input line against the skill
fn execute(skill: &FaceplateSkill, line: &str) -> Result<()> {
    let (command, rest) = line.split_once(':').unwrap_or((line, ""));
    match command {
        "event" => {
            // event:<name>[ key=value ...]
            // e.g. event:mycroft.skill.handler.start name=WeatherSkill.handle_current
            let mut parts = rest.split_whitespace();
            let name = parts
                .next()
                .ok_or_else(|| Error::General("no event name given".to_string()))?;
            let mut message = Message::new(name);
            for pair in parts {
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| Error::General(format!("bad event field {pair:?}")))?;
                message = message.with(key, value);
            }
            skill.handle_event(&message)?;
        }
        "intent" => {
            // intent:<name>[:<slot>]
            let (name, slot) = match rest.split_once(':') {
                Some((name, slot)) => (name, Some(slot)),
                None => (rest, None),
            };
            skill.handle_intent(name.trim(), slot)?;
        }
        "say" => {
            if !skill.handle_utterance(rest)? {
                return Err(Error::General("nothing is waiting for an answer".to_string()));
            }
        }
        "settings" => {
            println!("{:?}", skill.settings());
        }
        other => return Err(Error::General(format!("Unknown command: {other}"))),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Optional configuration file as the only argument.
    let usage = "Usage: faced [config.toml]";
    let args: Vec<_> = env::args().collect();
    if args.len() > 1 && (args[1] == "-h" || args[1] == "--help") {
        eprintln!("{usage}");
        std::process::exit(0);
    }

    // Logs go to stderr so stdout only carries replies
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| EnvFilter::new("faceplate_controller=info")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = match args.get(1) {
        Some(path) => SkillConfig::load(Path::new(path))?,
        None => SkillConfig::default(),
    };

    let skill = FaceplateSkill::new(
        config,
        Arc::new(TracingEnclosure::new()),
        Arc::new(LogSpeaker),
        Arc::new(StaticHost::default()),
    )?;
    skill.initialize()?;

    // Inform about successful initialization
    println!("OK");

    // Mainloop: wait for input, line by line, until stdin closes or ctrl-c
    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.map_err(|e| Error::io("stdin", e))?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }

        match execute(&skill, line) {
            Ok(()) => println!("OK"),
            Err(e) => eprintln!("ERR {e}"),
        }
    }

    skill.shutdown();
    Ok(())
}
