//! A simple program demonstrates how to use `murmur` as a library.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use murmur::{CommandSpeechEngine, SessionBuilder};
use murmur_http_model::{HttpConfigBuilder, HttpProvider};
use murmur_model::{Role, SpeechEngine};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

enum ChatEvent {
    Fragment(String),
    Reply(String),
    Idle,
}

enum Input {
    Message(String),
    Replay,
    Voice(Option<bool>),
    Stop,
    Quit,
    Unknown(String),
}

const BAR_CHAR: &str = "▎";
const GREETING: &str = "Say something and I'll answer out loud.";
const HELP: &str = "Commands: /replay, /voice on|off, /stop, /quit";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Ok(endpoint) = env::var("MURMUR_ENDPOINT") else {
        eprintln!("MURMUR_ENDPOINT environment variable is not set");
        return;
    };

    let mut config = HttpConfigBuilder::with_endpoint(endpoint);
    if let Ok(token) = env::var("MURMUR_TOKEN") {
        config = config.with_bearer_token(token);
    }
    let provider = HttpProvider::new(config.build());

    let engine = match env::var("MURMUR_SPEECH_COMMAND") {
        Ok(cmdline) => CommandSpeechEngine::from_command_line(&cmdline),
        Err(_) => CommandSpeechEngine::detect(),
    };
    let voice_available = engine.is_available();
    let voice = env::var("MURMUR_TTS")
        .map(|value| voice_enabled(&value))
        .unwrap_or(true);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let session = SessionBuilder::with_provider(provider)
        .with_speech_engine(engine)
        .with_voice(voice)
        .on_fragment({
            let event_tx = event_tx.clone();
            move |fragment| {
                event_tx.send(ChatEvent::Fragment(fragment.to_owned())).ok();
            }
        })
        .on_message({
            let event_tx = event_tx.clone();
            move |msg| {
                if msg.role() == Role::Assistant {
                    let reply = msg.content().to_owned();
                    event_tx.send(ChatEvent::Reply(reply)).ok();
                }
            }
        })
        .on_pending({
            let event_tx = event_tx.clone();
            move |pending| {
                if !pending {
                    event_tx.send(ChatEvent::Idle).ok();
                }
            }
        })
        .build();

    println!("{}{GREETING}", BAR_CHAR.bright_cyan());
    println!("{}{}", BAR_CHAR.bright_cyan(), HELP.dimmed());
    if !voice_available {
        println!(
            "{}{}",
            BAR_CHAR.bright_yellow(),
            "No speech program found, replies won't be spoken.".dimmed()
        );
    }

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    'outer: loop {
        let speaking = match session.snapshot().await {
            Ok(snapshot) => snapshot.speaking,
            Err(_) => break,
        };
        if speaking {
            print!("🔊 ");
        }
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };
        let input = parse_input(&line);
        let awaits_reply = matches!(input, Input::Message(_));
        let result = match input {
            Input::Message(message) if message.is_empty() => continue,
            Input::Message(message) => session.send_message(&message),
            Input::Replay => session.replay_last(),
            Input::Voice(Some(enabled)) => session.set_voice(enabled),
            Input::Voice(None) => {
                let enabled = match session.snapshot().await {
                    Ok(snapshot) => snapshot.tts_enabled,
                    Err(_) => break,
                };
                let state = if enabled { "on" } else { "off" };
                println!("Voice is {state}.");
                continue;
            }
            Input::Stop => session.stop_speaking(),
            Input::Quit => break,
            Input::Unknown(command) => {
                println!("Unknown command {command}. {HELP}");
                continue;
            }
        };
        if result.is_err() {
            error!("chat has stopped unexpectedly");
            break;
        }
        if !awaits_reply {
            continue;
        }

        let mut progress_bar = None;
        let mut preview = Preview::default();

        loop {
            // Keep spinning until the first fragment shows up.
            if preview.is_empty() {
                progress_bar
                    .get_or_insert_with(|| {
                        let progress_bar = ProgressBar::new_spinner();
                        progress_bar.set_style(progress_style.clone());
                        progress_bar.set_message("💭 Thinking...");
                        progress_bar
                    })
                    .inc(1);
            }

            let sleep = sleep(Duration::from_millis(100));
            let event = select! {
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        break 'outer;
                    };
                    event
                },
                _ = sleep => {
                    continue;
                }
            };

            // Finish the progress bar before printing anything else.
            if let Some(progress_bar) = progress_bar.take() {
                progress_bar.finish_and_clear();
            }

            match event {
                ChatEvent::Fragment(fragment) => {
                    if preview.is_empty() {
                        print!("{}🤖 ", BAR_CHAR.bright_cyan());
                    }
                    preview.push(&fragment);
                    print!("{}", fragment.bright_white());
                    std::io::stdout().flush().ok();
                }
                ChatEvent::Reply(reply) => {
                    if preview.is_empty() {
                        println!(
                            "{}🤖 {}",
                            BAR_CHAR.bright_cyan(),
                            reply.bright_white()
                        );
                    } else if preview.matches(&reply) {
                        println!();
                    } else {
                        // The streamed text was thrown away, show what the
                        // conversation actually recorded.
                        println!(" {}", "(interrupted)".dimmed());
                        println!(
                            "{}🤖 {}",
                            BAR_CHAR.bright_yellow(),
                            reply.bright_white()
                        );
                    }
                    preview.clear();
                }
                ChatEvent::Idle => {
                    break;
                }
            }
        }
    }
}

/// The part of a reply that has been printed while it streams in.
#[derive(Default)]
struct Preview {
    text: String,
}

impl Preview {
    #[inline]
    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[inline]
    fn push(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    #[inline]
    fn clear(&mut self) {
        self.text.clear();
    }

    /// Returns whether the recorded reply is what has been printed.
    ///
    /// Recorded replies are trimmed, and failed ones are replaced by the
    /// fallback message.
    fn matches(&self, reply: &str) -> bool {
        self.text.trim() == reply
    }
}

fn voice_enabled(value: &str) -> bool {
    let value = value.trim();
    !["0", "off", "false", "no"]
        .iter()
        .any(|off| value.eq_ignore_ascii_case(off))
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return Input::Message(line.to_owned());
    };
    let mut words = command.split_whitespace();
    match (words.next(), words.next()) {
        (Some("replay"), None) => Input::Replay,
        (Some("voice"), None) => Input::Voice(None),
        (Some("voice"), Some("on")) => Input::Voice(Some(true)),
        (Some("voice"), Some("off")) => Input::Voice(Some(false)),
        (Some("stop"), None) => Input::Stop,
        (Some("quit"), None) => Input::Quit,
        _ => Input::Unknown(line.to_owned()),
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use murmur_core::DEFAULT_FALLBACK_REPLY;

    use super::*;

    #[test]
    fn test_preview_of_complete_reply() {
        let mut preview = Preview::default();
        assert!(preview.is_empty());
        preview.push("- point one\n");
        preview.push("- point two\n");
        assert!(preview.matches("- point one\n- point two"));

        preview.clear();
        preview.push("  \n");
        assert!(preview.matches(""));
    }

    #[test]
    fn test_preview_of_failed_reply() {
        let mut preview = Preview::default();
        preview.push("- point one\n");
        assert!(!preview.is_empty());
        assert!(!preview.matches(DEFAULT_FALLBACK_REPLY));
    }

    #[test]
    fn test_voice_enabled() {
        for value in ["0", "off", "OFF", "Off", "false", "FALSE", " no "] {
            assert!(!voice_enabled(value), "{value:?} should disable voice");
        }
        for value in ["1", "on", "true", "yes", ""] {
            assert!(voice_enabled(value), "{value:?} should enable voice");
        }
    }

    #[test]
    fn test_parse_input() {
        assert!(matches!(
            parse_input("  hello \n"),
            Input::Message(message) if message == "hello"
        ));
        assert!(matches!(parse_input("/replay"), Input::Replay));
        assert!(matches!(parse_input("/voice off"), Input::Voice(Some(false))));
        assert!(matches!(parse_input("/voice"), Input::Voice(None)));
        assert!(matches!(parse_input("/stop\n"), Input::Stop));
        assert!(matches!(parse_input("/quit"), Input::Quit));
        assert!(matches!(parse_input("/voice loud"), Input::Unknown(_)));
    }
}
