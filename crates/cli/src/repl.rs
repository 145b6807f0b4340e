//! The interactive console.
//!
//! Runs on a blocking thread so rustyline can own the terminal while the
//! engine task and the event printer run on the tokio runtime. Lines are
//! parsed here and handed to the engine as [`EngineCommand`]s; everything
//! the engine has to say comes back through the printer, not this module.

use std::fmt::Write as _;

use anyhow::Result;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use padprobe_engine::{EngineCommand, EngineHandle};
use ps2_pad_protocol::{CommandCatalog, CommandDefinition};

/// Verbs handled by the console itself rather than the catalog.
const CONSOLE_VERBS: &[&str] = &["abort", "exit", "flush", "help", "quit", "show_data"];

const PROMPT: &str = "pad> ";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplAction {
    Invoke { name: String, args: Vec<u8> },
    Abort,
    Flush,
    ShowBuffer,
    Help { topic: Option<String> },
    Quit,
    Unparsable { token: String },
}

/// Parses one line. Returns `None` for blank input.
///
/// Anything that is not a console verb is treated as a catalog command
/// followed by hex argument bytes. A bare two-digit hex token in command
/// position is shorthand for `raw` with that byte as its first argument.
pub fn parse_line(line: &str) -> Option<ReplAction> {
    let mut tokens = line.split_whitespace();
    let head = tokens.next()?;
    let action = match head {
        "help" => ReplAction::Help {
            topic: tokens.next().map(str::to_owned),
        },
        "abort" => ReplAction::Abort,
        "flush" => ReplAction::Flush,
        "show_data" => ReplAction::ShowBuffer,
        "quit" | "exit" => ReplAction::Quit,
        verb => {
            let (name, mut args) = match bare_hex_byte(verb) {
                Some(byte) => ("raw".to_owned(), vec![byte]),
                None => (verb.to_owned(), Vec::new()),
            };
            for token in tokens {
                match u8::from_str_radix(token, 16) {
                    Ok(byte) => args.push(byte),
                    Err(_) => {
                        return Some(ReplAction::Unparsable {
                            token: token.to_owned(),
                        });
                    }
                }
            }
            ReplAction::Invoke { name, args }
        }
    };
    Some(action)
}

/// Accepts exactly two hex digits, the shape of a raw opcode.
fn bare_hex_byte(token: &str) -> Option<u8> {
    if token.len() != 2 {
        return None;
    }
    u8::from_str_radix(token, 16).ok()
}

/// Renders `help` output. With a topic, one command in full; without,
/// the console verbs plus the whole catalog.
pub fn render_help(catalog: &CommandCatalog, topic: Option<&str>) -> String {
    match topic {
        Some(name) => match catalog.get(name) {
            Some(definition) => describe_command(definition),
            None => format!("unknown command: {name}"),
        },
        None => {
            let mut out = String::new();
            out.push_str("console verbs: help [cmd], show_data, flush, abort, quit\n");
            out.push_str("a bare hex byte (e.g. `f5`) is sent raw; further hex tokens become arguments\n\n");
            for definition in catalog.iter() {
                let _ = writeln!(out, "  {:<24} {}", definition.name, definition.description);
            }
            out
        }
    }
}

fn describe_command(definition: &CommandDefinition) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} - {}", definition.name, definition.description);
    if !definition.arg_labels.is_empty() {
        let _ = writeln!(out, "known argument values:");
        for &(value, label) in definition.arg_labels {
            let _ = writeln!(out, "  {value:#04x}  {label}");
        }
    }
    out
}

/// Tab completion over catalog names and console verbs.
pub struct PadHelper {
    words: Vec<String>,
}

impl PadHelper {
    pub fn new(catalog: &CommandCatalog) -> Self {
        let mut words: Vec<String> = catalog
            .names()
            .into_iter()
            .map(str::to_owned)
            .collect();
        words.extend(CONSOLE_VERBS.iter().map(|verb| (*verb).to_owned()));
        words.sort_unstable();
        Self { words }
    }

    fn matching(&self, prefix: &str) -> Vec<String> {
        self.words
            .iter()
            .filter(|word| word.starts_with(prefix))
            .cloned()
            .collect()
    }
}

impl Completer for PadHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let head = &line[..pos];
        let start = head.rfind(char::is_whitespace).map_or(0, |i| i + 1);
        let candidates = self
            .matching(&head[start..])
            .into_iter()
            .map(|word| Pair {
                display: word.clone(),
                replacement: word,
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for PadHelper {
    type Hint = String;
}

impl Highlighter for PadHelper {}

impl Validator for PadHelper {}

impl Helper for PadHelper {}

/// Reads lines until quit, EOF, or the engine goes away.
pub fn run(handle: EngineHandle, catalog: CommandCatalog) -> Result<()> {
    let mut editor: Editor<PadHelper, DefaultHistory> = Editor::new()?;
    editor.set_helper(Some(PadHelper::new(&catalog)));

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let Some(action) = parse_line(&line) else {
                    continue;
                };
                let _ = editor.add_history_entry(&line);
                let sent = match action {
                    ReplAction::Help { topic } => {
                        println!("{}", render_help(&catalog, topic.as_deref()));
                        continue;
                    }
                    ReplAction::Unparsable { token } => {
                        println!("can't parse {token}");
                        continue;
                    }
                    ReplAction::Quit => break,
                    ReplAction::Invoke { name, args } => {
                        handle.blocking_send(EngineCommand::Invoke { name, args })
                    }
                    ReplAction::Abort => handle.blocking_send(EngineCommand::Abort),
                    ReplAction::Flush => handle.blocking_send(EngineCommand::Flush),
                    ReplAction::ShowBuffer => handle.blocking_send(EngineCommand::ShowBuffer),
                };
                if !sent {
                    println!("engine stopped; exiting console");
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(error) => return Err(error.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> CommandCatalog {
        CommandCatalog::builtin().expect("builtin catalog")
    }

    #[test]
    fn parse_blank_line_is_nothing() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   "), None);
    }

    #[test]
    fn parse_console_verbs() {
        assert_eq!(parse_line("abort"), Some(ReplAction::Abort));
        assert_eq!(parse_line("flush"), Some(ReplAction::Flush));
        assert_eq!(parse_line("show_data"), Some(ReplAction::ShowBuffer));
        assert_eq!(parse_line("quit"), Some(ReplAction::Quit));
        assert_eq!(parse_line("exit"), Some(ReplAction::Quit));
    }

    #[test]
    fn parse_help_with_and_without_topic() {
        assert_eq!(parse_line("help"), Some(ReplAction::Help { topic: None }));
        assert_eq!(
            parse_line("help set_resolution"),
            Some(ReplAction::Help {
                topic: Some("set_resolution".to_owned()),
            })
        );
    }

    #[test]
    fn parse_catalog_command_with_hex_args() {
        assert_eq!(
            parse_line("set_sample_rate 28"),
            Some(ReplAction::Invoke {
                name: "set_sample_rate".to_owned(),
                args: vec![0x28],
            })
        );
    }

    #[test]
    fn parse_bare_hex_byte_becomes_raw() {
        assert_eq!(
            parse_line("f5"),
            Some(ReplAction::Invoke {
                name: "raw".to_owned(),
                args: vec![0xF5],
            })
        );
        assert_eq!(
            parse_line("E8 03"),
            Some(ReplAction::Invoke {
                name: "raw".to_owned(),
                args: vec![0xE8, 0x03],
            })
        );
    }

    #[test]
    fn parse_single_hex_digit_is_a_command_name() {
        // Only the two-digit shape is raw shorthand.
        assert_eq!(
            parse_line("f"),
            Some(ReplAction::Invoke {
                name: "f".to_owned(),
                args: vec![],
            })
        );
    }

    #[test]
    fn parse_bad_argument_token() {
        assert_eq!(
            parse_line("set_sample_rate fast"),
            Some(ReplAction::Unparsable {
                token: "fast".to_owned(),
            })
        );
        assert_eq!(
            parse_line("raw 1ff"),
            Some(ReplAction::Unparsable {
                token: "1ff".to_owned(),
            })
        );
    }

    #[test]
    fn help_lists_every_command() {
        let catalog = catalog();
        let listing = render_help(&catalog, None);
        for name in catalog.names() {
            assert!(listing.contains(name), "missing {name}");
        }
    }

    #[test]
    fn help_topic_shows_argument_values() {
        let text = render_help(&catalog(), Some("set_resolution"));
        assert!(text.contains("set_resolution"));
        assert!(text.contains("0x03"));
        assert!(text.contains("8 counts/mm"));
    }

    #[test]
    fn help_unknown_topic() {
        assert_eq!(
            render_help(&catalog(), Some("warp_speed")),
            "unknown command: warp_speed"
        );
    }

    #[test]
    fn completion_covers_catalog_and_verbs() {
        let helper = PadHelper::new(&catalog());
        let inits = helper.matching("init");
        assert!(inits.contains(&"init_ps2".to_owned()));
        assert!(inits.contains(&"init_im".to_owned()));
        assert!(inits.contains(&"init_im5".to_owned()));
        assert!(helper.matching("sh").contains(&"show_data".to_owned()));
        assert!(helper.matching("zzz").is_empty());
    }
}
