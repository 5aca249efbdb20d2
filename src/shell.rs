//! Line commands for `tenebris shell`.
//!
//! One command per line; blank lines and `#` comments are skipped. Block ids
//! may be abbreviated to any unique prefix; resolution happens at execution
//! time against the open store.

#[cfg(test)]
#[path = "shell_test.rs"]
mod shell_test;

use mindmap::MoodTag;

pub const HELP: &str = "\
commands:
  create <x> <y> [text]      create a block at a screen point
  text <id> <text>           replace a block's content
  mood <id> <tag>            neutral|positive|negative|idea|important|question
  focus <id> <1-5>           set focus weight
  resize <id> <w> <h>        set explicit size (floored at content size)
  image <id> <ref>|none      attach or clear an image reference
  edit <id> / done <id>      begin / end editing
  drag <id> <dx> <dy>        drag by a screen delta and drop
  delete <id> / undo         delete / restore the last deleted block
  dup <id>                   duplicate a block
  pin <id> / pinmode         toggle a pin / the pinned-only view
  organize / apply / revert  grid preview, keep it, or discard it
  fit / flush                fit the viewport / run deferred work now
  list / stats / help / quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Create { x: f64, y: f64, content: String },
    Text { id: String, content: String },
    Mood { id: String, tag: MoodTag },
    Focus { id: String, weight: i64 },
    Resize { id: String, width: f64, height: f64 },
    Image { id: String, image: Option<String> },
    Edit { id: String },
    Done { id: String },
    Drag { id: String, dx: f64, dy: f64 },
    Delete { id: String },
    Undo,
    Duplicate { id: String },
    Pin { id: String },
    PinMode,
    Organize,
    Apply,
    Revert,
    Fit,
    Flush,
    List,
    Stats,
    Help,
    Quit,
}

/// Parse one line. `Ok(None)` for blank lines and comments.
///
/// # Errors
///
/// Returns a usage message for unknown commands or bad arguments.
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (name, rest) = split_word(line);
    let command = match name {
        "create" => {
            let (x, rest) = split_word(rest);
            let (y, content) = split_word(rest);
            ShellCommand::Create { x: number(x, "x")?, y: number(y, "y")?, content: content.to_string() }
        }
        "text" => {
            let (id, content) = split_word(rest);
            ShellCommand::Text { id: required(id, "id")?, content: content.to_string() }
        }
        "mood" => {
            let [id, tag] = words(rest)?;
            let tag = MoodTag::parse(tag).ok_or_else(|| format!("unknown mood tag: {tag}"))?;
            ShellCommand::Mood { id: id.to_string(), tag }
        }
        "focus" => {
            let [id, weight] = words(rest)?;
            let weight = weight.parse().map_err(|_| format!("focus must be an integer: {weight}"))?;
            ShellCommand::Focus { id: id.to_string(), weight }
        }
        "resize" => {
            let [id, w, h] = words(rest)?;
            ShellCommand::Resize { id: id.to_string(), width: number(w, "width")?, height: number(h, "height")? }
        }
        "image" => {
            let [id, image] = words(rest)?;
            let image = if image == "none" { None } else { Some(image.to_string()) };
            ShellCommand::Image { id: id.to_string(), image }
        }
        "edit" => ShellCommand::Edit { id: single(rest)? },
        "done" => ShellCommand::Done { id: single(rest)? },
        "drag" => {
            let [id, dx, dy] = words(rest)?;
            ShellCommand::Drag { id: id.to_string(), dx: number(dx, "dx")?, dy: number(dy, "dy")? }
        }
        "delete" => ShellCommand::Delete { id: single(rest)? },
        "undo" => ShellCommand::Undo,
        "dup" => ShellCommand::Duplicate { id: single(rest)? },
        "pin" => ShellCommand::Pin { id: single(rest)? },
        "pinmode" => ShellCommand::PinMode,
        "organize" => ShellCommand::Organize,
        "apply" => ShellCommand::Apply,
        "revert" => ShellCommand::Revert,
        "fit" => ShellCommand::Fit,
        "flush" => ShellCommand::Flush,
        "list" => ShellCommand::List,
        "stats" => ShellCommand::Stats,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("unknown command: {other} (try `help`)")),
    };
    Ok(Some(command))
}

/// First whitespace-delimited word and the trimmed remainder.
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], text[end..].trim_start()),
        None => (text, ""),
    }
}

fn words<const N: usize>(text: &str) -> Result<[&str; N], String> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    <[&str; N]>::try_from(parts.as_slice()).map_err(|_| format!("expected {N} arguments, got {}", parts.len()))
}

fn single(text: &str) -> Result<String, String> {
    let [id] = words(text)?;
    Ok(id.to_string())
}

fn required(word: &str, name: &str) -> Result<String, String> {
    if word.is_empty() { Err(format!("missing {name}")) } else { Ok(word.to_string()) }
}

fn number(word: &str, name: &str) -> Result<f64, String> {
    match word.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("{name} must be a number: {word:?}")),
    }
}
