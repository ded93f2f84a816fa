//! Parsing of terminal input lines.
//!
//! Each line is one action. Named gallery commands (`next-image`,
//! `toggle-tag-mode`, ...) are accepted verbatim, alongside a few host
//! verbs for things a terminal has no gesture for.

use std::path::PathBuf;
use std::str::FromStr;

use lumen_core::commands::{Command, KeyEvent};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Commit a term immediately.
    Search(String),
    /// Type into the search box (debounced).
    Type(String),
    /// Fetch the next page.
    More,
    /// The grid's loading sentinel scrolled into view.
    Scroll,
    /// Load the full legacy listing.
    All,
    Open(String),
    Click { id: String, extend: bool },
    Key(KeyEvent),
    Command(Command),
    AddTags(Vec<String>),
    RemoveTags(Vec<String>),
    Upload(Vec<PathBuf>),
    Layout,
    Tags,
    Status,
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("'{verb}' needs {what}")]
    MissingArgument { verb: &'static str, what: &'static str },
}

pub const HELP: &str = "\
search <term>        commit a search term now (empty = all images)
type <text>          type into the search box (debounced)
more | scroll        fetch the next page / signal the sentinel is visible
all                  load the full listing
open <id>            open an image in the lightbox
click <id> [shift]   click a grid tile (shift extends the selection)
key <name> [input]   press a key (ArrowRight, Escape, t, c, /, q, u)
add-tag <tags>       add tags to the selection (comma or space separated)
remove-tag <tags>    remove tags from the selection
upload <paths>       upload files
layout | tags | status
<command>            next-image, previous-image, close, toggle-tag-mode,
                     clear-selection, toggle-search, toggle-quality, open-uploader
quit";

/// Parse one line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Input>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let input = match verb {
        "search" => Input::Search(rest.to_string()),
        "type" => Input::Type(rest.to_string()),
        "more" => Input::More,
        "scroll" => Input::Scroll,
        "all" => Input::All,
        "open" => Input::Open(required("open", rest, "an image id")?.to_string()),
        "click" => {
            let mut words = rest.split_whitespace();
            let id = words.next().ok_or(ParseError::MissingArgument {
                verb: "click",
                what: "an image id",
            })?;
            let extend = words.any(|w| w == "shift");
            Input::Click {
                id: id.to_string(),
                extend,
            }
        }
        "key" => {
            let mut words = rest.split_whitespace();
            let key = words.next().ok_or(ParseError::MissingArgument {
                verb: "key",
                what: "a key name",
            })?;
            let event = KeyEvent::new(key);
            if words.any(|w| w == "input") {
                Input::Key(event.in_text_input())
            } else {
                Input::Key(event)
            }
        }
        "add-tag" | "add-tags" => Input::AddTags(tag_list(required("add-tag", rest, "tags")?)),
        "remove-tag" | "remove-tags" => {
            Input::RemoveTags(tag_list(required("remove-tag", rest, "tags")?))
        }
        "upload" => Input::Upload(
            required("upload", rest, "file paths")?
                .split_whitespace()
                .map(PathBuf::from)
                .collect(),
        ),
        "layout" => Input::Layout,
        "tags" => Input::Tags,
        "status" => Input::Status,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        "next" => Input::Command(Command::NextImage),
        "prev" | "previous" => Input::Command(Command::PreviousImage),
        other => match Command::from_str(other) {
            Ok(command) => Input::Command(command),
            Err(_) => return Err(ParseError::Unknown(other.to_string())),
        },
    };
    Ok(Some(input))
}

fn required<'a>(verb: &'static str, rest: &'a str, what: &'static str) -> Result<&'a str, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::MissingArgument { verb, what });
    }
    Ok(rest)
}

fn tag_list(rest: &str) -> Vec<String> {
    rest.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn blank_line_is_nothing() {
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn search_keeps_multi_word_term() {
        assert_eq!(
            parse("search  sunny beach ").unwrap(),
            Some(Input::Search("sunny beach".into()))
        );
        assert_eq!(parse("search").unwrap(), Some(Input::Search(String::new())));
    }

    #[test]
    fn click_with_shift_extends() {
        assert_eq!(
            parse("click abc shift").unwrap(),
            Some(Input::Click {
                id: "abc".into(),
                extend: true
            })
        );
        assert_matches!(
            parse("click"),
            Err(ParseError::MissingArgument { verb: "click", .. })
        );
    }

    #[test]
    fn key_in_text_input() {
        let Some(Input::Key(event)) = parse("key t input").unwrap() else {
            panic!("expected a key event");
        };
        assert_eq!(event.key, "t");
        assert!(event.in_text_input);
    }

    #[test]
    fn named_commands_and_aliases() {
        assert_eq!(
            parse("toggle-tag-mode").unwrap(),
            Some(Input::Command(Command::ToggleTagMode))
        );
        assert_eq!(parse("escape").unwrap(), Some(Input::Command(Command::Close)));
        assert_eq!(parse("prev").unwrap(), Some(Input::Command(Command::PreviousImage)));
    }

    #[test]
    fn tags_split_on_commas_and_spaces() {
        assert_eq!(
            parse("add-tag sea, sun  sand").unwrap(),
            Some(Input::AddTags(vec!["sea".into(), "sun".into(), "sand".into()]))
        );
        assert_matches!(parse("remove-tag"), Err(ParseError::MissingArgument { .. }));
    }

    #[test]
    fn upload_collects_paths() {
        assert_eq!(
            parse("upload a.jpg dir/b.png").unwrap(),
            Some(Input::Upload(vec![PathBuf::from("a.jpg"), PathBuf::from("dir/b.png")]))
        );
    }

    #[test]
    fn unknown_verb_is_an_error() {
        assert_eq!(parse("dance"), Err(ParseError::Unknown("dance".into())));
    }
}
