use party_shared::preferences::PreferenceTag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Categories,
    Draw(String),
    Play(String),
    Pick(usize),
    Restart,
    Status { json: bool },
    Mark { tag: PreferenceTag, item: String },
    Unmark(String),
    Preferences,
    Export(Option<String>),
    Import(Option<String>),
    Quit,
}

pub const HELP: &str = "\
Commands:
  categories              list content categories and games
  draw <category>         draw a card without repeats until the pile is used up
  play <game>             start a multi-stage game
  pick <n>                pick option n of the current stage
  restart                 start the current game over with fresh options
  status [--json]         show the current game
  mark <tag> <item>       tag an item (favorite, like, maybe, no)
  unmark <item>           remove a tag
  prefs                   list tagged items
  export [path]           save tags to a JSON file
  import [path]           load tags from a JSON file
  quit                    leave";

/// Parses one input line. Empty lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let argument = || (!rest.is_empty()).then(|| rest.to_string());
    let required = |usage: &str| argument().ok_or_else(|| format!("Usage: {}", usage));

    let command = match word.to_ascii_lowercase().as_str() {
        "help" | "?" => Command::Help,
        "categories" | "list" => Command::Categories,
        "draw" => Command::Draw(required("draw <category>")?),
        "play" => Command::Play(required("play <game>")?),
        "pick" => {
            let raw = required("pick <n>")?;
            match raw.parse::<usize>() {
                Ok(n) if n >= 1 => Command::Pick(n - 1),
                _ => return Err(format!("'{}' is not an option number", raw)),
            }
        }
        "restart" => Command::Restart,
        "status" => match rest {
            "" => Command::Status { json: false },
            "--json" | "json" => Command::Status { json: true },
            other => return Err(format!("Unknown status option '{}'. Usage: status [--json]", other)),
        },
        "mark" => {
            let raw = required("mark <tag> <item>")?;
            let (tag, item) = raw
                .split_once(char::is_whitespace)
                .ok_or_else(|| "Usage: mark <tag> <item>".to_string())?;
            let tag = tag
                .parse::<PreferenceTag>()
                .map_err(|_| format!("Unknown tag '{}' (favorite, like, maybe, no)", tag))?;
            Command::Mark { tag, item: item.trim().to_string() }
        }
        "unmark" => Command::Unmark(required("unmark <item>")?),
        "prefs" | "preferences" => Command::Preferences,
        "export" => Command::Export(argument()),
        "import" => Command::Import(argument()),
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("Unknown command '{}'. Type 'help' for a list.", other)),
    };
    Ok(Some(command))
}
