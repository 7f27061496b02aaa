//! Slash-command parsing.

use serde::Deserialize;

/// Form body Slack posts for a slash command. Other fields are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct SlashCommandForm {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Add {
        name: String,
        phone: String,
        email: String,
    },
    /// `/add` whose text is not exactly three non-empty comma-separated fields.
    MalformedAdd,
    Get {
        name: String,
    },
    Download,
    Unknown(String),
}

impl Command {
    pub fn parse(command: &str, text: &str) -> Command {
        match command.trim() {
            "/add" => parse_add(text),
            "/get" => Command::Get {
                name: text.trim().to_string(),
            },
            "/download" => Command::Download,
            other => Command::Unknown(other.to_string()),
        }
    }
}

fn parse_add(text: &str) -> Command {
    let fields: Vec<&str> = text.split(',').map(str::trim).collect();
    match fields.as_slice() {
        [name, phone, email] if !name.is_empty() && !phone.is_empty() && !email.is_empty() => {
            Command::Add {
                name: name.to_string(),
                phone: phone.to_string(),
                email: email.to_string(),
            }
        }
        _ => Command::MalformedAdd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_trims_fields() {
        assert_eq!(
            Command::parse("/add", " Alice , 1234567890 ,alice@example.com "),
            Command::Add {
                name: "Alice".to_string(),
                phone: "1234567890".to_string(),
                email: "alice@example.com".to_string(),
            }
        );
    }

    #[test]
    fn test_add_requires_three_fields() {
        assert_eq!(Command::parse("/add", "Alice,123"), Command::MalformedAdd);
        assert_eq!(
            Command::parse("/add", "Alice,123,a@x,extra"),
            Command::MalformedAdd
        );
        assert_eq!(Command::parse("/add", ""), Command::MalformedAdd);
    }

    #[test]
    fn test_add_rejects_blank_fields() {
        assert_eq!(Command::parse("/add", "Alice, ,a@x"), Command::MalformedAdd);
        assert_eq!(Command::parse("/add", ",,"), Command::MalformedAdd);
    }

    #[test]
    fn test_get_trims_name() {
        assert_eq!(
            Command::parse("/get", "  Bob "),
            Command::Get {
                name: "Bob".to_string()
            }
        );
    }

    #[test]
    fn test_download_ignores_text() {
        assert_eq!(Command::parse("/download", "anything"), Command::Download);
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            Command::parse("/remove", "Alice"),
            Command::Unknown("/remove".to_string())
        );
    }
}
