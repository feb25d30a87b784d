use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Show usage and the current settings")]
    Help,
    #[command(description = "Show or change default models: /model main|error|add <model>")]
    Model(String),
    #[command(description = "Change default prompts: /prompt main|error <text>")]
    Prompt(String),
    #[command(description = "Change this chat's model: /chatmodel main|error <model>")]
    ChatModel(String),
    #[command(description = "Change this chat's prompt: /chatprompt main|error <text>")]
    ChatPrompt(String),
    #[command(description = "Reset this chat's settings: /reset [field]")]
    Reset(String),
    #[command(description = "Ask the model a question: /ask <question>")]
    Ask(String),
    #[command(description = "Show request statistics")]
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Test: Commands parse with and without the bot mention, arguments kept verbatim.**
    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start", "digest_bot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/status@digest_bot", "digest_bot").unwrap(), Command::Status);
        assert_eq!(
            Command::parse("/ask what is rust?", "digest_bot").unwrap(),
            Command::Ask("what is rust?".to_string())
        );
        assert_eq!(
            Command::parse("/chatmodel main a/b", "digest_bot").unwrap(),
            Command::ChatModel("main a/b".to_string())
        );
        assert_eq!(Command::parse("/model", "digest_bot").unwrap(), Command::Model(String::new()));
    }

    /// **Test: Plain text and unknown commands are not commands.**
    #[test]
    fn test_non_commands() {
        assert!(Command::parse("hello", "digest_bot").is_err());
        assert!(Command::parse("/unknown", "digest_bot").is_err());
        assert!(Command::parse("/start@other_bot", "digest_bot").is_err());
    }
}
