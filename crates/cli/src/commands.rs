/// What a line typed at the chat prompt asks for.
#[derive(Debug, PartialEq)]
pub enum Command {
    /// Save the summary and leave.
    Exit,
    /// Forget the conversation so far.
    Clear,
    /// Show the running session metrics.
    Stats,
    /// Nothing typed.
    Empty,
    /// A message for the model.
    Ask(String),
}

impl Command {
    /// Commands are matched case-insensitively on the trimmed line;
    /// anything else is a question.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.to_lowercase().as_str() {
            "" => Command::Empty,
            "exit" | "quit" | "/exit" | "/quit" => Command::Exit,
            "clear" => Command::Clear,
            "stats" => Command::Stats,
            _ => Command::Ask(trimmed.to_string()),
        }
    }
}
