//! Prompt templates and the fixed texts of the interactive session.
//!
//! Keeping every user-visible string and the turn layout here means the
//! chat loop and orchestrator read as control flow only, and tests can
//! assert against the same constants the program prints.

/// Marker preceding each user line in the assembled prompt.
pub const USER_MARKER: &str = "User:";

/// Marker preceding each model reply; the prompt ends with it so the model
/// continues from there.
pub const MODEL_MARKER: &str = "Model:";

/// Sentinel that ends a chat session or the whole program.
pub const EXIT_COMMAND: &str = "exit";

/// Affirmative answer to the export question.
pub const YES: &str = "yes";

pub const DOCUMENT_PROMPT: &str =
    "Enter the path of the PDF file to load (or type 'exit' to quit): ";
pub const CHAT_PROMPT: &str = "\nYou: ";
pub const EXPORT_QUESTION: &str = "Do you want to save and convert the last output? (yes/no): ";
pub const EXPORT_BASE_NAME_PROMPT: &str = "Enter the base name for the output files: ";
pub const EXPORT_FORMAT_PROMPT: &str = "Choose the output format (txt/md/pptx/docx/xlsx): ";

pub const INITIAL_PROMPT_SENT: &str = "\nInitial prompt sent to model.\n";
pub const MODEL_OUTPUT_HEADING: &str = "Model Output:";
pub const MODEL_ERROR_HEADING: &str = "Error running the model:";
pub const CHAT_EXIT_MESSAGE: &str = "Exiting the chat.";
pub const PROGRAM_EXIT_MESSAGE: &str = "Exiting the program.";
pub const INVALID_FORMAT_MESSAGE: &str = "Invalid format selected.";

/// Rule printed after every chat turn.
pub fn turn_separator() -> String {
    format!("\n{}\n", "-".repeat(70))
}

/// Rule printed around a document's chat session.
pub fn session_separator() -> String {
    format!("\n{}", "-".repeat(22))
}

/// Whether `input` is the exit sentinel (case-insensitive, surrounding
/// whitespace ignored).
pub fn is_exit(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case(EXIT_COMMAND)
}

/// Append one completed exchange to a running prompt.
pub fn push_turn(prompt: &mut String, user_input: &str, response: &str) {
    prompt.push('\n');
    prompt.push_str(USER_MARKER);
    prompt.push(' ');
    prompt.push_str(user_input);
    prompt.push('\n');
    prompt.push_str(MODEL_MARKER);
    prompt.push(' ');
    prompt.push_str(response);
}

/// Append the pending user line and leave the prompt open for the model.
pub fn push_pending_turn(prompt: &mut String, user_input: &str) {
    prompt.push('\n');
    prompt.push_str(USER_MARKER);
    prompt.push(' ');
    prompt.push_str(user_input);
    prompt.push('\n');
    prompt.push_str(MODEL_MARKER);
}
