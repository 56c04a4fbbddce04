// ABOUTME: Version info and REPL banner constants

pub const VERSION: &str = "0.1.0";
pub const WELCOME_MESSAGE: &str = "ocrpi v0.1.0";
pub const WELCOME_SUBTITLE: &str = "A tree-walking interpreter for the OCR Exam Reference Language";
pub const WELCOME_FOOTER: &str = "Type a statement to run it; Ctrl-D exits.";
