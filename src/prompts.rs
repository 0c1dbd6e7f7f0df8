//! Fixed instruction strings for each pipeline stage.

use crate::pipeline::ProblemStatement;

pub const CLASSIFY_SYSTEM: &str = "You are a content classifier. You will be shown screenshots \
of a technical problem. Respond with exactly one word and nothing else.";

pub const CLASSIFY_USER: &str = "Look at the screenshots. If they show a programming problem \
that expects code as the answer, respond with exactly: coding\n\
For anything else (conceptual, multiple choice, math, system design, trivia), respond with \
exactly: general";

pub const EXTRACT_SYSTEM: &str = "You are a precise information extractor. Respond with a \
single JSON object only. No markdown, no commentary.";

pub const EXTRACT_USER: &str = r#"Extract the programming problem shown in the screenshots into JSON with this shape:
{
  "title": "problem title",
  "description": "full problem description",
  "examples": [{"input": "...", "output": "...", "explanation": "optional"}],
  "constraints": ["constraint 1", "constraint 2"],
  "followUp": "optional follow-up question"
}
Transcribe faithfully; do not invent examples or constraints that are not visible."#;

pub const VERIFY_SYSTEM: &str = "You are a careful reviewer. Respond with exactly one word: \
true or false.";

/// Build the verification prompt comparing an extraction against the source
/// screenshots.
pub fn verify_user(statement: &ProblemStatement) -> String {
    format!(
        "Here is an extraction of the problem shown in the screenshots:\n\n\
         Title: {}\n\nDescription: {}\n\nExamples: {}\n\nConstraints: {}\n\n\
         Does this extraction faithfully match the problem in the screenshots? \
         Answer exactly true or false.",
        statement.title,
        statement.description,
        serde_json::to_string(&statement.examples).unwrap_or_else(|_| "[]".to_string()),
        statement.constraints.join("; "),
    )
}

pub const GENERATE_SYSTEM: &str = "You are an expert competitive programmer. Respond with a \
single JSON object only. No markdown, no commentary.";

/// Build the solution-generation prompt for a verified problem statement.
pub fn generate_user(statement: &ProblemStatement) -> String {
    let mut prompt = format!(
        "Solve this programming problem in JavaScript (Node.js). The program must read its \
         input from stdin and write the answer to stdout.\n\n\
         Title: {}\n\nDescription: {}\n",
        statement.title, statement.description
    );
    if !statement.examples.is_empty() {
        prompt.push_str(&format!(
            "\nExamples: {}\n",
            serde_json::to_string(&statement.examples).unwrap_or_else(|_| "[]".to_string())
        ));
    }
    if !statement.constraints.is_empty() {
        prompt.push_str(&format!("\nConstraints: {}\n", statement.constraints.join("; ")));
    }
    prompt.push_str(
        "\nRespond with JSON of this shape:\n\
         {\"approach\": \"brief explanation of the approach\", \
         \"code\": \"complete runnable program\", \
         \"timeComplexity\": \"O(...)\", \
         \"spaceComplexity\": \"O(...)\"}",
    );
    prompt
}

pub const ANSWER_SYSTEM: &str = "You are an expert assistant. Answer the question shown in \
the screenshots directly and concisely.";

pub const ANSWER_USER: &str = "Answer the question shown in the screenshots. If it is \
multiple choice, name the correct option and briefly explain why.";
