use crate::models::Difficulty;

pub fn question_prompt(topic: &str, difficulty: Difficulty, count: i64) -> String {
    format!(
        r#"You are an expert quiz generator. Create multiple-choice questions as strict JSON.
Topic: {topic}
Difficulty: {difficulty}
Count: {count}

Return JSON with this schema: {{
  "items": [
    {{
      "question": string,
      "choices": [string, string, string, string],
      "correct_index": integer (0-3),
      "explanation": string (optional),
      "points": integer (optional, default 1)
    }}
  ]
}}
Do not include any commentary, markdown, or code fences. Return only raw JSON."#
    )
}

/// Inputs for explaining one answered question.
pub struct ExplanationContext<'a> {
    pub question: &'a str,
    pub choices: &'a [String],
    pub correct: Option<&'a str>,
    pub selected: Option<&'a str>,
}

pub fn explanation_prompt(ctx: &ExplanationContext<'_>) -> String {
    let choices = ctx
        .choices
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {c}", (b'A' + (i % 26) as u8) as char))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a patient tutor. Explain why the correct answer to this quiz question is correct.
Question: {question}
Choices:
{choices}
Correct answer: {correct}
The learner answered: {selected}

Return JSON with this schema: {{
  "summary": string (2-4 sentences, address the learner's answer if it was wrong),
  "resources": [{{ "title": string, "url": string }}] (0-3 reputable links)
}}
Do not include any commentary, markdown, or code fences. Return only raw JSON."#,
        question = ctx.question,
        correct = ctx.correct.unwrap_or("unknown"),
        selected = ctx.selected.unwrap_or("no answer"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_prompt_embeds_topic_difficulty_and_count() {
        let prompt = question_prompt("Science - Physics", Difficulty::Hard, 10);
        assert!(prompt.contains("Topic: Science - Physics"));
        assert!(prompt.contains("Difficulty: hard"));
        assert!(prompt.contains("Count: 10"));
        assert!(prompt.contains("\"correct_index\""));
    }

    #[test]
    fn explanation_prompt_letters_choices() {
        let choices = vec!["Paris".to_string(), "Rome".to_string()];
        let prompt = explanation_prompt(&ExplanationContext {
            question: "Capital of France?",
            choices: &choices,
            correct: Some("Paris"),
            selected: None,
        });
        assert!(prompt.contains("A. Paris\nB. Rome"));
        assert!(prompt.contains("The learner answered: no answer"));
    }
}
