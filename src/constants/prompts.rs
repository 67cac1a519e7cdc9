use once_cell::sync::Lazy;

use crate::models::domain::McqCandidate;

pub const SELF_REFINE_PROMPT: &str = "Given the following university course content, write one high-quality multiple-choice question.

Steps:
1. Write a clear, pedagogically relevant question stem.
2. Give the correct answer.
3. Critique your own question (too easy? ambiguous? answerable from the content?).
4. Rewrite the question to address the critique.

Do not rephrase questions that merely restate a heading. Prefer concepts that test deeper understanding of the content rather than recall of a single word.

Respond in exactly this format:
STEM: <initial question>
ANSWER: <correct answer>
CRITIQUE: <evaluation>
IMPROVED: <improved question, followed by its correct answer>

Context:
{context}
";

pub const ELABORATION_PROMPT: &str = "Given the revised multiple-choice question below, write exactly 3 distractors: answers that are plausible to a student but incorrect.

Return the final question as a single JSON object with the keys \"stem\", \"key\" and \"distractors\":
{
  \"stem\": \"<revised question>\",
  \"key\": \"<correct answer>\",
  \"distractors\": [\"...\", \"...\", \"...\"]
}

Return only the JSON object. Do not add explanations or commentary.
Every field must be present and non-empty, and \"distractors\" must contain exactly 3 strings.

JSON schema of the object:
{schema}

Revised question:
{revised}
";

pub const QUERY_REWRITE_PROMPT: &str = "You are a multilingual query rewriting assistant. The user's question is in English, but the course documents may use Romanian, French or Latin-derived terminology.

Rewrite the question with multilingual synonyms and related domain terminology so it matches academic and technical passages more closely.

Keep the original meaning. Do not widen or narrow the question's scope.

Original question:
{query}

Rewritten technical query:
";

pub const TUTOR_PROMPT: &str = "You are a helpful tutor. The student's question is in English. The source documents may contain Romanian, French or Latin-derived academic terms.

Answer using only the information in the context. Be accurate and concise.

Guidelines:
- Never invent syntax, rules or features the context does not describe.
- If the context does not define the concept, say: \"The document does not explicitly define '{query}', but related terms include...\"
- Avoid confident answers that are not grounded in the context.
- Always answer in clear, educational English.

Context:
{context}

Question:
{query}

Answer:
";

/// Generic queries used to source extra contexts from the retrieval index
/// when clustering yields too few questions.
pub const SEED_QUERIES: [&str; 5] = [
    "What are the key components and their functions?",
    "How does this algorithm work step by step?",
    "What are the performance and complexity characteristics?",
    "What are common implementation challenges?",
    "How does this compare to alternative approaches?",
];

static MCQ_CANDIDATE_SCHEMA: Lazy<String> = Lazy::new(|| {
    serde_json::to_string_pretty(&schemars::schema_for!(McqCandidate))
        .unwrap_or_else(|_| "{}".to_string())
});

pub fn mcq_candidate_schema() -> &'static str {
    MCQ_CANDIDATE_SCHEMA.as_str()
}

/// Substitutes `{name}` placeholders in a single pass over the template.
/// Substituted values are never scanned again, so a document quoting a
/// placeholder verbatim stays intact.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    loop {
        let next = values
            .iter()
            .filter_map(|(name, value)| {
                let placeholder = format!("{{{}}}", name);
                rest.find(&placeholder).map(|at| (at, placeholder.len(), *value))
            })
            .min_by_key(|(at, _, _)| *at);

        match next {
            Some((at, len, value)) => {
                out.push_str(&rest[..at]);
                out.push_str(value);
                rest = &rest[at + len..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

pub fn self_refine_prompt(context: &str) -> String {
    fill(SELF_REFINE_PROMPT, &[("context", context)])
}

pub fn elaboration_prompt(revised: &str) -> String {
    fill(
        ELABORATION_PROMPT,
        &[("schema", mcq_candidate_schema()), ("revised", revised)],
    )
}

pub fn query_rewrite_prompt(query: &str) -> String {
    fill(QUERY_REWRITE_PROMPT, &[("query", query)])
}

pub fn tutor_prompt(context: &str, query: &str) -> String {
    fill(TUTOR_PROMPT, &[("context", context), ("query", query)])
}
