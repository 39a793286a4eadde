//! Prompt definitions shipped with corag.
//!
//! Each one can be replaced by dropping `<id>.yml` into `.corag/prompts/`.

use crate::types::PromptDefinition;
use corag_core::{AppError, AppResult};

pub const ROUTE_QUESTION: &str = "route.question";
pub const GRADE_DOCUMENT: &str = "grade.document";
pub const GRADE_GROUNDEDNESS: &str = "grade.groundedness";
pub const GRADE_ANSWER: &str = "grade.answer";
pub const GENERATE_ANSWER: &str = "generate.answer";

/// Marker the answer prompt asks the model to emit when context is insufficient.
pub const NOT_AVAILABLE_MARKER: &str = "Information not available in source material.";

const ROUTE_QUESTION_YAML: &str = r#"
id: route.question
title: Route a question to the knowledge base or the web
apiVersion: "1.0"
temperature: 0.0
output:
  format: json
system: |
  You are an expert query router for a retrieval augmented generation system.
  The knowledge base holds the course materials and readings that were ingested into it.

  Route to "vectorstore" when the question concerns topics covered by those materials,
  including their concepts, authors, terms and definitions.
  Route to "web_search" for current events, news, practical how-to questions and
  general knowledge unrelated to the materials.
  When in doubt, choose "vectorstore".

  Reply with a JSON object of the form {"datasource": "vectorstore"} or {"datasource": "web_search"}.
template: |
  User's question:
  {{question}}
"#;

const GRADE_DOCUMENT_YAML: &str = r#"
id: grade.document
title: Grade the relevance of one retrieved document
apiVersion: "1.0"
temperature: 0.0
output:
  format: json
system: |
  Evaluate whether the document can help answer the question.
  Grade "yes" if it contains relevant answers, keywords, concepts, context or semantically aligned information.
  Grade "no" if it is completely off-topic or unhelpful.
  Be lenient: any useful information means "yes".

  Reply with a JSON object of the form {"binary_score": "yes"} or {"binary_score": "no"}.
template: |
  Retrieved document:

  {{document}}

  User question: {{question}}
"#;

const GRADE_GROUNDEDNESS_YAML: &str = r#"
id: grade.groundedness
title: Check that an answer is grounded in the documents
apiVersion: "1.0"
temperature: 0.0
output:
  format: json
system: |
  You are a strict grader evaluating whether an AI-generated answer is grounded in and
  supported by the provided source documents.

  Grade "yes" only if every claim can be traced to the documents or reasonably inferred from them.
  Grade "no" if the answer contains unsupported claims, speculation, contradictions, or generic
  knowledge the documents do not support.

  Reply with a JSON object of the form {"binary_score": "yes"} or {"binary_score": "no"}.
template: |
  User's question:
  {{question}}

  Source documents:
  {{documents}}

  Generated answer to evaluate:
  {{generation}}
"#;

const GRADE_ANSWER_YAML: &str = r#"
id: grade.answer
title: Check that an answer addresses the question
apiVersion: "1.0"
temperature: 0.0
output:
  format: json
system: |
  You are an expert evaluator deciding whether a generated answer addresses the user's question.

  Grade "yes" if the answer attempts to address the question with relevant, on-topic content,
  even if it is partial.
  Grade "no" if it ignores the question, is off-topic, or only states that it cannot answer.

  Reply with a JSON object of the form {"binary_score": "yes"} or {"binary_score": "no"}.
template: |
  User's question:
  {{question}}

  Generated answer:
  {{generation}}
"#;

const GENERATE_ANSWER_YAML: &str = r#"
id: generate.answer
title: Answer from the supplied context only
apiVersion: "1.0"
temperature: 0.0
output:
  format: text
system: |
  Answer using ONLY the provided context. Do not add external knowledge.

  Length:
  - Simple or factual questions: 30-50 words
  - Complex questions: 200-300 words
  - Step-by-step or list questions: numbered steps or bullet points

  If the context lacks the information, reply exactly: "Information not available in source material."
  Give only the answer, without headers or commentary.

  Context:
  {{context}}
template: |
  Question: {{question}}

  Answer:
"#;

/// Ids of every built-in prompt.
pub const BUILTIN_IDS: [&str; 5] = [
    ROUTE_QUESTION,
    GRADE_DOCUMENT,
    GRADE_GROUNDEDNESS,
    GRADE_ANSWER,
    GENERATE_ANSWER,
];

/// Look up a built-in prompt definition by id.
pub fn builtin_prompt(id: &str) -> AppResult<PromptDefinition> {
    let yaml = match id {
        ROUTE_QUESTION => ROUTE_QUESTION_YAML,
        GRADE_DOCUMENT => GRADE_DOCUMENT_YAML,
        GRADE_GROUNDEDNESS => GRADE_GROUNDEDNESS_YAML,
        GRADE_ANSWER => GRADE_ANSWER_YAML,
        GENERATE_ANSWER => GENERATE_ANSWER_YAML,
        _ => {
            return Err(AppError::Prompt(format!(
                "No built-in prompt with id '{}'",
                id
            )))
        }
    };

    serde_yaml::from_str(yaml)
        .map_err(|e| AppError::Prompt(format!("Built-in prompt '{}' is invalid: {}", id, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_parses_with_matching_id() {
        for id in BUILTIN_IDS {
            let def = builtin_prompt(id).unwrap();
            assert_eq!(def.id, id);
            assert!(def.system.is_some());
        }
    }

    #[test]
    fn test_classifier_prompts_request_json() {
        for id in [ROUTE_QUESTION, GRADE_DOCUMENT, GRADE_GROUNDEDNESS, GRADE_ANSWER] {
            assert!(builtin_prompt(id).unwrap().output.is_json(), "{}", id);
        }
        assert!(!builtin_prompt(GENERATE_ANSWER).unwrap().output.is_json());
    }

    #[test]
    fn test_answer_prompt_carries_marker() {
        let def = builtin_prompt(GENERATE_ANSWER).unwrap();
        assert!(def.system.unwrap().contains(NOT_AVAILABLE_MARKER));
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(builtin_prompt("grade.vibes").is_err());
    }
}
