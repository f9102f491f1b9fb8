use super::base_meta;
use mdl_index_common::Document;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// User-provided guidance for SQL generation. Default instructions apply to every
/// question; the others are matched through their example questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: String,
    pub instruction: String,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InstructionsChunker;

impl InstructionsChunker {
    pub fn chunk(&self, instructions: &[Instruction], project_id: Option<&str>) -> Vec<Document> {
        let mut documents = Vec::new();
        for instruction in instructions {
            let meta = || {
                let mut meta = base_meta(project_id);
                meta.insert("instruction_id".to_string(), json!(instruction.id));
                meta.insert("instruction".to_string(), json!(instruction.instruction));
                meta.insert("is_default".to_string(), json!(instruction.is_default));
                meta
            };

            if instruction.is_default {
                documents.push(Document::new(instruction.instruction.clone(), meta()));
                continue;
            }
            if instruction.questions.is_empty() {
                tracing::warn!("Instruction {} has no questions and is not default, skipping", instruction.id);
                continue;
            }
            for question in &instruction.questions {
                documents.push(Document::new(question.clone(), meta()));
            }
        }
        documents
    }
}
