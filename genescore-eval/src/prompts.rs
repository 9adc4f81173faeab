//! Instruction prompts for each question type

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::items::QuestionType;

const PREAMBLE: &str =
    "You are a biologist. Please carefully read the provided instruction and answer the questions.";

const EVIDENCE_CODES: &str =
    "EXP, IDA, IPI, IMP, IGI, IEP, IBA, IBD, IKR, IRD, ISM, IGC, RCA, TAS, NAS, IC, ND, IEA";

const EXPRESSION_CATEGORIES: &str = "'Low expression', 'Broad expression', 'Biased expression', \
     'Restricted expression', 'Ubiquitous expression'";

const CANDIDATE_TISSUES: &str = "'fat', 'brain', 'gall bladder', 'heart', 'endometrium', \
     'prostate', 'testis', 'salivary gland', 'lung', 'ovary', 'esophagus', 'colon', 'duodenum', \
     'liver', 'lymph node', 'appendix', 'small intestine', 'skin', 'urinary bladder', 'stomach', \
     'spleen', 'adrenal', 'kidney', 'placenta', 'bone marrow', 'thyroid', 'pancreas'";

/// A question as stored in the benchmark data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Kept as text so unrecognized types still render
    #[serde(default)]
    pub question_type: String,
    #[serde(default)]
    pub question: String,
    /// Option letter to option text, in display order
    #[serde(default)]
    pub options: IndexMap<String, String>,
    #[serde(default)]
    pub context: Option<String>,
}

/// Exact shape of the reply each question type is parsed as
pub fn format_instructions(question_type: QuestionType) -> &'static str {
    match question_type {
        QuestionType::SingleChoice => {
            "Answer format: respond with only the JSON object {\"answer\": \"A\"}, where the \
             value is exactly one of \"A\", \"B\", \"C\" or \"D\"."
        }
        QuestionType::MultipleChoice => {
            "Answer format: respond with only the JSON object {\"answers\": [\"A\", \"C\"]}, \
             listing each correct option once in alphabetical order, every one of \"A\", \"B\", \
             \"C\" or \"D\"."
        }
        QuestionType::Designation => {
            "Answer format: respond with only the JSON object {\"designation\": [\"protein1\", \
             \"protein2\"]}, or {\"designation\": []} when no name is known."
        }
        QuestionType::Expression => {
            "Answer format: respond with only the JSON object {\"Tissue\": [\"liver\", \"colon\"], \
             \"Category\": \"Biased expression\"}, with no other keys."
        }
        QuestionType::GoAnnotation => {
            "Answer format: respond with only the JSON array [{\"go\": \"located in nucleus\", \
             \"evidence\": \"IDA\"}], where every object has exactly the keys \"go\" and \
             \"evidence\"."
        }
        QuestionType::Summary => {
            "Answer format: respond with only the JSON object {\"summary\": \"functional summary \
             of the gene\"}."
        }
    }
}

/// Render the instruction prompt for one question.
///
/// Every prompt ends with the reply format the scorer parses; unknown
/// question types get the bare question and the summary format.
pub fn render_prompt(record: &QuestionRecord) -> String {
    let Ok(question_type) = record.question_type.parse::<QuestionType>() else {
        tracing::debug!("No prompt template for question type '{}'", record.question_type);
        return format!(
            "{}\n{}",
            record.question,
            format_instructions(QuestionType::Summary)
        );
    };

    let question = &record.question;
    let context = record
        .context
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let mut prompt = match question_type {
        QuestionType::SingleChoice => format!(
            "{PREAMBLE}\nQuestion: {question}\nOptions: {}\nTask Instruction: Only provide the \
             letter of the correct option. Do not include option details and any additional \
             information or explanations.",
            options_text(&record.options)
        ),
        QuestionType::MultipleChoice => format!(
            "{PREAMBLE}\nQuestion: {question}\nOptions: {}\nTask Instruction: Only provide the \
             letters of the correct options. Do not include option details and any additional \
             information or explanations.",
            options_text(&record.options)
        ),
        QuestionType::Designation => format!(
            "{PREAMBLE}\nQuestion: {question}\nTask Instruction:\nOnly provide all related \
             proteins of the given gene in a list format and format them as a JSON dictionary, \
             like {{\"designation\": [\"protein1\", \"protein2\"]}}. If you cannot answer the \
             question, respond with an empty JSON dictionary {{\"designation\": []}}."
        ),
        QuestionType::Expression => format!(
            "{PREAMBLE}\nQuestion: {question}\nTask Instruction:\n\
             Provide a JSON dictionary with two keys: 'Tissue' and 'Category'.\n\
             'Tissue' key's value should be a list of relevant tissues.\n\
             'Category' key's value must be one of the following categories:\n\
             {EXPRESSION_CATEGORIES}.\n\
             Here are the candidate tissues:\n{CANDIDATE_TISSUES}.\n\
             For 'Low expression' category, the tissue list should be 'Low expression'. \
             For example: {{\"Tissue\": [\"Low expression\"], \"Category\": \"Low expression\"}}.\n\
             Only provide the JSON dictionary as your response, without any additional text or \
             explanations."
        ),
        QuestionType::GoAnnotation => format!(
            "{PREAMBLE}\nQuestion: {question}\nTask Instruction:\n\
             Provide a JSON array of objects. Each object in the array must contain two keys: \
             'go' and 'evidence'.\n\
             The value for 'go' should be the full Gene Ontology annotation.\n\
             The value for 'evidence' must be one of the following codes:\n{EVIDENCE_CODES}.\n\
             Do not include any additional information, explanations, or text before or after \
             the JSON array."
        ),
        QuestionType::Summary => format!(
            "{PREAMBLE}\nQuestion: {question}\nTask Instruction:\n\
             Provide a functional summary of the given gene.\n\
             Do not include any additional information or explanations outside the summary."
        ),
    };

    if let Some(context) = context {
        match question_type {
            QuestionType::GoAnnotation => {
                prompt.push_str("\nYour answer should be based on the context.\nContext: ");
                prompt.push_str(context);
            }
            QuestionType::Summary => {
                prompt.push_str(
                    "\nYou could use the following context to answer the question.\nContext: ",
                );
                prompt.push_str(context);
            }
            _ => {}
        }
    }

    prompt.push('\n');
    prompt.push_str(format_instructions(question_type));
    prompt
}

fn options_text(options: &IndexMap<String, String>) -> String {
    options
        .iter()
        .map(|(letter, option)| format!("\n{}. {}", letter, option))
        .collect()
}
