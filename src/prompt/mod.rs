use lazy_static::lazy_static;
use whatlang::Script;

/// System message sent with every completion request.
pub const SYSTEM_MESSAGE: &str = "You are a helpful assistant that answers questions \
    based on document content. Only provide structured data when explicitly requested.";

lazy_static! {
    static ref TABLE_KEYWORDS: Vec<&'static str> = vec![
        "table",
        "list employees",
        "show data",
        "in a table",
        "جدول",
    ];
    static ref CHART_KEYWORDS: Vec<&'static str> = vec![
        "chart",
        "graph",
        "visualize",
        "pie chart",
        "bar chart",
        "رسم بياني",
        "مخطط",
    ];
    static ref CARDS_KEYWORDS: Vec<&'static str> = vec![
        "key metrics",
        "summary cards",
        "dashboard",
        "مؤشرات",
        "لوحة",
    ];
}

/// What kind of structured output the user asked for, by keyword match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intent {
    pub wants_table: bool,
    pub wants_chart: bool,
    pub wants_cards: bool,
}

impl Intent {
    pub fn wants_structured(&self) -> bool {
        self.wants_table || self.wants_chart || self.wants_cards
    }
}

pub fn detect_intent(question: &str) -> Intent {
    let lowered = question.to_lowercase();
    Intent {
        wants_table: TABLE_KEYWORDS.iter().any(|k| lowered.contains(k)),
        wants_chart: CHART_KEYWORDS.iter().any(|k| lowered.contains(k)),
        wants_cards: CARDS_KEYWORDS.iter().any(|k| lowered.contains(k)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptLanguage {
    English,
    Arabic,
}

/// Questions written in Arabic script get the Arabic instruction template;
/// everything else gets English.
pub fn detect_language(question: &str) -> PromptLanguage {
    match whatlang::detect_script(question) {
        Some(Script::Arabic) => PromptLanguage::Arabic,
        _ => PromptLanguage::English,
    }
}

/// Assembles the full prompt from a document/database snapshot and the user's
/// question. Pure string formatting: a fixed snapshot and question always
/// produce the same prompt.
pub fn build_prompt(
    snapshot: &str,
    question: &str,
    intent: &Intent,
    language: PromptLanguage,
) -> String {
    match (intent.wants_structured(), language) {
        (true, PromptLanguage::English) => format!(
            "You are an AI assistant analyzing a document. Based on the following document \
             content, answer the user's question and provide structured data as requested.\n\n\
             Document Content:\n{snapshot}\n\n\
             User Question: {question}\n\n\
             Instructions:\n\
             1. Answer the user's question based on the document content\n\
             2. Since the user asked for structured data, provide it in the appropriate format\n\
             3. Be concise and avoid duplicating information\n\n\
             {STRUCTURED_FORMATS}\n\n\
             Answer:"
        ),
        (false, PromptLanguage::English) => format!(
            "You are an AI assistant analyzing a document. Based on the following document \
             content, answer the user's question accurately and comprehensively with a text \
             response only.\n\n\
             Document Content:\n{snapshot}\n\n\
             User Question: {question}\n\n\
             Instructions:\n\
             - Answer based only on the information provided in the document\n\
             - Provide a clear, well-structured text response\n\
             - Include relevant details and reference page numbers when possible\n\
             - Do NOT provide any structured data formats (tables, charts, etc.) unless \
             explicitly requested\n\
             - Keep the response conversational and informative\n\n\
             Answer:"
        ),
        (true, PromptLanguage::Arabic) => format!(
            "أنت مساعد ذكي يحلل مستندًا. استنادًا إلى محتوى المستند التالي، أجب عن سؤال \
             المستخدم باللغة العربية وقدّم البيانات المنظمة كما طُلب.\n\n\
             محتوى المستند:\n{snapshot}\n\n\
             سؤال المستخدم: {question}\n\n\
             التعليمات:\n\
             1. أجب عن السؤال استنادًا إلى محتوى المستند فقط\n\
             2. بما أن المستخدم طلب بيانات منظمة، قدّمها بالتنسيق المناسب أدناه\n\
             3. كن موجزًا وتجنب تكرار المعلومات\n\n\
             {STRUCTURED_FORMATS}\n\n\
             الإجابة:"
        ),
        (false, PromptLanguage::Arabic) => format!(
            "أنت مساعد ذكي يحلل مستندًا. استنادًا إلى محتوى المستند التالي، أجب عن سؤال \
             المستخدم باللغة العربية بإجابة نصية فقط.\n\n\
             محتوى المستند:\n{snapshot}\n\n\
             سؤال المستخدم: {question}\n\n\
             التعليمات:\n\
             - أجب استنادًا إلى المعلومات الواردة في المستند فقط\n\
             - قدّم إجابة نصية واضحة ومنظمة\n\
             - لا تقدّم أي تنسيقات بيانات منظمة (جداول أو رسوم بيانية) ما لم يُطلب ذلك صراحة\n\n\
             الإجابة:"
        ),
    }
}

/// Format block the model is told to use for structured output. The markers
/// stay in English in both templates; the formatter scans for them literally.
const STRUCTURED_FORMATS: &str = "\
IMPORTANT: Only provide structured data if explicitly requested. Format as follows:\n\n\
For tables:\n\
TABLE_DATA:\n\
headers: [Column1, Column2, Column3]\n\
rows: [[data1, data2, data3], [data4, data5, data6]]\n\n\
For charts:\n\
CHART_DATA:\n\
type: bar|pie|line\n\
title: Chart Title\n\
labels: [Label1, Label2, Label3]\n\
values: [10, 20, 30]\n\n\
For metrics:\n\
CARDS_DATA:\n\
[{\"title\": \"Metric Name\", \"value\": \"123\", \"description\": \"Description\"}]";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_is_deterministic() {
        let intent = detect_intent("show the attendance in a table");
        let a = build_prompt("SNAPSHOT", "question?", &intent, PromptLanguage::English);
        let b = build_prompt("SNAPSHOT", "question?", &intent, PromptLanguage::English);
        assert_eq!(a, b);
        assert!(a.contains("SNAPSHOT"));
        assert!(a.contains("question?"));
    }

    #[test]
    fn structured_intent_selects_format_instructions() {
        let intent = detect_intent("give me a pie chart of absences");
        assert!(intent.wants_chart);
        assert!(intent.wants_structured());

        let prompt = build_prompt("doc", "q", &intent, PromptLanguage::English);
        assert!(prompt.contains("TABLE_DATA:"));
        assert!(prompt.contains("CHART_DATA:"));
        assert!(prompt.contains("CARDS_DATA:"));
    }

    #[test]
    fn plain_question_gets_text_only_template() {
        let intent = detect_intent("who was absent most often last month?");
        assert!(!intent.wants_structured());

        let prompt = build_prompt("doc", "q", &intent, PromptLanguage::English);
        assert!(!prompt.contains("TABLE_DATA:"));
        assert!(prompt.contains("text response only"));
    }

    #[test]
    fn intent_matches_each_keyword_family() {
        assert!(detect_intent("List employees please").wants_table);
        assert!(detect_intent("visualize the data").wants_chart);
        assert!(detect_intent("show the key metrics").wants_cards);
        assert!(detect_intent("أعطني جدول الحضور").wants_table);
    }

    #[test]
    fn arabic_question_selects_arabic_template() {
        assert_eq!(
            detect_language("من كان غائبًا هذا الشهر؟"),
            PromptLanguage::Arabic
        );
        assert_eq!(
            detect_language("who was absent this month?"),
            PromptLanguage::English
        );

        let intent = detect_intent("من كان غائبًا؟");
        let prompt = build_prompt("doc", "سؤال", &intent, PromptLanguage::Arabic);
        assert!(prompt.contains("محتوى المستند"));
    }
}
