//! Prompt templates for workflow stages

use super::models::UserPreferences;

const BASE_SYSTEM_PROMPT: &str =
    "أنت مساعد ذكي متقدم يتحدث العربية بطلاقة. تتميز بالدقة والوضوح والمساعدة الفعالة.";

/// Returned when no stage produced output
pub const APOLOGY_MESSAGE: &str = "أعتذر، حدث خطأ في معالجة طلبك. يرجى المحاولة مرة أخرى.";

/// Kind of instruction a stage sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Planning,
    Analysis,
    Execution,
    Creative,
    General,
}

impl StageKind {
    /// Metric/log key
    pub fn key(&self) -> &'static str {
        match self {
            StageKind::Planning => "planning",
            StageKind::Analysis => "analysis",
            StageKind::Execution => "execution",
            StageKind::Creative => "creative",
            StageKind::General => "general",
        }
    }

    /// Section title in combined output
    pub fn title(&self) -> &'static str {
        match self {
            StageKind::Planning => "التخطيط",
            StageKind::Analysis => "التحليل",
            StageKind::Execution => "التنفيذ",
            StageKind::Creative => "الإبداع",
            StageKind::General => "الإجابة",
        }
    }

    /// Build the instruction for this stage. `previous` is the output of the
    /// preceding stage, empty for the first one.
    pub fn instruction(&self, user_message: &str, previous: &str) -> String {
        match self {
            StageKind::Planning => format!(
                "المستخدم يطلب: {user_message}\n\n\
                 كمخطط ذكي: افهم المتطلبات، حلل التحديات المحتملة، ضع خطة تنفيذية مرحلية، \
                 وحدد الأدوات والتقنيات المطلوبة.\n\
                 قدم خطة مفصلة ومنظمة باللغة العربية."
            ),
            StageKind::Analysis => format!(
                "الخطة المقترحة:\n{previous}\n\n\
                 الطلب الأصلي: {user_message}\n\n\
                 كمحلل منطقي: راجع الخطة، حدد نقاط القوة والضعف، اقترح تحسينات، \
                 وضع المواصفات التقنية والمخاطر.\n\
                 قدم تحليلاً شاملاً ومواصفات دقيقة."
            ),
            StageKind::Execution => format!(
                "التحليل والمواصفات:\n{previous}\n\n\
                 الطلب الأصلي: {user_message}\n\n\
                 كمطور خبير: نفذ الحل الفعلي بكود عالي الجودة مع التوثيق وأمثلة الاستخدام.\n\
                 قدم الحل الكامل والقابل للتنفيذ."
            ),
            StageKind::Creative => format!(
                "الطلب الإبداعي: {user_message}\n\n\
                 كمساعد إبداعي: قدم محتوى أصيلاً ومميزاً يراعي الثقافة العربية."
            ),
            StageKind::General => format!(
                "سؤال المستخدم: {user_message}\n\n\
                 كمساعد ذكي: قدم إجابة دقيقة وواضحة مع أمثلة عملية عند الحاجة."
            ),
        }
    }
}

/// System prompt shaped by user preferences
pub fn system_prompt(preferences: &UserPreferences) -> String {
    let mut prompt = BASE_SYSTEM_PROMPT.to_string();

    if preferences.response_style.as_deref() == Some("detailed") {
        prompt.push_str(" يُفضل المستخدم الردود المفصلة والشاملة.");
    }
    if preferences.code_comments {
        prompt.push_str(" عند كتابة الكود، أضف تعليقات باللغة العربية.");
    }
    if preferences.arabic_labels {
        prompt.push_str(" استخدم المصطلحات العربية عند الإمكان.");
    }

    prompt
}

/// Merge stage outputs into one Markdown document
pub fn combine_results(results: &[(StageKind, String)]) -> String {
    let mut combined = String::from("# نتيجة المعالجة المتقدمة\n");
    for (stage, content) in results {
        combined.push_str(&format!("\n## {}\n\n{}\n\n---\n", stage.title(), content));
    }
    combined
}
