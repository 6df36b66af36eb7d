//! Prompt templates for the persona, observer, and corrector.
//!
//! The live persona instructions always travel as the system prompt; the
//! builders here only produce the user-side prompt text.

/// Startup persona instructions.
pub const DEFAULT_INSTRUCTIONS: &str = "Вы - профессиональный психолог-консультант. Ваша задача - помогать клиентам, проявляя эмпатию и используя научно-обоснованные методы терапии.";

/// Name of the only tool the persona may request.
pub const SEARCH_TOOL_NAME: &str = "internet_search";

pub const SEARCH_TOOL_DESCRIPTION: &str = "Поиск актуальной информации в интернете: научные исследования, методики терапии, статьи и факты. Входные данные: поисковый запрос.";

const EMPTY_HISTORY: &str = "(история пуста)";

pub struct PromptBuilder;

impl PromptBuilder {
    /// Plain reply without tools.
    pub fn persona_direct(history: &str, question: &str) -> String {
        format!(
            "История беседы:\n{}\n\nВопрос клиента: {}\n\nОтветьте клиенту как психолог-консультант.",
            or_placeholder(history),
            question
        )
    }

    /// One step of the search-assisted reasoning loop.
    pub fn persona_reasoning(history: &str, question: &str, scratchpad: &str) -> String {
        format!(
            "У вас есть доступ к следующим инструментам:\n\
             {SEARCH_TOOL_NAME}: {SEARCH_TOOL_DESCRIPTION}\n\n\
             Используйте инструмент поиска только когда клиент явно запрашивает \
             фактическую информацию, упоминает исследования, методики, статьи, \
             научные факты или когда вам нужно проверить конкретную информацию \
             перед ответом. В остальных случаях отвечайте на основе своих знаний \
             и опыта как терапевт.\n\n\
             Формат взаимодействия:\n\
             Вопрос: вопрос клиента\n\
             Мысли: размышления о том, как лучше всего ответить или какой инструмент использовать\n\
             Действие: имя используемого инструмента\n\
             Данные действия: поисковый запрос для инструмента\n\
             Наблюдение: результат использования инструмента\n\
             Ответ: ваш окончательный ответ клиенту\n\n\
             История беседы:\n{}\n\n\
             Начнем!\n\
             Вопрос: {}\n{}",
            or_placeholder(history),
            question,
            scratchpad
        )
    }

    pub fn observer(dialogue: &str) -> String {
        format!(
            "Вы - опытный супервизор психологов. Ваша задача - анализировать диалоги \
             между психологом и клиентом, выявляя возможные ошибки, неточности или \
             области для улучшения в работе психолога.\n\n\
             Обратите особое внимание на:\n\
             1. Соблюдение этических норм\n\
             2. Правильность применения терапевтических техник\n\
             3. Эмпатию и понимание клиента\n\
             4. Четкость и понятность объяснений\n\
             5. Профессиональную грамотность\n\n\
             Диалог для анализа:\n{}\n\n\
             Пожалуйста, проанализируйте этот диалог и укажите:\n\
             1. Основные сильные стороны в работе психолога\n\
             2. Области, требующие улучшения (если есть)\n\
             3. Конкретные рекомендации по улучшению работы",
            or_placeholder(dialogue)
        )
    }

    pub fn corrector(old_instructions: &str, analysis: &str) -> String {
        format!(
            "Вы - эксперт по улучшению промптов для языковых моделей. Ваша задача - \
             обновить промпт психолога-консультанта на основе анализа его работы.\n\n\
             Текущий промпт психолога:\n{}\n\n\
             Анализ работы психолога:\n{}\n\n\
             Пожалуйста, создайте обновленную версию промпта, которая:\n\
             1. Сохранит все сильные стороны текущего промпта\n\
             2. Исправит выявленные проблемы\n\
             3. Добавит конкретные инструкции по улучшению работы\n\
             4. Сделает акцент на этичности и профессионализме\n\
             5. Сохранит ясность и четкость инструкций\n\n\
             Обновленный промпт должен быть конкретным, практичным и эффективным. \
             Верните только текст нового промпта.",
            old_instructions, analysis
        )
    }
}

fn or_placeholder(text: &str) -> &str {
    if text.trim().is_empty() {
        EMPTY_HISTORY
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_gets_placeholder() {
        let prompt = PromptBuilder::persona_direct("", "Здравствуйте");
        assert!(prompt.contains(EMPTY_HISTORY));
        assert!(prompt.contains("Вопрос клиента: Здравствуйте"));
    }

    #[test]
    fn reasoning_prompt_lists_the_tool_and_scratchpad() {
        let prompt = PromptBuilder::persona_reasoning(
            "Клиент: привет",
            "что говорит наука?",
            "Наблюдение: результаты",
        );
        assert!(prompt.contains("internet_search: Поиск"));
        assert!(prompt.contains("Вопрос: что говорит наука?\nНаблюдение: результаты"));
        assert!(prompt.contains("Клиент: привет"));
    }

    #[test]
    fn corrector_prompt_embeds_both_inputs() {
        let prompt = PromptBuilder::corrector("I0", "Есть проблема с эмпатией");
        assert!(prompt.contains("Текущий промпт психолога:\nI0"));
        assert!(prompt.contains("Анализ работы психолога:\nЕсть проблема с эмпатией"));
    }

    #[test]
    fn observer_prompt_embeds_dialogue() {
        let prompt = PromptBuilder::observer("Клиент: a\nПсихолог: b");
        assert!(prompt.contains("Диалог для анализа:\nКлиент: a\nПсихолог: b"));
        assert!(prompt.starts_with("Вы - опытный супервизор"));
    }
}
