//! Instruction prompts for the translation and polishing passes.

/// Prompt for translating one segment into `target_language`.
pub fn translation_prompt(segment: &str, target_language: &str) -> String {
    format!(
        "Please act as a professional {lang} translator and you will actually follow the steps below to produce a natural and professional {lang} translation.\n\
         1. Carefully read and fully understand the original text, ensuring thorough comprehension without haste.\n\
         2. Carefully think and consider how you would share the content you just read with your imagined audience in {lang}.\n\
         3. Start to translate the text by writing down the proposed sharing content you just had with your imagined audience in {lang}. Avoid translating word-for-word; aim for a comfortable, natural, and smooth manner of expression.\n\
         \n\
         {segment}",
        lang = target_language,
        segment = segment,
    )
}

/// Prompt for polishing the merged translation.
///
/// The model never sees the source text, only the chunk-by-chunk translation.
pub fn polishing_prompt(merged: &str, target_language: &str) -> String {
    format!(
        "以下是一段由原文逐塊翻譯再合併而成的{lang}文本。\n\
         由於是分塊翻譯後合併，可能存在以下問題：\n\
         1.  語句之間銜接不夠自然流暢。\n\
         2.  可能出現因分塊導致的語意中斷或重複。\n\
         3.  可能包含模型因分塊不完整而產生的提示性語句（例如：\"The text cuts off here\", \"以下篇幅過長\" 等類似訊息）。\n\
         4.  整體風格可能不夠統一。\n\
         \n\
         請你扮演一位資深的{lang}編輯，執行以下任務：\n\
         1.  **分析並理解**提供的文本內容。\n\
         2.  **校對語法錯誤**，修正任何不正確的表達。\n\
         3.  **去除贅字和重複**，使語言更精煉。\n\
         4.  **潤飾語句**，確保整篇文本語氣連貫、表達自然、流暢易讀，符合專業的{lang}書寫風格。\n\
         5.  **移除或修正**任何由分塊翻譯產生的不必要提示性語句或中斷標記。\n\
         6.  確保最終輸出的文本意思忠於原文（雖然你看不到原文，但要基於提供的譯文使其更完美）。\n\
         7.  請直接輸出潤飾後的完整{lang}文本，不要包含任何額外的解釋或開頭語。\n\
         \n\
         待潤飾的{lang}文本如下：\n\
         \n\
         {merged}",
        lang = target_language,
        merged = merged,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_prompt_ends_with_segment() {
        let prompt = translation_prompt("The quick brown fox.", "繁體中文");

        assert!(prompt.starts_with("Please act as a professional 繁體中文 translator"));
        assert!(prompt.contains("3. Start to translate"));
        assert!(prompt.ends_with("\n\nThe quick brown fox."));
    }

    #[test]
    fn test_polishing_prompt_mentions_language_and_text() {
        let prompt = polishing_prompt("第一段\n\n第二段", "日本語");

        assert!(prompt.starts_with("以下是一段由原文逐塊翻譯再合併而成的日本語文本。"));
        assert!(prompt.contains("資深的日本語編輯"));
        assert!(prompt.ends_with("待潤飾的日本語文本如下：\n\n第一段\n\n第二段"));
    }
}
