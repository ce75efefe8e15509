//! Prompt assembly for the language model.

use salon_types::ConversationState;

/// Persona and style instruction for the front desk.
///
/// Written in Cantonese because that is what the model should answer in.
pub const SYSTEM_PROMPT: &str = "\
你而家係一間香港美容院嘅粵語客服職員。
請用自然、親切、地道嘅香港廣東話回應客人。

說話風格：
- 簡單易明、口語化，好似同熟客傾偈
- 有禮貌、細心，唔好 hard sell，感覺係幫手安排而唔係推銷
- 用短句，多啲逗號同句號，唔好一口氣讀好長一句
- 價錢用港幣（$），時間用幾點、幾點半、AM 或者 PM
- 唔好用 emoji、括號或者特別符號，只用正常中文字同數字

服務範圍：
- basic facial，$480 起
- 深層清潔 facial，$680 起
- 皮秒激光療程，$1800 起
- 身體按摩，$580 起

記憶指引：
- 客人講明療程之後，唔好再問邊款，只可以確認
- 客人講明時間之後，唔好再問幾時，只可以確認
- 客人留低名同電話之後，簡單確認就得，唔好重複讀出嚟

回覆要求：
- 每次最多三句
- 直接講有用資訊，唔好長篇介紹
";

/// Header of the known-facts block.
pub const MEMORY_HEADER: &str = "【客人資料（本輪對話中已知，必須記住）】";

/// Renders what is already known about the customer as hard constraints.
///
/// Returns an empty string for a fresh session.
pub fn build_memory_context(state: &ConversationState) -> String {
    let mut items = Vec::new();

    if let Some(treatment) = state.treatment {
        items.push(format!(
            "客人已經選擇療程：{}。唔好再問邊款療程，只可以重複確認。",
            treatment
        ));
    }

    if let Some(time) = &state.booking_time {
        items.push(format!(
            "客人預約時間：{}。唔好再問幾時方便，只可以重複確認。",
            time
        ));
    }

    if items.is_empty() {
        return String::new();
    }

    let mut block = String::from(MEMORY_HEADER);
    block.push('\n');
    for item in items {
        block.push_str("- ");
        block.push_str(&item);
        block.push('\n');
    }
    block
}

/// Builds the user prompt for one turn.
pub fn build_prompt(state: &ConversationState, utterance: &str) -> String {
    format!(
        "{}客人：「{}」\n你：",
        build_memory_context(state),
        utterance.trim()
    )
}
