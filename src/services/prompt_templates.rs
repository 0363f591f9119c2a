use serde_json::{json, Value as JsonValue};

use crate::models::score::ScoreRequest;

/// System prompt for the scoring assistant.
pub fn scoring_system_prompt() -> &'static str {
    "你是评分助手，仅按要求格式返回分数，不额外说话"
}

/// User prompt embedding the task fields verbatim. The required answer format
/// is the one `score_parser` accepts.
pub fn build_score_prompt(request: &ScoreRequest) -> String {
    format!(
        "请严格按照以下要求给用户评分，不允许添加任何额外文字！\n\
         任务类型：【{task_type}】\n\
         努力描述：【{effort}】\n\
         能力描述：【{ability}】\n\
         评分要求：\n\
         1. 努力程度和能力各评1-10分（1最低，10最高）；\n\
         2. 仅返回一行文字，格式必须是：努力程度：X，能力：X（X是数字）；\n\
         3. 除了上述格式，不能有任何其他内容（包括解释、标点、换行）。",
        task_type = request.task_type,
        effort = request.effort_description,
        ability = request.ability_description,
    )
}

pub fn build_score_payload(model: &str, request: &ScoreRequest) -> JsonValue {
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": scoring_system_prompt() },
            { "role": "user", "content": build_score_prompt(request) }
        ]
    })
}
