//! Conversation builders

use crate::types::{ConversationTurn, FunctionCall, FunctionResponse, Part, Role};

/// A single user turn carrying the prompt
pub fn build_initial(prompt: impl Into<String>) -> Vec<ConversationTurn> {
    vec![ConversationTurn::user_text(prompt)]
}

/// Prior turns, then the model's call, then the tool's response
pub fn build_with_tool_result(
    prior: &[ConversationTurn],
    call: &FunctionCall,
    response: &FunctionResponse,
) -> Vec<ConversationTurn> {
    build_with_tool_results(prior, &[(call.clone(), response.clone())])
}

/// Prior turns, then one model turn with every call, then one turn with every response
///
/// Calls and responses keep the order of `exchanges`. An empty slice returns
/// the prior turns unchanged.
pub fn build_with_tool_results(
    prior: &[ConversationTurn],
    exchanges: &[(FunctionCall, FunctionResponse)],
) -> Vec<ConversationTurn> {
    let mut turns = prior.to_vec();
    if exchanges.is_empty() {
        return turns;
    }

    let calls = exchanges
        .iter()
        .map(|(call, _)| Part::FunctionCall(call.clone()))
        .collect();
    let responses = exchanges
        .iter()
        .map(|(_, response)| Part::FunctionResponse(response.clone()))
        .collect();

    turns.push(ConversationTurn::new(Role::Model, calls));
    turns.push(ConversationTurn::new(Role::Unspecified, responses));
    turns
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn city_call() -> FunctionCall {
        FunctionCall::new("cityTime", json!({ "city": "nyc" }).as_object().cloned().unwrap())
    }

    #[test]
    fn test_build_initial() {
        let turns = build_initial("What is the time in ny?");

        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].parts, vec![Part::text("What is the time in ny?")]);
    }

    #[test]
    fn test_build_with_tool_result_preserves_prior() {
        let initial = build_initial("What is the time in ny?");
        let call = city_call();
        let response = FunctionResponse::text(&call, "3:00 PM in New York");

        let turns = build_with_tool_result(&initial, &call, &response);

        assert_eq!(turns.len(), 3);
        assert_eq!(&turns[..1], &initial[..]);
        assert_eq!(turns[1].role, Role::Model);
        assert_eq!(turns[1].parts, vec![Part::FunctionCall(call)]);
        assert_eq!(turns[2].parts, vec![Part::FunctionResponse(response)]);
        // The prior conversation is untouched
        assert_eq!(initial.len(), 1);
    }

    #[test]
    fn test_build_with_tool_results_keeps_exchange_order() {
        let prior = vec![
            ConversationTurn::user_text("first"),
            ConversationTurn::new(Role::Model, vec![Part::text("ok")]),
            ConversationTurn::user_text("second"),
        ];
        let a = FunctionCall::new("a", Map::new());
        let b = FunctionCall::new("b", Map::new());
        let exchanges = vec![
            (a.clone(), FunctionResponse::text(&a, "A")),
            (b.clone(), FunctionResponse::text(&b, "B")),
        ];

        let turns = build_with_tool_results(&prior, &exchanges);

        assert_eq!(&turns[..3], &prior[..]);
        let call_names: Vec<_> = turns[3]
            .parts
            .iter()
            .filter_map(Part::as_function_call)
            .map(|c| c.name.as_str())
            .collect();
        let response_names: Vec<_> = turns[4]
            .parts
            .iter()
            .filter_map(Part::as_function_response)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(call_names, vec!["a", "b"]);
        assert_eq!(response_names, vec!["a", "b"]);
    }

    #[test]
    fn test_no_exchanges_returns_prior() {
        let prior = build_initial("hello");
        assert_eq!(build_with_tool_results(&prior, &[]), prior);
    }
}
